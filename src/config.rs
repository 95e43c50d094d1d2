use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::version::types::Channel;

// =============================================================================
// Naming
// =============================================================================

/// Name of this tool, used in messages and activation hints
pub const TOOL_NAME: &str = "mnenv";

/// Name of the managed product and of its self-contained executable
pub const PRODUCT_NAME: &str = "metanorma";

/// Overrides the root directory
pub const ROOT_ENV: &str = "MNENV_ROOT";

/// Overrides the active version
pub const VERSION_ENV: &str = "MNENV_VERSION";

/// Overrides the active source
pub const SOURCE_ENV: &str = "MNENV_SOURCE";

/// Log filter for the log file (tracing `EnvFilter` syntax)
pub const LOG_ENV: &str = "MNENV_LOG";

/// Directory-scoped version marker
pub const LOCAL_VERSION_FILE: &str = ".metanorma-version";

/// Directory-scoped source marker
pub const LOCAL_SOURCE_FILE: &str = ".metanorma-source";

/// Global version marker under the root
pub const GLOBAL_VERSION_FILE: &str = "version";

/// Global source marker under the root
pub const GLOBAL_SOURCE_FILE: &str = "source";

/// File inside an installed version recording which installer produced it
pub const INSTALL_SOURCE_FILE: &str = "source";

/// Source used when nothing else selects one
pub const DEFAULT_SOURCE: &str = "gemfile";

/// Source of self-contained single-binary installs
pub const BINARY_SOURCE: &str = "binary";

/// Former name of the binary source, still honoured in marker files
pub const LEGACY_BINARY_SOURCE: &str = "tebako";

// =============================================================================
// Time-related constants
// =============================================================================

/// Timeout for a single HTTP request in seconds
pub const HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings file {path:?}: {source}. Fix or delete the file to use defaults")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A version string that cannot name a directory under `versions/`
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Invalid version '{0}'. Versions may only contain letters, digits, '.', '_' and '-' (for example: 1.14.4)"
)]
pub struct InvalidVersionError(pub String);

/// Accepts only a single path component made of `[0-9A-Za-z._-]`, never `.` or `..`
pub fn validate_version(version: &str) -> Result<&str, InvalidVersionError> {
    let valid = !version.is_empty()
        && version != "."
        && version != ".."
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(version)
    } else {
        Err(InvalidVersionError(version.to_string()))
    }
}

/// User settings read from `<root>/settings.json`
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Where per-channel version documents are stored
    pub data_dir: Option<PathBuf>,
    pub registries: RegistriesConfig,
}

/// Base URL overrides for each remote the fetchers and installers talk to
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistriesConfig {
    pub docker_hub: RegistryConfig,
    pub github: RegistryConfig,
    pub github_downloads: RegistryConfig,
    pub snapcraft: RegistryConfig,
    pub chocolatey: RegistryConfig,
}

/// Individual registry configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistryConfig {
    /// Replaces the registry's built-in base URL when set
    pub base_url: Option<String>,
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file is absent
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Filesystem layout of an mnenv root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
    data_dir: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let data_dir = root.join("data");
        Self { root, data_dir }
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Layout for the current user, honouring `MNENV_ROOT`
    pub fn from_env() -> Self {
        Self::new(root_with_env(std::env::var(ROOT_ENV).ok(), dirs::home_dir()))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.root.join("versions")
    }

    /// Install directory of `version`; rejects anything that would escape `versions/`
    pub fn version_dir(&self, version: &str) -> Result<PathBuf, InvalidVersionError> {
        Ok(self.versions_dir().join(validate_version(version)?))
    }

    pub fn shims_dir(&self) -> PathBuf {
        self.root.join("shims")
    }

    pub fn global_version_file(&self) -> PathBuf {
        self.root.join(GLOBAL_VERSION_FILE)
    }

    pub fn global_source_file(&self) -> PathBuf {
        self.root.join(GLOBAL_SOURCE_FILE)
    }

    pub fn channel_dir(&self, channel: Channel) -> PathBuf {
        self.data_dir.join(channel.as_str())
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join("settings.json")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn log_file_name(&self) -> &'static str {
        "mnenv.log"
    }
}

/// Resolve the root directory.
/// Uses $MNENV_ROOT if set and non-empty, otherwise ~/.mnenv,
/// or ./.mnenv if no home directory is available.
fn root_with_env(env_root: Option<String>, home_dir: Option<PathBuf>) -> PathBuf {
    env_root
        .filter(|root| !root.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir.map(|home| home.join(".mnenv")))
        .unwrap_or_else(|| PathBuf::from(".mnenv"))
}
