//! Active version and source resolution
//!
//! Each value is resolved independently, fresh on every call, through the
//! same chain:
//!
//! 1. environment override (`MNENV_VERSION` / `MNENV_SOURCE`)
//! 2. nearest marker file walking up from the working directory
//! 3. global marker file under the root
//! 4. built-in default (source only)

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{
    BINARY_SOURCE, DEFAULT_SOURCE, INSTALL_SOURCE_FILE, InvalidVersionError, LEGACY_BINARY_SOURCE,
    LOCAL_SOURCE_FILE, LOCAL_VERSION_FILE, Layout, PRODUCT_NAME, SOURCE_ENV, VERSION_ENV,
};
use crate::platform::Platform;
use crate::resolution::env::Environment;
use crate::resolution::error::{NotInstalledError, ResolutionError, SelectionError};
use crate::version::number::VersionNumber;

/// Where a resolved value came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    Environment,
    LocalFile(PathBuf),
    GlobalFile(PathBuf),
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub value: String,
    pub origin: Origin,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Environment => f.write_str("environment"),
            Origin::LocalFile(path) | Origin::GlobalFile(path) => write!(f, "{}", path.display()),
            Origin::Default => f.write_str("default"),
        }
    }
}

/// An installed version and the source that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    pub version: String,
    pub source: String,
}

/// Whether `source` names the self-contained binary install shape
pub fn is_binary_source(source: &str) -> bool {
    source == BINARY_SOURCE || source == LEGACY_BINARY_SOURCE
}

fn canonical_source(source: &str) -> &str {
    if is_binary_source(source) {
        BINARY_SOURCE
    } else {
        source
    }
}

/// First line of a marker file, trimmed; empty or unreadable markers count as absent
pub fn read_marker(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let value = content.lines().next()?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Walk from `start` up to the filesystem root looking for a non-empty `marker`
pub fn find_marker(start: &Path, marker: &str) -> Option<(PathBuf, String)> {
    start.ancestors().find_map(|dir| {
        let path = dir.join(marker);
        read_marker(&path).map(|value| (path, value))
    })
}

pub struct Resolver {
    layout: Layout,
    env: Arc<dyn Environment>,
    cwd: PathBuf,
}

impl Resolver {
    pub fn new(layout: Layout, env: Arc<dyn Environment>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            layout,
            env,
            cwd: cwd.into(),
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn resolve_version(&self) -> Result<Resolution, ResolutionError> {
        self.lookup(
            VERSION_ENV,
            LOCAL_VERSION_FILE,
            &self.layout.global_version_file(),
        )
        .ok_or(ResolutionError::VersionNotSet)
    }

    /// Never fails: falls back to the default source
    pub fn resolve_source(&self) -> Resolution {
        self.lookup(SOURCE_ENV, LOCAL_SOURCE_FILE, &self.layout.global_source_file())
            .unwrap_or_else(|| Resolution {
                value: DEFAULT_SOURCE.to_string(),
                origin: Origin::Default,
            })
    }

    /// Source used when persisting a selection without an explicit one
    pub fn default_source(&self) -> String {
        read_marker(&self.layout.global_source_file()).unwrap_or_else(|| DEFAULT_SOURCE.to_string())
    }

    fn lookup(&self, env_name: &str, marker: &str, global: &Path) -> Option<Resolution> {
        let resolution = self
            .from_env(env_name)
            .or_else(|| self.from_local(marker))
            .or_else(|| Self::from_global(global));
        if let Some(resolution) = &resolution {
            debug!(
                "Resolved {} = {} ({})",
                marker, resolution.value, resolution.origin
            );
        }
        resolution
    }

    fn from_env(&self, name: &str) -> Option<Resolution> {
        self.env
            .var(name)
            .filter(|value| !value.is_empty())
            .map(|value| Resolution {
                value,
                origin: Origin::Environment,
            })
    }

    fn from_local(&self, marker: &str) -> Option<Resolution> {
        find_marker(&self.cwd, marker).map(|(path, value)| Resolution {
            value,
            origin: Origin::LocalFile(path),
        })
    }

    fn from_global(path: &Path) -> Option<Resolution> {
        read_marker(path).map(|value| Resolution {
            value,
            origin: Origin::GlobalFile(path.to_path_buf()),
        })
    }

    /// Check `version` is installed and, when it records a source, that it matches `source`
    pub fn verify_installed(&self, version: &str, source: &str) -> Result<(), NotInstalledError> {
        let dir = self.layout.version_dir(version)?;
        if !dir.is_dir() {
            return Err(NotInstalledError::NotInstalled {
                version: version.to_string(),
                install_source: source.to_string(),
            });
        }

        match read_marker(&dir.join(INSTALL_SOURCE_FILE)) {
            Some(recorded) if canonical_source(&recorded) != canonical_source(source) => {
                Err(NotInstalledError::SourceMismatch {
                    version: version.to_string(),
                    recorded,
                    requested: source.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Path the shims hand off to for `name` under (`version`, `source`)
    pub fn executable_path(
        &self,
        version: &str,
        source: &str,
        name: &str,
        platform: Platform,
    ) -> Result<PathBuf, InvalidVersionError> {
        let dir = self.layout.version_dir(version)?;
        Ok(if is_binary_source(source) {
            dir.join(platform.product_executable(PRODUCT_NAME))
        } else if platform.is_windows() {
            dir.join("bin").join(format!("{name}.cmd"))
        } else {
            dir.join("bin").join(name)
        })
    }

    /// Installed versions in ascending order with their recorded source
    pub fn installed_versions(&self) -> Vec<InstalledVersion> {
        let entries = match std::fs::read_dir(self.layout.versions_dir()) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to list installed versions: {}", e);
                }
                return Vec::new();
            }
        };

        let mut installed: Vec<InstalledVersion> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| {
                let version = entry.file_name().into_string().ok()?;
                let source = read_marker(&entry.path().join(INSTALL_SOURCE_FILE))
                    .unwrap_or_else(|| "unknown".to_string());
                Some(InstalledVersion { version, source })
            })
            .collect();
        installed.sort_by(|a, b| {
            VersionNumber::parse(&a.version)
                .cmp(&VersionNumber::parse(&b.version))
                .then_with(|| a.version.cmp(&b.version))
        });
        installed
    }

    /// Persist the global default after checking the install
    pub fn set_global(&self, version: &str, source: &str) -> Result<(), SelectionError> {
        self.verify_installed(version, source)?;
        write_marker(&self.layout.global_version_file(), version)?;
        write_marker(&self.layout.global_source_file(), source)
    }

    /// Persist a directory-scoped selection in `dir` after checking the install
    pub fn set_local(&self, dir: &Path, version: &str, source: &str) -> Result<(), SelectionError> {
        self.verify_installed(version, source)?;
        write_marker(&dir.join(LOCAL_VERSION_FILE), version)?;
        write_marker(&dir.join(LOCAL_SOURCE_FILE), source)
    }
}

fn write_marker(path: &Path, value: &str) -> Result<(), SelectionError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| SelectionError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, format!("{value}\n")).map_err(|source| SelectionError::Write {
        path: path.to_path_buf(),
        source,
    })
}
