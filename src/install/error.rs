use std::path::PathBuf;

use thiserror::Error;

use crate::config::InvalidVersionError;
use crate::install::InstallSource;
use crate::shim::ShimError;
use crate::version::error::{FetchError, RepositoryError};

/// Versions listed in "available" hints before the rest are summarised
const AVAILABLE_HINT_LIMIT: usize = 10;

#[derive(Debug, Error)]
pub enum InstallationError {
    #[error("{}", describe_not_found(.install_source, .version, .available))]
    VersionNotFound {
        install_source: InstallSource,
        version: String,
        available: Vec<String>,
    },

    #[error(
        "Development tools required for a Gemfile installation are missing: {}. Install Ruby and Bundler, or use the self-contained build: mnenv install {version} --source binary",
        .missing.join(", ")
    )]
    DevelopmentToolsMissing { missing: Vec<String>, version: String },

    #[error(
        "Archived {file} for {version} is missing. Run `mnenv gemfile update {version}` to extract it again"
    )]
    ArchiveMissing { version: String, file: String },

    #[error("Failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed: {message}. Check the output above and retry")]
    Command { command: String, message: String },

    #[error("Failed to download {url}: {source}. Check your network connection and retry")]
    Download {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("Failed to list available releases: {0}. Check your network connection and retry")]
    Listing(#[source] FetchError),

    #[error("No prebuilt metanorma binary for {0}. Use --source gemfile instead")]
    UnsupportedPlatform(String),

    #[error(
        "Version {version} is already installed. Reinstall with: mnenv install {version} --force"
    )]
    AlreadyInstalled { version: String },

    #[error(transparent)]
    InvalidVersion(#[from] InvalidVersionError),

    #[error("Unknown source '{0}'. Available sources: gemfile, binary")]
    UnknownSource(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("Installed, but shims could not be regenerated: {0}")]
    Shims(#[from] ShimError),
}

fn describe_not_found(install_source: &InstallSource, version: &str, available: &[String]) -> String {
    let listed = if available.is_empty() {
        "none".to_string()
    } else if available.len() > AVAILABLE_HINT_LIMIT {
        let tail = &available[available.len() - AVAILABLE_HINT_LIMIT..];
        format!(
            "{} (and {} older)",
            tail.join(", "),
            available.len() - AVAILABLE_HINT_LIMIT
        )
    } else {
        available.join(", ")
    };

    let hint = match install_source {
        InstallSource::Gemfile => {
            "Run `mnenv gemfile refresh` to update the list, or use --source binary".to_string()
        }
        InstallSource::Binary => format!("Or use: mnenv install {version} --source gemfile"),
    };

    format!("Version {version} not found for source {install_source}. Available: {listed}. {hint}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_not_found_lists_latest_versions_only() {
        let available: Vec<String> = (0..15).map(|i| format!("1.{i}.0")).collect();
        let err = InstallationError::VersionNotFound {
            install_source: InstallSource::Binary,
            version: "9.9.9".to_string(),
            available,
        };

        let message = err.to_string();

        assert!(message.starts_with("Version 9.9.9 not found for source binary. Available: 1.5.0,"));
        assert!(message.contains("1.14.0 (and 5 older)"));
        assert!(!message.contains("1.4.0,"));
        assert!(message.ends_with("Or use: mnenv install 9.9.9 --source gemfile"));
    }

    #[test]
    fn development_tools_missing_suggests_binary_source() {
        let err = InstallationError::DevelopmentToolsMissing {
            missing: vec!["ruby".to_string(), "bundle".to_string()],
            version: "1.14.4".to_string(),
        };

        let message = err.to_string();

        assert!(message.contains("missing: ruby, bundle."));
        assert!(message.ends_with("mnenv install 1.14.4 --source binary"));
    }
}
