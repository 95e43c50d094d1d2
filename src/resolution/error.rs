use std::path::PathBuf;

use thiserror::Error;

use crate::config::InvalidVersionError;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error(
        "No version set. Set one with `mnenv global <version>` or `mnenv local <version>`, or export MNENV_VERSION"
    )]
    VersionNotSet,
}

#[derive(Debug, Error)]
pub enum NotInstalledError {
    #[error("Version {version} is not installed. Run: mnenv install {version} --source {install_source}")]
    NotInstalled {
        version: String,
        install_source: String,
    },

    #[error(
        "Version {version} is installed with source {recorded}, not {requested}. Use --source {recorded}, or reinstall with: mnenv install {version} --source {requested} --force"
    )]
    SourceMismatch {
        version: String,
        recorded: String,
        requested: String,
    },

    #[error(transparent)]
    InvalidVersion(#[from] InvalidVersionError),
}

/// Failure to persist a version or source selection
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error(transparent)]
    NotInstalled(#[from] NotInstalledError),

    #[error("Failed to write {path:?}: {source}. Check the directory is writable")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
