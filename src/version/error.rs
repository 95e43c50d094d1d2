use std::path::PathBuf;

use thiserror::Error;

use crate::version::types::Channel;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Failed to access version store {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Corrupt version store {path:?}: {source}. Delete the file and run `mnenv <channel> revamp` to rebuild it"
    )]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Rate limited: retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to materialize {version}: {message}")]
    Materialize { version: String, message: String },
}

#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Failed to fetch {channel} versions: {source}. Check your network connection and retry")]
    Fetch {
        channel: Channel,
        #[source]
        source: FetchError,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(
        "{channel} version {version} is not listed upstream anymore; historical entries cannot be refreshed. Run `mnenv {channel} list` to see recorded versions"
    )]
    NotFoundRemotely { channel: Channel, version: String },

    #[error("{}", describe_batch(.channel, .failures))]
    Batch {
        channel: Channel,
        failures: Vec<(String, FetchError)>,
    },
}

fn describe_batch(channel: &Channel, failures: &[(String, FetchError)]) -> String {
    let mut message = format!(
        "{} {} version(s) failed to refresh:",
        failures.len(),
        channel
    );
    for (identity, error) in failures {
        message.push_str(&format!("\n  - {identity}: {error}"));
    }
    message.push_str(&format!(
        "\nRetry a single version with `mnenv {channel} update <version>`"
    ));
    message
}
