//! Fetcher implementations, one per release channel

pub mod chocolatey;
pub mod docker_hub;
pub mod github_releases;
pub mod github_tags;
pub mod snapcraft;

pub use chocolatey::ChocolateyFetcher;
pub use docker_hub::DockerHubFetcher;
pub use github_releases::GitHubReleasesFetcher;
pub use github_tags::GitHubTagsFetcher;
pub use snapcraft::SnapcraftFetcher;

use std::time::Duration;

use tracing::warn;

use crate::config::{HTTP_TIMEOUT_SECS, TOOL_NAME};
use crate::version::error::FetchError;

/// Shared HTTP client configuration for every remote
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(TOOL_NAME)
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
        .unwrap_or_else(|e| {
            warn!("Falling back to default HTTP client: {}", e);
            reqwest::Client::new()
        })
}

/// Map non-success statuses onto `FetchError`
pub(crate) fn check_status(
    response: reqwest::Response,
    what: &str,
) -> Result<reqwest::Response, FetchError> {
    let status = response.status();

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(FetchError::NotFound(what.to_string()));
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        return Err(FetchError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    if !status.is_success() {
        warn!("{} returned status {}: {}", what, status, response.url());
        return Err(FetchError::InvalidResponse(format!(
            "Unexpected status: {}",
            status
        )));
    }

    Ok(response)
}
