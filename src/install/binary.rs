//! Self-contained single-binary installs from the packed releases

use std::path::Path;

use tracing::{debug, info};

use crate::config::PRODUCT_NAME;
use crate::install::{InstallSource, InstallationError, Installer};
use crate::platform::Platform;
use crate::version::error::FetchError;
use crate::version::fetcher::Fetcher;
use crate::version::model::BinaryVersion;
use crate::version::registries::github_releases::RELEASE_REPOSITORY;
use crate::version::registries::{GitHubReleasesFetcher, check_status, http_client};

pub struct BinaryInstaller {
    releases: GitHubReleasesFetcher,
    download_base_url: String,
    platform: Platform,
    client: reqwest::Client,
}

impl BinaryInstaller {
    pub fn new(api_base_url: &str, download_base_url: &str, platform: Platform) -> Self {
        Self {
            releases: GitHubReleasesFetcher::new(api_base_url),
            download_base_url: download_base_url.trim_end_matches('/').to_string(),
            platform,
            client: http_client(),
        }
    }

    async fn release(&self, version: &str) -> Result<BinaryVersion, InstallationError> {
        let releases = self
            .releases
            .fetch_all()
            .await
            .map_err(InstallationError::Listing)?;

        let available = releases
            .iter()
            .map(|r| r.tag_name().unwrap_or(&r.base.version).to_string())
            .collect();
        releases
            .into_iter()
            .find(|r| r.base.version == version)
            .ok_or_else(|| InstallationError::VersionNotFound {
                install_source: InstallSource::Binary,
                version: version.to_string(),
                available,
            })
    }

    /// Download URL of the asset for this platform
    fn download_url(&self, release: &BinaryVersion) -> Result<String, InstallationError> {
        if let Some(asset) = release.asset_for(self.platform) {
            return Ok(asset.browser_download_url);
        }

        let asset = BinaryVersion::asset_name(self.platform)
            .ok_or_else(|| InstallationError::UnsupportedPlatform(format!("{:?}", self.platform)))?;
        let tag = release
            .tag_name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("v{}", release.base.version));
        Ok(format!(
            "{}/{}/releases/download/{}/{}",
            self.download_base_url, RELEASE_REPOSITORY, tag, asset
        ))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;
        let response = check_status(response, url)?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait::async_trait]
impl Installer for BinaryInstaller {
    fn source(&self) -> InstallSource {
        InstallSource::Binary
    }

    async fn verify_prerequisites(&self, version: &str) -> Result<(), InstallationError> {
        if self.platform.asset_suffix().is_none() {
            return Err(InstallationError::UnsupportedPlatform(format!(
                "{:?}",
                self.platform
            )));
        }
        self.release(version).await.map(|_| ())
    }

    async fn perform_installation(
        &self,
        version: &str,
        target_dir: &Path,
    ) -> Result<(), InstallationError> {
        let release = self.release(version).await?;
        let url = self.download_url(&release)?;

        info!("Downloading {}", url);
        let bytes = self
            .download(&url)
            .await
            .map_err(|source| InstallationError::Download {
                url: url.clone(),
                source,
            })?;
        debug!("Downloaded {} bytes", bytes.len());

        let path = target_dir.join(self.platform.product_executable(PRODUCT_NAME));
        let to_error = |source| InstallationError::Io {
            path: path.clone(),
            source,
        };
        tokio::fs::write(&path, &bytes).await.map_err(to_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .await
                .map_err(to_error)?;
        }

        Ok(())
    }
}
