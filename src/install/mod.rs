//! Installation and removal of product versions
//!
//! An [`Installer`] knows how to produce one installation shape. The
//! orchestration in [`install`] is shared: verify, create the version
//! directory, perform, record the source, regenerate shims.

pub mod binary;
pub mod error;
pub mod gemfile;

pub use binary::BinaryInstaller;
pub use error::InstallationError;
pub use gemfile::GemfileInstaller;

use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;
use tracing::{info, warn};

use crate::clock::Clock;
use crate::config::{
    BINARY_SOURCE, DEFAULT_SOURCE, INSTALL_SOURCE_FILE, LEGACY_BINARY_SOURCE, Layout, Settings,
};
use crate::platform::Platform;
use crate::shim::{ShimManager, ShimReport};
use crate::version::registries::github_releases;
use crate::version::types::Channel;

/// Base URL release assets are downloaded from when a release lists none
pub const DEFAULT_DOWNLOAD_BASE_URL: &str = "https://github.com";

/// Installation shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallSource {
    /// Bundler install from the archived Gemfile
    Gemfile,
    /// Self-contained single executable
    Binary,
}

impl InstallSource {
    pub const ALL: [InstallSource; 2] = [InstallSource::Gemfile, InstallSource::Binary];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstallSource::Gemfile => DEFAULT_SOURCE,
            InstallSource::Binary => BINARY_SOURCE,
        }
    }

    /// Channel whose recorded versions this source can install
    pub fn channel(&self) -> Channel {
        match self {
            InstallSource::Gemfile => Channel::Gemfile,
            InstallSource::Binary => Channel::Binary,
        }
    }
}

impl Display for InstallSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstallSource {
    type Err = InstallationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            DEFAULT_SOURCE => Ok(InstallSource::Gemfile),
            BINARY_SOURCE | LEGACY_BINARY_SOURCE => Ok(InstallSource::Binary),
            other => Err(InstallationError::UnknownSource(other.to_string())),
        }
    }
}

/// Collaborator producing one installation shape
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait Installer: Send + Sync {
    fn source(&self) -> InstallSource;

    /// Fails with an error naming whatever is missing to install `version`
    async fn verify_prerequisites(&self, version: &str) -> Result<(), InstallationError>;

    /// Populate `target_dir`, which already exists
    async fn perform_installation(
        &self,
        version: &str,
        target_dir: &Path,
    ) -> Result<(), InstallationError>;
}

/// Result of [`uninstall`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallOutcome {
    Removed(ShimReport),
    NotInstalled,
}

/// Installer for `source`, wired to the configured remotes
pub fn installer_for(
    source: InstallSource,
    layout: &Layout,
    settings: &Settings,
    clock: Arc<dyn Clock>,
    platform: Platform,
) -> Box<dyn Installer> {
    match source {
        InstallSource::Gemfile => Box::new(GemfileInstaller::new(
            layout.channel_dir(Channel::Gemfile),
            clock,
        )),
        InstallSource::Binary => {
            let registries = &settings.registries;
            Box::new(BinaryInstaller::new(
                registries
                    .github
                    .base_url
                    .as_deref()
                    .unwrap_or(github_releases::DEFAULT_BASE_URL),
                registries
                    .github_downloads
                    .base_url
                    .as_deref()
                    .unwrap_or(DEFAULT_DOWNLOAD_BASE_URL),
                platform,
            ))
        }
    }
}

/// Install `version` with `installer`, record its source and regenerate shims.
///
/// An existing install is only replaced when `reinstall` is set, and only
/// after the prerequisites of the new one have been verified.
pub async fn install(
    installer: &dyn Installer,
    layout: &Layout,
    version: &str,
    shims: &ShimManager,
    reinstall: bool,
) -> Result<ShimReport, InstallationError> {
    let source = installer.source();
    let target_dir = layout.version_dir(version)?;
    if target_dir.exists() && !reinstall {
        return Err(InstallationError::AlreadyInstalled {
            version: version.to_string(),
        });
    }
    info!("Installing {} from source {}", version, source);

    installer.verify_prerequisites(version).await?;

    if target_dir.exists() {
        info!("Replacing previous install {:?}", target_dir);
        std::fs::remove_dir_all(&target_dir).map_err(|source| InstallationError::Io {
            path: target_dir.clone(),
            source,
        })?;
    }
    std::fs::create_dir_all(&target_dir).map_err(|source| InstallationError::Io {
        path: target_dir.clone(),
        source,
    })?;

    if let Err(e) = installer.perform_installation(version, &target_dir).await {
        if let Err(cleanup) = std::fs::remove_dir_all(&target_dir) {
            warn!(
                "Failed to clean up {:?} after failed install: {}",
                target_dir, cleanup
            );
        }
        return Err(e);
    }

    let source_file = target_dir.join(INSTALL_SOURCE_FILE);
    std::fs::write(&source_file, format!("{source}\n")).map_err(|source| {
        InstallationError::Io {
            path: source_file.clone(),
            source,
        }
    })?;

    let report = shims.regenerate_all()?;
    info!("Installed {} ({})", version, source);
    Ok(report)
}

/// Remove `version` and regenerate shims
pub fn uninstall(
    layout: &Layout,
    version: &str,
    shims: &ShimManager,
) -> Result<UninstallOutcome, InstallationError> {
    let target_dir = layout.version_dir(version)?;
    if !target_dir.is_dir() {
        return Ok(UninstallOutcome::NotInstalled);
    }

    std::fs::remove_dir_all(&target_dir).map_err(|source| InstallationError::Io {
        path: target_dir.clone(),
        source,
    })?;
    info!("Removed {:?}", target_dir);

    Ok(UninstallOutcome::Removed(shims.regenerate_all()?))
}
