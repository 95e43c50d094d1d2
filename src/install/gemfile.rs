//! Bundler-based installs from the archived release Gemfile

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::process::Command;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::install::{InstallSource, InstallationError, Installer};
use crate::version::model::{GemfileVersion, VersionRecord};
use crate::version::repository::Repository;

/// Tools that must be on PATH for `bundle install`
const REQUIRED_TOOLS: [&str; 2] = ["ruby", "bundle"];

pub struct GemfileInstaller {
    channel_dir: PathBuf,
    clock: Arc<dyn Clock>,
    required_tools: Vec<String>,
}

impl GemfileInstaller {
    pub fn new(channel_dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            channel_dir: channel_dir.into(),
            clock,
            required_tools: REQUIRED_TOOLS.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Replace the tools looked up on PATH
    pub fn with_required_tools(mut self, tools: &[&str]) -> Self {
        self.required_tools = tools.iter().map(|t| t.to_string()).collect();
        self
    }

    fn record(&self, version: &str) -> Result<GemfileVersion, InstallationError> {
        let repository = Repository::<GemfileVersion>::open(&self.channel_dir, self.clock.clone())?;
        repository
            .find(version)
            .cloned()
            .ok_or_else(|| InstallationError::VersionNotFound {
                install_source: InstallSource::Gemfile,
                version: version.to_string(),
                available: repository
                    .all()
                    .iter()
                    .map(|v| v.display_name())
                    .collect(),
            })
    }

    /// Archived file for `version`, which must exist on disk
    fn archived(
        &self,
        version: &str,
        relative: Option<&str>,
        file: &str,
    ) -> Result<PathBuf, InstallationError> {
        relative
            .map(|path| self.channel_dir.join(path))
            .filter(|path| path.is_file())
            .ok_or_else(|| InstallationError::ArchiveMissing {
                version: version.to_string(),
                file: file.to_string(),
            })
    }
}

fn copy(from: &Path, to: &Path) -> Result<(), InstallationError> {
    debug!("Copying {:?} to {:?}", from, to);
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|source| InstallationError::Io {
            path: to.to_path_buf(),
            source,
        })
}

#[async_trait::async_trait]
impl Installer for GemfileInstaller {
    fn source(&self) -> InstallSource {
        InstallSource::Gemfile
    }

    async fn verify_prerequisites(&self, version: &str) -> Result<(), InstallationError> {
        self.record(version)?;

        let missing: Vec<String> = self
            .required_tools
            .iter()
            .filter(|tool| which::which(tool.as_str()).is_err())
            .cloned()
            .collect();

        if !missing.is_empty() {
            return Err(InstallationError::DevelopmentToolsMissing {
                missing,
                version: version.to_string(),
            });
        }
        Ok(())
    }

    async fn perform_installation(
        &self,
        version: &str,
        target_dir: &Path,
    ) -> Result<(), InstallationError> {
        let record = self.record(version)?;
        let gemfile = self.archived(
            version,
            record.gemfile_path.as_deref(),
            GemfileVersion::GEMFILE,
        )?;
        let lockfile = self.archived(
            version,
            record.gemfile_lock_path.as_deref(),
            GemfileVersion::LOCKFILE,
        )?;

        copy(&gemfile, &target_dir.join("Gemfile"))?;
        copy(&lockfile, &target_dir.join("Gemfile.lock"))?;

        info!("Running bundle install in {:?}", target_dir);
        let status = Command::new("bundle")
            .arg("install")
            .current_dir(target_dir)
            .env("BUNDLE_GEMFILE", target_dir.join("Gemfile"))
            .env("BUNDLE_PATH", ".bundle")
            .env("BUNDLE_BIN", "bin")
            .status()
            .await
            .map_err(|e| InstallationError::Command {
                command: "bundle install".to_string(),
                message: e.to_string(),
            })?;

        if !status.success() {
            return Err(InstallationError::Command {
                command: "bundle install".to_string(),
                message: status.to_string(),
            });
        }
        Ok(())
    }
}
