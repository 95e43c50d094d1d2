//! Archives the Gemfile and lockfile shipped inside each release container image

use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::version::error::FetchError;
use crate::version::materializer::Materializer;
use crate::version::model::GemfileVersion;

/// Container image carrying each release
pub const DEFAULT_IMAGE: &str = "metanorma/metanorma";

/// Separates the Gemfile from the lockfile in the container output
const SENTINEL: &str = "===GEMFILE.EOF===";

/// Directories searched, in order, for the release Gemfile
const SEARCH_DIRS: [&str; 4] = ["/metanorma", "/setup", "/", "/root"];

pub struct GemfileExtractor {
    channel_dir: PathBuf,
    image: String,
    docker: String,
}

impl GemfileExtractor {
    pub fn new(channel_dir: impl Into<PathBuf>) -> Self {
        Self {
            channel_dir: channel_dir.into(),
            image: DEFAULT_IMAGE.to_string(),
            docker: "docker".to_string(),
        }
    }

    fn image_ref(&self, version: &str) -> String {
        format!("{}:{}", self.image, version)
    }

    fn archive_dir(&self, record: &GemfileVersion) -> PathBuf {
        self.channel_dir.join(record.archive_dir())
    }

    async fn docker(&self, version: &str, args: &[&str]) -> Result<String, FetchError> {
        debug!("Running {} {}", self.docker, args.join(" "));
        let output = Command::new(&self.docker)
            .args(args)
            .output()
            .await
            .map_err(|e| FetchError::Materialize {
                version: version.to_string(),
                message: format!("cannot run {}: {e}. Is Docker installed and running?", self.docker),
            })?;

        if !output.status.success() {
            return Err(FetchError::Materialize {
                version: version.to_string(),
                message: format!(
                    "`{} {}` failed: {}",
                    self.docker,
                    args.first().copied().unwrap_or_default(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn extraction_script() -> String {
    let dirs = SEARCH_DIRS.join(" ");
    format!(
        "for d in {dirs}; do \
           if [ -f \"$d/Gemfile\" ]; then \
             cat \"$d/Gemfile\"; echo '{SENTINEL}'; \
             if [ -f \"$d/Gemfile.lock\" ]; then cat \"$d/Gemfile.lock\"; fi; \
             exit 0; \
           fi; \
         done; exit 3"
    )
}

/// Split container output into Gemfile and optional lockfile content
fn split_output(output: &str) -> Option<(String, Option<String>)> {
    let (gemfile, lockfile) = output.split_once(SENTINEL)?;
    let gemfile = gemfile.trim_end();
    if gemfile.trim().is_empty() {
        return None;
    }
    let lockfile = lockfile.trim_start_matches(['\r', '\n']).trim_end();
    Some((
        format!("{gemfile}\n"),
        (!lockfile.is_empty()).then(|| format!("{lockfile}\n")),
    ))
}

fn write_file(version: &str, path: &Path, content: &str) -> Result<(), FetchError> {
    std::fs::write(path, content).map_err(|e| FetchError::Materialize {
        version: version.to_string(),
        message: format!("cannot write {path:?}: {e}"),
    })
}

#[async_trait::async_trait]
impl Materializer<GemfileVersion> for GemfileExtractor {
    fn is_materialized(&self, record: &GemfileVersion) -> bool {
        record.exists_locally(&self.channel_dir)
    }

    async fn materialize(&self, record: GemfileVersion) -> Result<GemfileVersion, FetchError> {
        let version = record.base.version.clone();
        let image = self.image_ref(&version);

        info!("Extracting Gemfile from {}", image);
        self.docker(&version, &["pull", "--quiet", &image]).await?;
        let script = extraction_script();
        let output = self
            .docker(&version, &["run", "--rm", "--entrypoint", "sh", &image, "-c", &script])
            .await;

        if let Err(e) = self.docker(&version, &["rmi", &image]).await {
            warn!("Failed to remove image {}: {}", image, e);
        }

        let (gemfile, lockfile) = split_output(&output?).ok_or_else(|| FetchError::Materialize {
            version: version.clone(),
            message: format!("no Gemfile found in {image} (searched {})", SEARCH_DIRS.join(", ")),
        })?;

        let dir = self.archive_dir(&record);
        std::fs::create_dir_all(&dir).map_err(|e| FetchError::Materialize {
            version: version.clone(),
            message: format!("cannot create {dir:?}: {e}"),
        })?;
        write_file(&version, &dir.join(GemfileVersion::GEMFILE), &gemfile)?;
        if let Some(lockfile) = &lockfile {
            write_file(&version, &dir.join(GemfileVersion::LOCKFILE), lockfile)?;
        }

        Ok(record.with_archive(lockfile.is_some()))
    }

    async fn remove(&self, record: &GemfileVersion) -> Result<(), FetchError> {
        let dir = self.archive_dir(record);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                debug!("Removed archive {:?}", dir);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FetchError::Materialize {
                version: record.base.version.clone(),
                message: format!("cannot remove {dir:?}: {e}"),
            }),
        }
    }
}
