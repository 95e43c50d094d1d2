//! Shim generation and garbage collection
//!
//! Shims are regenerated as a whole: every executable name found across the
//! installed versions gets one shim per shell dialect of the platform, then
//! any other file in the shim directory is deleted.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{INSTALL_SOURCE_FILE, Layout, PRODUCT_NAME};
use crate::platform::Platform;
use crate::resolution::resolver::{is_binary_source, read_marker};
use crate::shell::{Shell, platform_shells};

/// Extension of the launchers Windows shims hand off to, `bin\<name>.cmd`
const WINDOWS_LAUNCHER_EXTENSION: &str = "cmd";

#[derive(Debug, Error)]
pub enum ShimError {
    #[error("Failed to write shim {path:?}: {source}. Check permissions, then run `mnenv rehash`")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Files written and deleted by one regeneration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShimReport {
    pub written: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
}

pub struct ShimManager {
    layout: Layout,
    platform: Platform,
    shells: Vec<Box<dyn Shell>>,
}

impl ShimManager {
    pub fn new(layout: Layout, platform: Platform) -> Self {
        let shells = platform_shells(platform, layout.root());
        Self {
            layout,
            platform,
            shells,
        }
    }

    pub fn shims_dir(&self) -> PathBuf {
        self.layout.shims_dir()
    }

    /// Executable names provided by any installed version
    pub fn discover_executables(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();

        let Ok(entries) = std::fs::read_dir(self.layout.versions_dir()) else {
            return names;
        };

        for version_dir in entries.filter_map(Result::ok).map(|e| e.path()) {
            if !version_dir.is_dir() {
                continue;
            }

            if read_marker(&version_dir.join(INSTALL_SOURCE_FILE))
                .is_some_and(|source| is_binary_source(&source))
            {
                names.insert(PRODUCT_NAME.to_string());
            }

            names.extend(self.bin_executables(&version_dir.join("bin")));
        }

        names.retain(|name| {
            let valid = is_valid_name(name);
            if !valid {
                warn!("Skipping executable with unsupported name: {:?}", name);
            }
            valid
        });
        names
    }

    fn bin_executables(&self, bin_dir: &Path) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(bin_dir) else {
            return Vec::new();
        };

        entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| {
                let path = entry.path();
                if self.platform.is_windows() {
                    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
                    if extension != WINDOWS_LAUNCHER_EXTENSION {
                        return None;
                    }
                    path.file_stem()?.to_str().map(str::to_string)
                } else {
                    if !is_executable(&path) {
                        return None;
                    }
                    path.file_name()?.to_str().map(str::to_string)
                }
            })
            .collect()
    }

    /// Rewrite every shim and delete the ones no installed version provides
    pub fn regenerate_all(&self) -> Result<ShimReport, ShimError> {
        let shims_dir = self.shims_dir();
        std::fs::create_dir_all(&shims_dir).map_err(|source| ShimError::Write {
            path: shims_dir.clone(),
            source,
        })?;

        let names = self.discover_executables();
        let mut report = ShimReport::default();
        let mut expected = BTreeSet::new();

        for name in &names {
            for shell in &self.shells {
                let file_name = shell.shim_file_name(name);
                let path = shims_dir.join(&file_name);
                write_shim(&path, &shell.shim_body(name), !shell.is_windows_family())?;
                expected.insert(file_name);
                report.written.push(path);
            }
        }

        report.removed = collect_garbage(&shims_dir, &expected);

        info!(
            "Regenerated {} shims for {} executables ({} removed)",
            report.written.len(),
            names.len(),
            report.removed.len()
        );
        Ok(report)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '+' | '-'))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn write_shim(path: &Path, body: &str, executable: bool) -> Result<(), ShimError> {
    let to_error = |source| ShimError::Write {
        path: path.to_path_buf(),
        source,
    };
    std::fs::write(path, body).map_err(to_error)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if executable {
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
                .map_err(to_error)?;
        }
    }
    #[cfg(not(unix))]
    let _ = executable;

    Ok(())
}

/// Best-effort: files that cannot be deleted are left in place
fn collect_garbage(shims_dir: &Path, expected: &BTreeSet<String>) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(shims_dir) else {
        return Vec::new();
    };

    let mut removed = Vec::new();
    for entry in entries.filter_map(Result::ok) {
        let keep = entry
            .file_name()
            .to_str()
            .is_some_and(|name| expected.contains(name));
        if keep {
            continue;
        }

        let path = entry.path();
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed stale shim {:?}", path);
                removed.push(path);
            }
            Err(e) => debug!("Could not remove stale shim {:?}: {}", path, e),
        }
    }
    removed.sort();
    removed
}
