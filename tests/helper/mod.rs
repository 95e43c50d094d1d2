//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use mnenv::clock::{Clock, FixedClock};
use mnenv::config::{INSTALL_SOURCE_FILE, Layout};
use mnenv::version::error::FetchError;
use mnenv::version::fetcher::Fetcher;
use mnenv::version::materializer::Materializer;
use mnenv::version::model::VersionRecord;

pub fn clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 3, 1, 9, 30, 0).unwrap()))
}

/// Fetcher serving a fixed listing, or an error when built with `failing`
pub struct StaticFetcher<V> {
    records: Vec<V>,
    fail: bool,
}

impl<V: VersionRecord> StaticFetcher<V> {
    pub fn new(records: Vec<V>) -> Self {
        Self {
            records,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            records: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl<V: VersionRecord> Fetcher for StaticFetcher<V> {
    type Record = V;

    async fn fetch_all(&self) -> Result<Vec<V>, FetchError> {
        if self.fail {
            return Err(FetchError::InvalidResponse("listing unavailable".to_string()));
        }
        Ok(self.records.clone())
    }
}

/// Materializer failing for a chosen set of versions
#[derive(Default)]
pub struct SelectiveMaterializer {
    failing: HashSet<String>,
}

impl SelectiveMaterializer {
    pub fn failing_on(versions: &[&str]) -> Self {
        Self {
            failing: versions.iter().map(|v| v.to_string()).collect(),
        }
    }
}

#[async_trait]
impl<V: VersionRecord> Materializer<V> for SelectiveMaterializer {
    fn is_materialized(&self, _record: &V) -> bool {
        true
    }

    async fn materialize(&self, record: V) -> Result<V, FetchError> {
        if self.failing.contains(record.version()) {
            return Err(FetchError::Materialize {
                version: record.version().to_string(),
                message: "image pull failed".to_string(),
            });
        }
        Ok(record)
    }

    async fn remove(&self, _record: &V) -> Result<(), FetchError> {
        Ok(())
    }
}

/// Lay out an installed version with its source marker and the given `bin/` entries
pub fn install_version(layout: &Layout, version: &str, source: &str, bin: &[&str]) {
    let dir = layout.version_dir(version).unwrap();
    std::fs::create_dir_all(dir.join("bin")).unwrap();
    std::fs::write(dir.join(INSTALL_SOURCE_FILE), format!("{source}\n")).unwrap();
    for name in bin {
        write_executable(&dir.join("bin").join(name));
    }
}

pub fn write_executable(path: &Path) {
    std::fs::write(path, "#!/bin/sh\n").unwrap();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }
}
