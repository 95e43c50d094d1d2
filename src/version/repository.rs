//! Per-channel version store persisted as a JSON document
//!
//! The whole store is loaded on open, kept in memory, and rewritten on every
//! mutation. Writes are plain whole-file rewrites: concurrent invocations
//! against the same root are not coordinated.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::version::error::RepositoryError;
use crate::version::model::{SnapVersion, VersionRecord};
use crate::version::timestamp;

/// File name of the persisted document inside a channel directory
pub const FILE_NAME: &str = "versions.json";

/// Derived header of a persisted document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, with = "timestamp::option")]
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub latest_version: Option<String>,
}

#[derive(Serialize)]
struct DocumentRef<'a, V> {
    metadata: Metadata,
    versions: Vec<&'a V>,
}

#[derive(Deserialize)]
#[serde(bound(deserialize = "V: VersionRecord"))]
struct Document<V> {
    #[serde(default)]
    #[allow(dead_code)]
    metadata: Metadata,
    #[serde(default = "Vec::new")]
    versions: Vec<V>,
}

pub struct Repository<V: VersionRecord> {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    entries: IndexMap<V::Key, V>,
}

impl<V: VersionRecord> Repository<V> {
    /// Open the store in `dir`, loading `versions.json` when present
    pub fn open(dir: &Path, clock: Arc<dyn Clock>) -> Result<Self, RepositoryError> {
        let path = dir.join(FILE_NAME);
        let mut entries = IndexMap::new();

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let document: Document<V> =
                    serde_json::from_str(&content).map_err(|source| RepositoryError::Parse {
                        path: path.clone(),
                        source,
                    })?;
                for record in document.versions {
                    entries.insert(record.key(), record);
                }
                debug!(
                    "Loaded {} {} versions from {:?}",
                    entries.len(),
                    V::CHANNEL,
                    path
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No {} version store at {:?} yet", V::CHANNEL, path);
            }
            Err(source) => return Err(RepositoryError::Io { path, source }),
        }

        Ok(Self {
            path,
            clock,
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// First entry recorded for `version`
    pub fn find(&self, version: &str) -> Option<&V> {
        self.entries.values().find(|record| record.version() == version)
    }

    pub fn get(&self, key: &V::Key) -> Option<&V> {
        self.entries.get(key)
    }

    /// All entries in ascending version order
    pub fn all(&self) -> Vec<&V> {
        let mut records: Vec<&V> = self.entries.values().collect();
        // Stable sort keeps insertion order among equal versions
        records.sort_by_cached_key(|record| record.number());
        records
    }

    pub fn latest(&self) -> Option<&V> {
        self.all().pop()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn exists(&self, version: &str) -> bool {
        self.find(version).is_some()
    }

    pub fn contains_key(&self, key: &V::Key) -> bool {
        self.entries.contains_key(key)
    }

    /// Snapshot of every entry in insertion order
    pub fn entries(&self) -> IndexMap<V::Key, V> {
        self.entries.clone()
    }

    /// Upsert one entry and persist
    pub fn save(&mut self, record: V) -> Result<(), RepositoryError> {
        self.entries.insert(record.key(), record);
        self.persist()
    }

    /// Upsert every entry and persist once
    pub fn save_all(&mut self, records: impl IntoIterator<Item = V>) -> Result<(), RepositoryError> {
        for record in records {
            self.entries.insert(record.key(), record);
        }
        self.persist()
    }

    /// Replace the whole store with `entries` and persist
    pub fn replace_all(&mut self, entries: IndexMap<V::Key, V>) -> Result<(), RepositoryError> {
        self.entries = entries;
        self.persist()
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            generated_at: Some(timestamp::truncate(self.clock.now())),
            source: V::CHANNEL.as_str().to_string(),
            count: self.entries.len(),
            latest_version: self.latest().map(|record| record.version().to_string()),
        }
    }

    fn persist(&self) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| RepositoryError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let document = DocumentRef {
            metadata: self.metadata(),
            versions: self.all(),
        };
        let mut content =
            serde_json::to_string_pretty(&document).map_err(|source| RepositoryError::Parse {
                path: self.path.clone(),
                source,
            })?;
        content.push('\n');

        std::fs::write(&self.path, content).map_err(|source| RepositoryError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!(
            "Saved {} {} versions to {:?}",
            self.entries.len(),
            V::CHANNEL,
            self.path
        );
        Ok(())
    }
}

impl Repository<SnapVersion> {
    pub fn find_exact(
        &self,
        version: &str,
        revision: Option<u64>,
        arch: &str,
        channel: &str,
    ) -> Option<&SnapVersion> {
        self.entries.values().find(|record| {
            record.version() == version
                && record.revision == revision
                && record.arch == arch
                && record.channel == channel
        })
    }

    /// Every entry for `version` across revisions, architectures and channels
    pub fn find_all_by_version(&self, version: &str) -> Vec<&SnapVersion> {
        self.all()
            .into_iter()
            .filter(|record| record.version() == version)
            .collect()
    }
}
