//! Refresh strategies that reconcile a repository with its remote channel
//!
//! - incremental: record every remote identity not yet present locally
//! - replace-one: drop and re-record a single version
//! - revamp: re-record everything the remote lists, keeping entries it no
//!   longer returns (the snap API only serves current heads)
//!
//! Bulk strategies keep going when a single identity fails and report all
//! failures together once the pass is complete.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::version::error::{FetchError, RefreshError};
use crate::version::fetcher::Fetcher;
use crate::version::materializer::Materializer;
use crate::version::model::VersionRecord;
use crate::version::repository::Repository;
use crate::version::types::Channel;

/// Outcome of a refresh run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    pub channel: Channel,
    /// Identities written during the run
    pub recorded: Vec<String>,
    /// Remote identities left alone because they were already present
    pub skipped: usize,
}

impl RefreshReport {
    fn new(channel: Channel) -> Self {
        Self {
            channel,
            recorded: Vec::new(),
            skipped: 0,
        }
    }
}

/// Overlay freshly fetched heads onto the existing entries.
///
/// Keys present in `current` take the fetched record; every other existing
/// entry is kept unchanged and in place.
pub fn merge_current_heads<V: VersionRecord>(
    existing: IndexMap<V::Key, V>,
    current: impl IntoIterator<Item = V>,
) -> IndexMap<V::Key, V> {
    let mut merged = existing;
    for record in current {
        merged.insert(record.key(), record);
    }
    merged
}

pub struct RefreshPipeline<F, M> {
    fetcher: F,
    materializer: M,
    clock: Arc<dyn Clock>,
}

impl<F, M> RefreshPipeline<F, M>
where
    F: Fetcher,
    M: Materializer<F::Record>,
{
    pub fn new(fetcher: F, materializer: M, clock: Arc<dyn Clock>) -> Self {
        Self {
            fetcher,
            materializer,
            clock,
        }
    }

    fn channel(&self) -> Channel {
        self.fetcher.channel()
    }

    /// Record every remote identity that is missing locally or whose
    /// artifacts are gone. Existing, materialized entries are not touched.
    pub async fn incremental(
        &self,
        repository: &mut Repository<F::Record>,
    ) -> Result<RefreshReport, RefreshError> {
        let remote = self.fetch().await?;
        let mut report = RefreshReport::new(self.channel());
        let mut failures = Vec::new();
        let mut fresh = Vec::new();

        for record in remote {
            let key = record.key();
            let present = repository
                .get(&key)
                .is_some_and(|existing| self.materializer.is_materialized(existing));
            if present {
                report.skipped += 1;
                continue;
            }

            match self.materialize(record).await {
                Ok(record) => {
                    report.recorded.push(key.to_string());
                    fresh.push(record);
                }
                Err(e) => failures.push((key.to_string(), e)),
            }
        }

        if !fresh.is_empty() {
            repository.save_all(fresh)?;
        }
        self.finish(report, failures)
    }

    /// Drop and re-record `version`. For composite-key channels every current
    /// entry sharing the version is re-recorded. Fails on the first error.
    pub async fn replace_one(
        &self,
        repository: &mut Repository<F::Record>,
        version: &str,
    ) -> Result<RefreshReport, RefreshError> {
        let channel = self.channel();
        let targets: Vec<_> = self
            .fetch()
            .await?
            .into_iter()
            .filter(|record| record.version() == version)
            .collect();

        if targets.is_empty() {
            warn!("{} version {} is not listed upstream", channel, version);
            return Err(RefreshError::NotFoundRemotely {
                channel,
                version: version.to_string(),
            });
        }

        let mut report = RefreshReport::new(channel);
        for record in targets {
            let key = record.key();
            if let Some(existing) = repository.get(&key).cloned() {
                self.materializer
                    .remove(&existing)
                    .await
                    .map_err(|source| RefreshError::Fetch { channel, source })?;
            }

            let record = self
                .materialize(record)
                .await
                .map_err(|source| RefreshError::Fetch { channel, source })?;
            repository.save(record)?;
            report.recorded.push(key.to_string());
        }

        info!("Replaced {} {} entries for {}", report.recorded.len(), channel, version);
        Ok(report)
    }

    /// Re-record every identity the remote lists, merged over the existing
    /// entries so that nothing the remote stopped returning is lost.
    pub async fn revamp(
        &self,
        repository: &mut Repository<F::Record>,
    ) -> Result<RefreshReport, RefreshError> {
        let remote = self.fetch().await?;
        let mut report = RefreshReport::new(self.channel());
        let mut failures = Vec::new();
        let mut fresh = Vec::new();

        for record in remote {
            let key = record.key();
            match self.materialize(record).await {
                Ok(record) => {
                    report.recorded.push(key.to_string());
                    fresh.push(record);
                }
                Err(e) => failures.push((key.to_string(), e)),
            }
        }

        let kept = repository.count();
        let merged = merge_current_heads(repository.entries(), fresh);
        debug!(
            "Revamp of {}: {} existing, {} after merge",
            self.channel(),
            kept,
            merged.len()
        );
        repository.replace_all(merged)?;
        self.finish(report, failures)
    }

    async fn fetch(&self) -> Result<Vec<F::Record>, RefreshError> {
        let channel = self.channel();
        let records = self
            .fetcher
            .fetch_all()
            .await
            .inspect_err(|e| error!("Failed to fetch {} versions: {}", channel, e))
            .map_err(|source| RefreshError::Fetch { channel, source })?;
        info!("Fetched {} {} versions", records.len(), channel);
        Ok(records)
    }

    async fn materialize(&self, record: F::Record) -> Result<F::Record, FetchError> {
        let key = record.key();
        self.materializer
            .materialize(record)
            .await
            .map(|record| record.with_parsed_at(self.clock.now()))
            .inspect_err(|e| error!("Failed to record {} {}: {}", self.channel(), key, e))
    }

    fn finish(
        &self,
        report: RefreshReport,
        failures: Vec<(String, FetchError)>,
    ) -> Result<RefreshReport, RefreshError> {
        info!(
            "Refreshed {}: {} recorded, {} skipped, {} failed",
            report.channel,
            report.recorded.len(),
            report.skipped,
            failures.len()
        );
        if failures.is_empty() {
            Ok(report)
        } else {
            Err(RefreshError::Batch {
                channel: report.channel,
                failures,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::model::SnapVersion;

    fn snap(version: &str, revision: u64, arch: &str, channel: &str) -> SnapVersion {
        SnapVersion::new(version, Some(revision), arch, channel)
    }

    #[test]
    fn merge_current_heads_replaces_returned_keys_and_keeps_the_rest() {
        let old_stable = snap("1.0.0", 10, "amd64", "stable");
        let old_edge = snap("1.1.0", 12, "amd64", "edge");
        let existing: IndexMap<_, _> = [old_stable.clone(), old_edge.clone()]
            .into_iter()
            .map(|r| (r.key(), r))
            .collect();

        let mut refreshed_edge = old_edge.clone();
        refreshed_edge.base.published_at = Some(chrono::Utc::now());
        let new_head = snap("1.2.0", 13, "amd64", "stable");

        let merged = merge_current_heads(existing, vec![refreshed_edge.clone(), new_head.clone()]);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get(&old_stable.key()), Some(&old_stable));
        assert_eq!(merged.get(&old_edge.key()), Some(&refreshed_edge));
        assert_eq!(merged.get(&new_head.key()), Some(&new_head));
    }

    #[test]
    fn merge_current_heads_with_no_heads_is_identity() {
        let record = snap("1.0.0", 1, "arm64", "beta");
        let existing: IndexMap<_, _> = [(record.key(), record.clone())].into_iter().collect();

        let merged = merge_current_heads(existing.clone(), Vec::<SnapVersion>::new());

        assert_eq!(merged, existing);
    }
}
