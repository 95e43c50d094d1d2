//! Materializers turn a fetched record into whatever must exist on disk

use crate::version::error::FetchError;
use crate::version::model::VersionRecord;

#[async_trait::async_trait]
pub trait Materializer<V: VersionRecord>: Send + Sync {
    /// Whether the on-disk artifacts for `record` are present
    fn is_materialized(&self, record: &V) -> bool;

    /// Produce the artifacts and return the record describing them
    async fn materialize(&self, record: V) -> Result<V, FetchError>;

    /// Delete any artifacts previously produced for `record`
    async fn remove(&self, record: &V) -> Result<(), FetchError>;
}

/// For channels whose records are the whole story
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordOnly;

#[async_trait::async_trait]
impl<V: VersionRecord> Materializer<V> for RecordOnly {
    fn is_materialized(&self, _record: &V) -> bool {
        true
    }

    async fn materialize(&self, record: V) -> Result<V, FetchError> {
        Ok(record)
    }

    async fn remove(&self, _record: &V) -> Result<(), FetchError> {
        Ok(())
    }
}
