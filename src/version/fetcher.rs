//! Fetcher trait for listing the releases a remote channel currently serves

use crate::version::error::FetchError;
use crate::version::model::VersionRecord;
use crate::version::types::Channel;

/// Trait for fetching the release listing of one channel
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    type Record: VersionRecord;

    /// Returns the channel this implementation lists
    fn channel(&self) -> Channel {
        <Self::Record as VersionRecord>::CHANNEL
    }

    /// Fetches every release the remote currently lists
    ///
    /// # Returns
    /// * `Ok(Vec<Record>)` - Records in ascending version order
    /// * `Err(FetchError)` - If the listing cannot be retrieved
    async fn fetch_all(&self) -> Result<Vec<Self::Record>, FetchError>;
}
