use async_trait::async_trait;

use crate::error::FetchError;
use crate::models::snapshot::Snapshot;

/// Source of full order-book snapshots, polled once per refresh tick
#[async_trait]
pub trait DepthSource: Send + Sync {
    /// Get the name of the source
    fn name(&self) -> &str;

    /// Fetch a full, validated snapshot of `symbol` with up to `limit` levels per side
    async fn fetch_snapshot(&self, symbol: &str, limit: u16) -> Result<Snapshot, FetchError>;

    /// Check if the source is reachable
    async fn is_operational(&self) -> bool;
}
