use crate::errors::BackendError;
use crate::partition::{Partition, PartitionId, StatsSample};
use async_trait::async_trait;

/// Liveness probe implemented by the specific backend driver (database
/// client, broker client). The health monitor applies its own per-probe
/// timeout; a timed-out probe counts as a failure.
#[async_trait]
pub trait ProbeClient: Send + Sync + 'static {
    async fn probe(&self, partition: &Partition) -> bool;
}

/// Backend-specific load statistics source, polled by the rebalance
/// coordinator. A failed collection excludes the partition from the current
/// cycle rather than aborting it.
#[async_trait]
pub trait StatsCollector: Send + Sync + 'static {
    async fn collect_stats(&self, partition: &Partition) -> Result<StatsSample, BackendError>;
}

/// External directory service consulted by the DIRECTORY strategy on cache
/// misses. This crate defines only the call contract, not the service.
#[async_trait]
pub trait DirectoryService: Send + Sync + 'static {
    async fn lookup(&self, resource_name: &str, key: &str) -> Result<PartitionId, BackendError>;
}
