//! # Keyroute Registry
//!
//! Source of truth for partition metadata and live stats.
//!
//! The registry is the only shared mutable resource in the engine. Writers
//! are the health monitor (status), the rebalance coordinator (stats,
//! MIGRATING) and the cluster scaler (add/remove); readers are the routing
//! engine and the rebalance coordinator. Records live in a sharded
//! concurrent map so routing reads never block on health-check writes, and
//! each record is updated under its own entry lock (single writer per
//! partition at a time).

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use keyroute_core::{
    Partition, PartitionId, PartitionStats, PartitionStatus, RegistryError, StatsSample,
};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Concurrent partition registry.
///
/// Configured order is preserved for listing, so strategy resolvers see a
/// stable target ordering across calls.
#[derive(Debug, Default)]
pub struct PartitionRegistry {
    partitions: DashMap<PartitionId, Partition>,
    /// Insertion order of partition ids; small and rarely written.
    order: RwLock<Vec<PartitionId>>,
}

impl PartitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a partition. Fails on a duplicate id without touching the
    /// existing record.
    pub fn register(&self, partition: Partition) -> Result<(), RegistryError> {
        match self.partitions.entry(partition.id.clone()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateId(partition.id)),
            Entry::Vacant(entry) => {
                let id = partition.id.clone();
                entry.insert(partition);
                self.order
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(id);
                Ok(())
            }
        }
    }

    /// Removes a partition and returns its final record.
    pub fn deregister(&self, id: &str) -> Result<Partition, RegistryError> {
        match self.partitions.remove(id) {
            Some((_, partition)) => {
                self.order
                    .write()
                    .unwrap_or_else(|e| e.into_inner())
                    .retain(|entry| entry != id);
                Ok(partition)
            }
            None => Err(RegistryError::NotFound(id.to_string())),
        }
    }

    /// Cloned snapshot of a single partition record.
    pub fn get(&self, id: &str) -> Option<Partition> {
        self.partitions.get(id).map(|entry| entry.clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.partitions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// All partitions in configured order.
    pub fn list_all(&self) -> Vec<Partition> {
        let order = self.order.read().unwrap_or_else(|e| e.into_inner());
        order
            .iter()
            .filter_map(|id| self.partitions.get(id).map(|entry| entry.clone()))
            .collect()
    }

    /// ACTIVE partitions only, configured order preserved.
    pub fn list_active(&self) -> Vec<Partition> {
        let order = self.order.read().unwrap_or_else(|e| e.into_inner());
        order
            .iter()
            .filter_map(|id| self.partitions.get(id).map(|entry| entry.clone()))
            .filter(Partition::is_active)
            .collect()
    }

    /// Overwrites the mutable stats snapshot. An unknown id is logged and
    /// ignored — a stats update racing a deregistration must never become a
    /// routing-path failure.
    pub fn update_stats(&self, id: &str, sample: StatsSample) {
        match self.partitions.get_mut(id) {
            Some(mut entry) => {
                entry.stats.size_bytes = sample.size_bytes;
                entry.stats.connection_count = sample.connection_count;
            }
            None => {
                warn!(partition = %id, "ignoring stats update for unknown partition");
            }
        }
    }

    /// Records the time of the latest health probe for a partition.
    pub fn touch_health_check(&self, id: &str) {
        if let Some(mut entry) = self.partitions.get_mut(id) {
            entry.stats.last_health_check = Some(unix_now());
        }
    }

    /// Sets a partition's status under its entry lock. Returns `true` when
    /// the call actually transitioned the status.
    pub fn update_status(&self, id: &str, status: PartitionStatus) -> bool {
        match self.partitions.get_mut(id) {
            Some(mut entry) => {
                if entry.status == status {
                    return false;
                }
                debug!(partition = %id, from = ?entry.status, to = ?status, "partition status updated");
                entry.status = status;
                true
            }
            None => {
                warn!(partition = %id, "ignoring status update for unknown partition");
                false
            }
        }
    }

    /// Replaces a partition's hash range; used by the scaler when the hash
    /// space is redivided.
    pub fn set_hash_range(&self, id: &str, range: keyroute_core::HashRange) {
        if let Some(mut entry) = self.partitions.get_mut(id) {
            entry.hash_range = Some(range);
        }
    }

    /// One coherent status snapshot for a set of partition ids.
    ///
    /// The routing hot path takes exactly one of these per call so a
    /// partition cannot be observed ACTIVE during strategy resolution and
    /// OFFLINE during target filtering within the same call.
    pub fn status_view(&self, ids: &[PartitionId]) -> HashMap<PartitionId, PartitionStatus> {
        ids.iter()
            .filter_map(|id| {
                self.partitions
                    .get(id)
                    .map(|entry| (id.clone(), entry.status))
            })
            .collect()
    }

    /// Current stats per partition, keyed by id.
    pub fn stats_snapshot(&self) -> HashMap<PartitionId, PartitionStats> {
        self.partitions
            .iter()
            .map(|entry| (entry.key().clone(), entry.stats.clone()))
            .collect()
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
