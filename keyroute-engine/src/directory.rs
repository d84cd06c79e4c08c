use dashmap::DashMap;
use keyroute_core::PartitionId;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheEntry {
    partition_id: PartitionId,
    cached_at: Instant,
}

/// TTL-bounded cache of `(resource, key) -> partition` directory answers.
///
/// Not authoritative: entries are created on first resolution and expire
/// after the configured interval, at which point the external directory
/// service is consulted again.
#[derive(Debug)]
pub(crate) struct DirectoryCache {
    entries: DashMap<(String, String), CacheEntry>,
    ttl: Duration,
}

impl DirectoryCache {
    pub(crate) fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub(crate) fn get(&self, resource: &str, key: &str) -> Option<PartitionId> {
        let cache_key = (resource.to_string(), key.to_string());
        // The read guard must be dropped before eviction below: the shard
        // lock is not reentrant, so removing while a `get` guard on the same
        // shard is alive deadlocks.
        let hit = self
            .entries
            .get(&cache_key)
            .filter(|entry| entry.cached_at.elapsed() < self.ttl)
            .map(|entry| entry.partition_id.clone());
        if hit.is_none() {
            self.entries
                .remove_if(&cache_key, |_, entry| entry.cached_at.elapsed() >= self.ttl);
        }
        hit
    }

    pub(crate) fn insert(&self, resource: &str, key: &str, partition_id: PartitionId) {
        self.entries.insert(
            (resource.to_string(), key.to_string()),
            CacheEntry {
                partition_id,
                cached_at: Instant::now(),
            },
        );
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
