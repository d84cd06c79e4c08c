use serde::{Deserialize, Serialize};

/// Opaque partition identifier, unique across the registry.
pub type PartitionId = String;

/// Lifecycle status of a partition.
///
/// ACTIVE and OFFLINE are owned by the health monitor; READONLY and
/// MIGRATING are externally-set states that the health monitor never
/// overwrites until explicitly cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionStatus {
    Active,
    ReadOnly,
    Migrating,
    Offline,
}

impl Default for PartitionStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// A contiguous, inclusive sub-interval of the 32-bit hash space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashRange {
    pub start: u32,
    pub end: u32,
}

impl HashRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, value: u32) -> bool {
        value >= self.start && value <= self.end
    }
}

/// Lexicographic key bounds: `start` inclusive, `end` exclusive.
/// `end = None` means unbounded (covers everything from `start` up).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyRange {
    pub start: String,
    pub end: Option<String>,
}

impl KeyRange {
    pub fn new(start: impl Into<String>, end: Option<String>) -> Self {
        Self {
            start: start.into(),
            end,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        key >= self.start.as_str()
            && self.end.as_deref().map_or(true, |end| key < end)
    }
}

/// Mutable per-partition statistics snapshot.
///
/// Refreshed by the health monitor and the rebalance coordinator; read by
/// the routing engine and the scaler. Timestamps are Unix seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartitionStats {
    pub size_bytes: u64,
    pub connection_count: u32,
    pub last_health_check: Option<u64>,
}

/// A single stats sample returned by a [`StatsCollector`] probe.
///
/// [`StatsCollector`]: crate::StatsCollector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSample {
    pub size_bytes: u64,
    pub connection_count: u32,
}

/// One backend unit (database instance or broker node) holding a subset of
/// the data.
///
/// The `endpoint` is owned exclusively by this record. A partition carries
/// at most one of `hash_range` / `key_range`; which one depends on the
/// strategy of the rules that target it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partition {
    pub id: PartitionId,
    /// host:port or backend-specific connection string
    pub endpoint: String,
    /// Relative capacity, used for proportional load expectations.
    #[serde(default = "default_weight")]
    pub weight: f64,
    #[serde(default)]
    pub hash_range: Option<HashRange>,
    #[serde(default)]
    pub key_range: Option<KeyRange>,
    #[serde(default)]
    pub status: PartitionStatus,
    #[serde(default)]
    pub stats: PartitionStats,
}

fn default_weight() -> f64 {
    1.0
}

impl Partition {
    pub fn new(id: impl Into<PartitionId>, endpoint: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            endpoint: endpoint.into(),
            weight: default_weight(),
            hash_range: None,
            key_range: None,
            status: PartitionStatus::Active,
            stats: PartitionStats::default(),
        }
    }

    pub fn with_hash_range(mut self, start: u32, end: u32) -> Self {
        self.hash_range = Some(HashRange::new(start, end));
        self
    }

    pub fn with_key_range(mut self, start: impl Into<String>, end: Option<String>) -> Self {
        self.key_range = Some(KeyRange::new(start, end));
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_status(mut self, status: PartitionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == PartitionStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_range_contains_is_inclusive() {
        let range = HashRange::new(100, 200);
        assert!(range.contains(100));
        assert!(range.contains(200));
        assert!(!range.contains(99));
        assert!(!range.contains(201));
    }

    #[test]
    fn test_key_range_bounds() {
        let bounded = KeyRange::new("m", Some("s".to_string()));
        assert!(bounded.contains("m"));
        assert!(bounded.contains("middle"));
        assert!(!bounded.contains("s"));
        assert!(!bounded.contains("apple"));

        let unbounded = KeyRange::new("s", None);
        assert!(unbounded.contains("zebra"));
        assert!(!unbounded.contains("middle"));
    }

    #[test]
    fn test_partition_defaults() {
        let partition = Partition::new("part-0", "127.0.0.1:7400");
        assert_eq!(partition.weight, 1.0);
        assert_eq!(partition.status, PartitionStatus::Active);
        assert!(partition.hash_range.is_none());
        assert!(partition.key_range.is_none());
        assert_eq!(partition.stats, PartitionStats::default());
    }
}
