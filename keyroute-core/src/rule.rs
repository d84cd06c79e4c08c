use crate::errors::ConfigError;
use crate::partition::{HashRange, KeyRange, Partition, PartitionId};
use serde::{Deserialize, Serialize};

/// Partitioning strategy bound to a routing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardStrategy {
    /// FNV-1a 32-bit hash of the key, matched against partition hash ranges
    Hash,
    /// Coarse month / lexicographic-bucket policy over the ordered targets
    Range,
    /// External directory lookup with a TTL-bounded cache
    Directory,
    /// Pin everything to the first target partition
    Fixed,
}

/// The policy binding a logical resource (table or subject) to a strategy
/// and an ordered set of target partitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRule {
    /// Unique resource name; also matched as a prefix against longer names.
    pub resource_name: String,
    /// Field/column the caller extracts the shard key from. Informational
    /// for the engine itself — the caller passes the extracted key.
    pub shard_key_field: String,
    pub strategy: ShardStrategy,
    /// Ordered, non-empty list of eligible partition ids.
    pub target_partitions: Vec<PartitionId>,
    /// Downstream replication fan-out; does not affect routing selection.
    #[serde(default = "default_replication_factor")]
    pub replication_factor: u32,
    /// Optional sentinel for FIXED rules: keys that do not match are logged
    /// as policy violations but still routed (fail-open).
    #[serde(default)]
    pub pinned_key: Option<String>,
    /// Whether the scaler may redivide this rule's hash space on scale
    /// up/down. Only meaningful for HASH rules.
    #[serde(default = "default_true")]
    pub auto_rebalance: bool,
}

fn default_replication_factor() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl RoutingRule {
    pub fn new(
        resource_name: impl Into<String>,
        shard_key_field: impl Into<String>,
        strategy: ShardStrategy,
        target_partitions: Vec<PartitionId>,
    ) -> Self {
        Self {
            resource_name: resource_name.into(),
            shard_key_field: shard_key_field.into(),
            strategy,
            target_partitions,
            replication_factor: default_replication_factor(),
            pinned_key: None,
            auto_rebalance: default_true(),
        }
    }

    pub fn with_pinned_key(mut self, key: impl Into<String>) -> Self {
        self.pinned_key = Some(key.into());
        self
    }

    pub fn with_replication_factor(mut self, factor: u32) -> Self {
        self.replication_factor = factor;
        self
    }
}

/// Validates a rule against the partitions it targets.
///
/// Checks that the target list is non-empty, every target resolves through
/// `lookup`, and — for HASH/RANGE strategies — that the targets' ranges are
/// present, non-overlapping and jointly cover the full space.
pub fn validate_rule_targets<F>(rule: &RoutingRule, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<Partition>,
{
    if rule.target_partitions.is_empty() {
        return Err(ConfigError::EmptyTargets(rule.resource_name.clone()));
    }
    if rule.replication_factor < 1 {
        return Err(ConfigError::InvalidReplicationFactor(
            rule.resource_name.clone(),
        ));
    }

    let mut targets = Vec::with_capacity(rule.target_partitions.len());
    for id in &rule.target_partitions {
        match lookup(id) {
            Some(partition) => targets.push(partition),
            None => {
                return Err(ConfigError::UnknownPartition {
                    rule: rule.resource_name.clone(),
                    partition: id.clone(),
                })
            }
        }
    }

    match rule.strategy {
        ShardStrategy::Hash => validate_hash_ranges(rule, &targets),
        ShardStrategy::Range => validate_key_ranges(rule, &targets),
        ShardStrategy::Directory | ShardStrategy::Fixed => Ok(()),
    }
}

fn validate_hash_ranges(rule: &RoutingRule, targets: &[Partition]) -> Result<(), ConfigError> {
    let mut ranges: Vec<(&PartitionId, HashRange)> = Vec::with_capacity(targets.len());
    for partition in targets {
        match partition.hash_range {
            Some(range) => ranges.push((&partition.id, range)),
            None => {
                return Err(ConfigError::MissingRange {
                    rule: rule.resource_name.clone(),
                    partition: partition.id.clone(),
                    expected: "hash_range",
                })
            }
        }
    }
    ranges.sort_by_key(|(_, range)| range.start);

    for pair in ranges.windows(2) {
        let (prev_id, prev) = &pair[0];
        let (next_id, next) = &pair[1];
        if next.start <= prev.end {
            return Err(ConfigError::OverlappingRanges {
                rule: rule.resource_name.clone(),
                first: (*prev_id).clone(),
                second: (*next_id).clone(),
            });
        }
        if next.start != prev.end + 1 {
            return Err(ConfigError::IncompleteCoverage {
                rule: rule.resource_name.clone(),
                space: "32-bit hash space",
            });
        }
    }

    let covered = ranges
        .first()
        .map_or(false, |(_, first)| first.start == 0)
        && ranges.last().map_or(false, |(_, last)| last.end == u32::MAX);
    if !covered {
        return Err(ConfigError::IncompleteCoverage {
            rule: rule.resource_name.clone(),
            space: "32-bit hash space",
        });
    }
    Ok(())
}

fn validate_key_ranges(rule: &RoutingRule, targets: &[Partition]) -> Result<(), ConfigError> {
    let mut ranges: Vec<(&PartitionId, &KeyRange)> = Vec::with_capacity(targets.len());
    for partition in targets {
        match &partition.key_range {
            Some(range) => ranges.push((&partition.id, range)),
            None => {
                return Err(ConfigError::MissingRange {
                    rule: rule.resource_name.clone(),
                    partition: partition.id.clone(),
                    expected: "key_range",
                })
            }
        }
    }
    ranges.sort_by(|(_, a), (_, b)| a.start.cmp(&b.start));

    for pair in ranges.windows(2) {
        let (prev_id, prev) = &pair[0];
        let (next_id, next) = &pair[1];
        // An unbounded range anywhere but the end overlaps its successor.
        let overlaps = match &prev.end {
            None => true,
            Some(end) => next.start < *end,
        };
        if overlaps {
            return Err(ConfigError::OverlappingRanges {
                rule: rule.resource_name.clone(),
                first: (*prev_id).clone(),
                second: (*next_id).clone(),
            });
        }
        if prev.end.as_deref() != Some(next.start.as_str()) {
            return Err(ConfigError::IncompleteCoverage {
                rule: rule.resource_name.clone(),
                space: "lexicographic key space",
            });
        }
    }

    let covered = ranges
        .first()
        .map_or(false, |(_, first)| first.start.is_empty())
        && ranges.last().map_or(false, |(_, last)| last.end.is_none());
    if !covered {
        return Err(ConfigError::IncompleteCoverage {
            rule: rule.resource_name.clone(),
            space: "lexicographic key space",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash_partitions() -> Vec<Partition> {
        vec![
            Partition::new("part-0", "127.0.0.1:7400").with_hash_range(0, 0x7fff_ffff),
            Partition::new("part-1", "127.0.0.1:7401").with_hash_range(0x8000_0000, u32::MAX),
        ]
    }

    fn lookup_in(partitions: &[Partition]) -> impl Fn(&str) -> Option<Partition> + '_ {
        move |id| partitions.iter().find(|p| p.id == id).cloned()
    }

    #[test]
    fn test_valid_hash_rule() {
        let partitions = hash_partitions();
        let rule = RoutingRule::new(
            "users",
            "user_id",
            ShardStrategy::Hash,
            vec!["part-0".into(), "part-1".into()],
        );
        assert!(validate_rule_targets(&rule, lookup_in(&partitions)).is_ok());
    }

    #[test]
    fn test_empty_targets_rejected() {
        let partitions = hash_partitions();
        let rule = RoutingRule::new("users", "user_id", ShardStrategy::Hash, vec![]);
        assert!(matches!(
            validate_rule_targets(&rule, lookup_in(&partitions)),
            Err(ConfigError::EmptyTargets(_))
        ));
    }

    #[test]
    fn test_unknown_target_rejected() {
        let partitions = hash_partitions();
        let rule = RoutingRule::new(
            "users",
            "user_id",
            ShardStrategy::Fixed,
            vec!["part-9".into()],
        );
        assert!(matches!(
            validate_rule_targets(&rule, lookup_in(&partitions)),
            Err(ConfigError::UnknownPartition { .. })
        ));
    }

    #[test]
    fn test_overlapping_hash_ranges_rejected() {
        let partitions = vec![
            Partition::new("part-0", "127.0.0.1:7400").with_hash_range(0, 0x8000_0000),
            Partition::new("part-1", "127.0.0.1:7401").with_hash_range(0x8000_0000, u32::MAX),
        ];
        let rule = RoutingRule::new(
            "users",
            "user_id",
            ShardStrategy::Hash,
            vec!["part-0".into(), "part-1".into()],
        );
        assert!(matches!(
            validate_rule_targets(&rule, lookup_in(&partitions)),
            Err(ConfigError::OverlappingRanges { .. })
        ));
    }

    #[test]
    fn test_hash_coverage_gap_rejected() {
        let partitions = vec![
            Partition::new("part-0", "127.0.0.1:7400").with_hash_range(0, 100),
            Partition::new("part-1", "127.0.0.1:7401").with_hash_range(200, u32::MAX),
        ];
        let rule = RoutingRule::new(
            "users",
            "user_id",
            ShardStrategy::Hash,
            vec!["part-0".into(), "part-1".into()],
        );
        assert!(matches!(
            validate_rule_targets(&rule, lookup_in(&partitions)),
            Err(ConfigError::IncompleteCoverage { .. })
        ));
    }

    #[test]
    fn test_missing_hash_range_rejected() {
        let partitions = vec![Partition::new("part-0", "127.0.0.1:7400")];
        let rule = RoutingRule::new("users", "user_id", ShardStrategy::Hash, vec!["part-0".into()]);
        assert!(matches!(
            validate_rule_targets(&rule, lookup_in(&partitions)),
            Err(ConfigError::MissingRange { .. })
        ));
    }

    #[test]
    fn test_valid_key_range_rule() {
        let partitions = vec![
            Partition::new("part-a", "127.0.0.1:7400").with_key_range("", Some("m".to_string())),
            Partition::new("part-m", "127.0.0.1:7401").with_key_range("m", Some("s".to_string())),
            Partition::new("part-s", "127.0.0.1:7402").with_key_range("s", None),
        ];
        let rule = RoutingRule::new(
            "audit",
            "entity",
            ShardStrategy::Range,
            vec!["part-a".into(), "part-m".into(), "part-s".into()],
        );
        assert!(validate_rule_targets(&rule, lookup_in(&partitions)).is_ok());
    }

    #[test]
    fn test_key_range_without_unbounded_tail_rejected() {
        let partitions = vec![
            Partition::new("part-a", "127.0.0.1:7400").with_key_range("", Some("m".to_string())),
            Partition::new("part-m", "127.0.0.1:7401").with_key_range("m", Some("s".to_string())),
        ];
        let rule = RoutingRule::new(
            "audit",
            "entity",
            ShardStrategy::Range,
            vec!["part-a".into(), "part-m".into()],
        );
        assert!(matches!(
            validate_rule_targets(&rule, lookup_in(&partitions)),
            Err(ConfigError::IncompleteCoverage { .. })
        ));
    }
}
