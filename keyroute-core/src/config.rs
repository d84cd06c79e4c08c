use crate::errors::ConfigError;
use crate::partition::{Partition, PartitionId};
use crate::rule::{validate_rule_targets, RoutingRule};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Health monitor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthConfig {
    /// How often to probe every partition (seconds)
    pub probe_interval_seconds: u64,
    /// Per-partition probe timeout (seconds); a timeout counts as a failure
    pub probe_timeout_seconds: u64,
    /// Consecutive failures before a partition is marked offline
    pub failure_threshold: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_interval_seconds: 60,
            probe_timeout_seconds: 5,
            failure_threshold: 3,
        }
    }
}

/// Rebalance coordinator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceConfig {
    /// How often to collect stats and evaluate skew (seconds)
    pub check_interval_seconds: u64,
    /// A partition is imbalanced when its size exceeds mean * skew_factor
    pub skew_factor: f64,
    /// Per-partition stats collection timeout (seconds)
    pub stats_timeout_seconds: u64,
    /// Minimum partitions before rebalancing is considered at all
    pub min_partitions: usize,
}

impl Default for RebalanceConfig {
    fn default() -> Self {
        Self {
            check_interval_seconds: 300,
            skew_factor: 1.5,
            stats_timeout_seconds: 5,
            min_partitions: 2,
        }
    }
}

/// Cluster scaler settings: how new partition endpoints are derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalerConfig {
    pub base_host: String,
    pub base_port: u16,
    /// New partition ids are `{id_prefix}-{index}`
    pub id_prefix: String,
}

impl Default for ScalerConfig {
    fn default() -> Self {
        Self {
            base_host: "127.0.0.1".to_string(),
            base_port: 7400,
            id_prefix: "part".to_string(),
        }
    }
}

/// Directory strategy cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryConfig {
    /// TTL for cached (resource, key) -> partition entries (seconds)
    pub cache_ttl_seconds: u64,
    /// Timeout for external directory lookups (seconds)
    pub lookup_timeout_seconds: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: 300,
            lookup_timeout_seconds: 5,
        }
    }
}

/// Serialized topology: the full set of partitions and routing rules plus
/// the background-service settings, loaded at startup and validated eagerly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Partition every fallback resolves to; must be registered below.
    pub default_partition: PartitionId,
    pub partitions: Vec<Partition>,
    pub rules: Vec<RoutingRule>,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub rebalance: RebalanceConfig,
    #[serde(default)]
    pub scaler: ScalerConfig,
    #[serde(default)]
    pub directory: DirectoryConfig,
}

impl TopologyConfig {
    /// Parses a YAML topology document. The result still has to pass
    /// [`validate`](Self::validate) before an engine is built from it.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Fail-fast invariant check over the whole topology.
    ///
    /// Rejects duplicate partition ids, partitions carrying both range
    /// kinds, duplicate rules, rules over unknown/empty targets, missing or
    /// overlapping or non-covering ranges, and an unregistered default
    /// partition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut by_id: HashMap<&str, &Partition> = HashMap::new();
        for partition in &self.partitions {
            if partition.hash_range.is_some() && partition.key_range.is_some() {
                return Err(ConfigError::ConflictingRanges(partition.id.clone()));
            }
            if by_id.insert(partition.id.as_str(), partition).is_some() {
                return Err(ConfigError::DuplicatePartition(partition.id.clone()));
            }
        }

        if !by_id.contains_key(self.default_partition.as_str()) {
            return Err(ConfigError::UnknownDefaultPartition(
                self.default_partition.clone(),
            ));
        }

        let mut seen_rules: HashSet<&str> = HashSet::new();
        for rule in &self.rules {
            if !seen_rules.insert(rule.resource_name.as_str()) {
                return Err(ConfigError::DuplicateRule(rule.resource_name.clone()));
            }
            validate_rule_targets(rule, |id| by_id.get(id).map(|p| (*p).clone()))?;
        }
        Ok(())
    }
}
