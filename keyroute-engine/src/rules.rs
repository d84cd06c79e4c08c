use keyroute_core::{validate_rule_targets, ConfigError, PartitionId, RoutingRule, ShardStrategy};
use keyroute_registry::PartitionRegistry;
use std::sync::RwLock;
use tracing::debug;

/// Ordered set of routing rules with prefix-aware resolution.
///
/// Rules are registered at startup and only touched afterwards by the
/// cluster scaler (appending/removing targets when partitions join or
/// leave), so the interior lock is effectively read-only on the hot path.
#[derive(Debug, Default)]
pub struct RoutingRuleSet {
    rules: RwLock<Vec<RoutingRule>>,
}

impl RoutingRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and registers a rule: targets must exist in `registry`
    /// and, for HASH/RANGE strategies, carry non-overlapping covering
    /// ranges.
    pub fn add_rule(
        &self,
        rule: RoutingRule,
        registry: &PartitionRegistry,
    ) -> Result<(), ConfigError> {
        let mut rules = self.rules.write().unwrap_or_else(|e| e.into_inner());
        if rules
            .iter()
            .any(|existing| existing.resource_name == rule.resource_name)
        {
            return Err(ConfigError::DuplicateRule(rule.resource_name));
        }
        validate_rule_targets(&rule, |id| registry.get(id))?;
        debug!(resource = %rule.resource_name, strategy = ?rule.strategy, "routing rule registered");
        rules.push(rule);
        Ok(())
    }

    /// Looks up the rule for a resource name.
    ///
    /// An exact match is simply the longest possible prefix, so resolution
    /// picks the most specific registered prefix of `resource_name`; ties
    /// go to the first-registered rule.
    pub fn resolve_rule(&self, resource_name: &str) -> Option<RoutingRule> {
        let rules = self.rules.read().unwrap_or_else(|e| e.into_inner());
        let mut best: Option<&RoutingRule> = None;
        for rule in rules.iter() {
            if resource_name.starts_with(&rule.resource_name) {
                let more_specific = best
                    .map_or(true, |current| {
                        rule.resource_name.len() > current.resource_name.len()
                    });
                if more_specific {
                    best = Some(rule);
                }
            }
        }
        best.cloned()
    }

    pub fn list(&self) -> Vec<RoutingRule> {
        self.rules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Rules using the given strategy, in registration order.
    pub fn rules_for_strategy(&self, strategy: ShardStrategy) -> Vec<RoutingRule> {
        self.rules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|rule| rule.strategy == strategy)
            .cloned()
            .collect()
    }

    /// Rules that include the given partition among their targets.
    pub fn rules_targeting(&self, partition_id: &str) -> Vec<RoutingRule> {
        self.rules
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|rule| rule.target_partitions.iter().any(|id| id == partition_id))
            .cloned()
            .collect()
    }

    /// Appends a partition to the target list of every auto-rebalance HASH
    /// rule. Used by the scaler before redividing the hash space.
    pub fn append_hash_target(&self, partition_id: &PartitionId) {
        let mut rules = self.rules.write().unwrap_or_else(|e| e.into_inner());
        for rule in rules.iter_mut() {
            if rule.strategy == ShardStrategy::Hash
                && rule.auto_rebalance
                && !rule.target_partitions.contains(partition_id)
            {
                rule.target_partitions.push(partition_id.clone());
            }
        }
    }

    /// Drops a partition from every rule's target list. Used by the scaler
    /// after a drained partition is deregistered.
    pub fn remove_target(&self, partition_id: &str) {
        let mut rules = self.rules.write().unwrap_or_else(|e| e.into_inner());
        for rule in rules.iter_mut() {
            rule.target_partitions.retain(|id| id != partition_id);
        }
    }
}
