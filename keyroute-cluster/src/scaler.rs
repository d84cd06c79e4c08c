//! Elastic partition lifecycle: provisioning, draining, removal.
//!
//! Scale-up registers new partitions OFFLINE so the health monitor's first
//! successful probe activates them before any traffic arrives. Scale-down
//! marks partitions MIGRATING so routing stops immediately while the caller
//! drains data, then `complete_drain` removes them. After either change the
//! scaler redivides the u32 hash space evenly across the targets of every
//! auto-rebalance HASH rule.

use keyroute_core::{
    HashRange, Partition, PartitionId, PartitionStatus, RegistryError, ScalerConfig, ShardStrategy,
};
use keyroute_engine::RoutingRuleSet;
use keyroute_registry::PartitionRegistry;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug)]
pub struct ClusterScaler {
    registry: Arc<PartitionRegistry>,
    rules: Arc<RoutingRuleSet>,
    config: ScalerConfig,
    next_index: AtomicU32,
}

impl ClusterScaler {
    pub fn new(
        registry: Arc<PartitionRegistry>,
        rules: Arc<RoutingRuleSet>,
        config: ScalerConfig,
    ) -> Self {
        let next_index = AtomicU32::new(registry.len() as u32);
        Self {
            registry,
            rules,
            config,
            next_index,
        }
    }

    /// Provisions `count` new partitions and returns their ids.
    ///
    /// New partitions start OFFLINE, join every auto-rebalance HASH rule,
    /// and receive a slice of the evenly redivided hash space.
    pub fn scale_up(&self, count: usize) -> Result<Vec<PartitionId>, RegistryError> {
        let mut added = Vec::with_capacity(count);
        for _ in 0..count {
            let (id, index) = self.allocate_id();
            let endpoint = format!(
                "{}:{}",
                self.config.base_host,
                u32::from(self.config.base_port) + index
            );
            let partition =
                Partition::new(id.clone(), endpoint).with_status(PartitionStatus::Offline);
            self.registry.register(partition)?;
            self.rules.append_hash_target(&id);
            info!(partition = %id, "provisioned partition, awaiting first successful probe");
            added.push(id);
        }
        self.redivide_hash_rules();
        Ok(added)
    }

    /// Picks `count` ACTIVE partitions to retire, lowest weight first and
    /// fewest connections as the tie-break, and marks them MIGRATING.
    ///
    /// Routing stops considering them immediately; data still lives there
    /// until the caller drains it and calls
    /// [`complete_drain`](Self::complete_drain).
    pub fn scale_down(&self, count: usize) -> Vec<PartitionId> {
        let mut active = self.registry.list_active();
        active.sort_by(|a, b| {
            a.weight
                .partial_cmp(&b.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.stats.connection_count.cmp(&b.stats.connection_count))
        });

        let draining: Vec<PartitionId> = active.into_iter().take(count).map(|p| p.id).collect();
        for id in &draining {
            self.registry.update_status(id, PartitionStatus::Migrating);
            info!(partition = %id, "partition draining for scale-down");
        }
        draining
    }

    /// Removes drained partitions from the registry and every rule, then
    /// redivides the hash space across the survivors.
    pub fn complete_drain(&self, ids: &[PartitionId]) -> Result<(), RegistryError> {
        for id in ids {
            self.registry.deregister(id)?;
            self.rules.remove_target(id);
            info!(partition = %id, "drained partition removed");
        }
        self.redivide_hash_rules();
        Ok(())
    }

    /// Next free `{prefix}-{index}` id. Skips indices already taken by
    /// configured partitions that happen to share the prefix.
    fn allocate_id(&self) -> (PartitionId, u32) {
        loop {
            let index = self.next_index.fetch_add(1, Ordering::SeqCst);
            let id = format!("{}-{}", self.config.id_prefix, index);
            if !self.registry.contains(&id) {
                return (id, index);
            }
        }
    }

    /// Evenly redivides the u32 hash space across each auto-rebalance HASH
    /// rule's targets, in target-list order.
    fn redivide_hash_rules(&self) {
        const SPACE: u64 = 1 << 32;
        for rule in self.rules.rules_for_strategy(ShardStrategy::Hash) {
            if !rule.auto_rebalance {
                continue;
            }
            let targets = &rule.target_partitions;
            let count = targets.len() as u64;
            if count == 0 {
                continue;
            }
            for (i, id) in targets.iter().enumerate() {
                let i = i as u64;
                let start = (i * SPACE / count) as u32;
                let end = if i == count - 1 {
                    u32::MAX
                } else {
                    ((i + 1) * SPACE / count - 1) as u32
                };
                self.registry.set_hash_range(id, HashRange::new(start, end));
            }
            debug!(
                resource = %rule.resource_name,
                targets = targets.len(),
                "hash space redivided"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyroute_core::RoutingRule;

    /// Two half-space hash partitions under one auto-rebalance rule.
    fn scaler_fixture() -> (Arc<PartitionRegistry>, Arc<RoutingRuleSet>, ClusterScaler) {
        let registry = Arc::new(PartitionRegistry::new());
        registry
            .register(
                Partition::new("part-0", "127.0.0.1:7400").with_hash_range(0, u32::MAX / 2),
            )
            .unwrap();
        registry
            .register(
                Partition::new("part-1", "127.0.0.1:7401")
                    .with_hash_range(u32::MAX / 2 + 1, u32::MAX),
            )
            .unwrap();
        let rules = Arc::new(RoutingRuleSet::new());
        rules
            .add_rule(
                RoutingRule::new(
                    "events",
                    "event_id",
                    ShardStrategy::Hash,
                    vec!["part-0".to_string(), "part-1".to_string()],
                ),
                &registry,
            )
            .unwrap();
        let scaler = ClusterScaler::new(registry.clone(), rules.clone(), ScalerConfig::default());
        (registry, rules, scaler)
    }

    fn assert_contiguous_coverage(registry: &PartitionRegistry, targets: &[PartitionId]) {
        let ranges: Vec<HashRange> = targets
            .iter()
            .map(|id| registry.get(id).unwrap().hash_range.unwrap())
            .collect();
        assert_eq!(ranges[0].start, 0);
        assert_eq!(ranges[ranges.len() - 1].end, u32::MAX);
        for pair in ranges.windows(2) {
            assert_eq!(pair[0].end + 1, pair[1].start);
        }
    }

    #[test]
    fn test_scale_up_provisions_offline_and_redivides() {
        let (registry, rules, scaler) = scaler_fixture();

        let added = scaler.scale_up(1).unwrap();
        assert_eq!(added, vec!["part-2".to_string()]);

        let partition = registry.get("part-2").unwrap();
        assert_eq!(partition.status, PartitionStatus::Offline);
        assert_eq!(partition.endpoint, "127.0.0.1:7402");

        let targets = rules.resolve_rule("events").unwrap().target_partitions;
        assert_eq!(targets.len(), 3);
        assert_contiguous_coverage(&registry, &targets);
    }

    #[test]
    fn test_scale_up_skips_taken_ids() {
        let (registry, _, scaler) = scaler_fixture();
        registry
            .register(Partition::new("part-2", "127.0.0.1:9000"))
            .unwrap();

        let added = scaler.scale_up(1).unwrap();
        assert_eq!(added, vec!["part-3".to_string()]);
    }

    #[test]
    fn test_scale_down_prefers_lowest_weight_then_connections() {
        let (registry, _, scaler) = scaler_fixture();
        registry
            .register(Partition::new("part-2", "127.0.0.1:7402").with_weight(0.5))
            .unwrap();
        registry.update_stats(
            "part-0",
            keyroute_core::StatsSample {
                size_bytes: 0,
                connection_count: 3,
            },
        );

        // part-2 has the lowest weight; part-1 breaks the weight tie with
        // fewer connections than part-0.
        let draining = scaler.scale_down(2);
        assert_eq!(draining, vec!["part-2".to_string(), "part-1".to_string()]);
        for id in &draining {
            assert_eq!(
                registry.get(id).unwrap().status,
                PartitionStatus::Migrating
            );
        }
        assert_eq!(
            registry.get("part-0").unwrap().status,
            PartitionStatus::Active
        );
    }

    #[test]
    fn test_complete_drain_removes_and_redivides() {
        let (registry, rules, scaler) = scaler_fixture();
        let draining = scaler.scale_down(1);
        assert_eq!(draining.len(), 1);

        scaler.complete_drain(&draining).unwrap();
        assert!(registry.get(&draining[0]).is_none());

        let targets = rules.resolve_rule("events").unwrap().target_partitions;
        assert_eq!(targets.len(), 1);
        assert_contiguous_coverage(&registry, &targets);
    }

    #[test]
    fn test_complete_drain_unknown_partition_fails() {
        let (_, _, scaler) = scaler_fixture();
        assert!(scaler.complete_drain(&["ghost".to_string()]).is_err());
    }

    #[test]
    fn test_manual_rules_are_not_redivided() {
        let (registry, rules, scaler) = scaler_fixture();
        let mut manual = RoutingRule::new(
            "ledger",
            "account_id",
            ShardStrategy::Hash,
            vec!["part-0".to_string(), "part-1".to_string()],
        );
        manual.auto_rebalance = false;
        rules.add_rule(manual, &registry).unwrap();

        scaler.scale_up(1).unwrap();

        let manual_targets = rules.resolve_rule("ledger").unwrap().target_partitions;
        assert_eq!(
            manual_targets,
            vec!["part-0".to_string(), "part-1".to_string()]
        );
    }
}
