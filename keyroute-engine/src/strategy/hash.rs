use super::StrategyResolver;
use crate::hash::fnv1a_32;
use crate::metrics::ROUTING_FALLBACKS_TOTAL;
use async_trait::async_trait;
use keyroute_core::{Partition, PartitionId, RouteKey, RoutingRule};
use tracing::warn;

/// Routes by FNV-1a 32-bit hash of the key, matched against the targets'
/// configured hash ranges.
pub(crate) struct HashResolver;

#[async_trait]
impl StrategyResolver for HashResolver {
    async fn resolve(
        &self,
        rule: &RoutingRule,
        key: &RouteKey,
        targets: &[Partition],
    ) -> PartitionId {
        let hash = fnv1a_32(key.canonical().as_bytes());
        for partition in targets {
            if let Some(range) = partition.hash_range {
                if range.contains(hash) {
                    return partition.id.clone();
                }
            }
        }

        // Validation guarantees full coverage at load time, so landing here
        // means the owning partition is currently filtered out (offline) or
        // the topology was mutated underneath us.
        warn!(
            resource = %rule.resource_name,
            hash = hash,
            "hash value outside the active ranges, falling back to first target"
        );
        metrics::counter!(ROUTING_FALLBACKS_TOTAL.name, "reason" => "hash_gap").increment(1);
        targets[0].id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyroute_core::ShardStrategy;

    fn targets() -> Vec<Partition> {
        vec![
            Partition::new("part-0", "127.0.0.1:7400").with_hash_range(0, 0x7fff_ffff),
            Partition::new("part-1", "127.0.0.1:7401").with_hash_range(0x8000_0000, u32::MAX),
        ]
    }

    fn rule() -> RoutingRule {
        RoutingRule::new(
            "users",
            "user_id",
            ShardStrategy::Hash,
            vec!["part-0".into(), "part-1".into()],
        )
    }

    #[tokio::test]
    async fn test_selects_partition_owning_the_hash() {
        let targets = targets();
        let rule = rule();
        let key = RouteKey::from("user-42");
        let expected = if fnv1a_32(b"user-42") <= 0x7fff_ffff {
            "part-0"
        } else {
            "part-1"
        };
        let selected = HashResolver.resolve(&rule, &key, &targets).await;
        assert_eq!(selected, expected);
    }

    #[tokio::test]
    async fn test_deterministic_across_calls() {
        let targets = targets();
        let rule = rule();
        let key = RouteKey::from("order-9000");
        let first = HashResolver.resolve(&rule, &key, &targets).await;
        let second = HashResolver.resolve(&rule, &key, &targets).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_gap_falls_back_to_first_target() {
        // Only the upper half is active; keys hashing low fall back.
        let targets =
            vec![Partition::new("part-1", "127.0.0.1:7401").with_hash_range(0x8000_0000, u32::MAX)];
        let rule = rule();
        let mut key_index = 0;
        let key = loop {
            let candidate = format!("key-{}", key_index);
            if fnv1a_32(candidate.as_bytes()) < 0x8000_0000 {
                break RouteKey::from(candidate.as_str());
            }
            key_index += 1;
        };
        let selected = HashResolver.resolve(&rule, &key, &targets).await;
        assert_eq!(selected, "part-1");
    }
}
