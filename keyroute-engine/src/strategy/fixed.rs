use super::StrategyResolver;
use crate::metrics::PINNED_KEY_VIOLATIONS_TOTAL;
use async_trait::async_trait;
use keyroute_core::{Partition, PartitionId, RouteKey, RoutingRule};
use tracing::warn;

/// Pins every key to the first target partition.
///
/// Used for strongly-consistent data that must not be sharded. When the
/// rule declares a `pinned_key` sentinel, mismatching keys are logged as
/// policy violations but still routed: the rule has exactly one meaningful
/// destination, so refusing the write would only trade a routable request
/// for an outage.
pub(crate) struct FixedResolver;

#[async_trait]
impl StrategyResolver for FixedResolver {
    async fn resolve(
        &self,
        rule: &RoutingRule,
        key: &RouteKey,
        targets: &[Partition],
    ) -> PartitionId {
        if let Some(pinned) = &rule.pinned_key {
            let canonical = key.canonical();
            if canonical != *pinned {
                warn!(
                    resource = %rule.resource_name,
                    expected = %pinned,
                    got = %canonical,
                    "pinned-key policy violation, routing to fixed partition anyway"
                );
                metrics::counter!(PINNED_KEY_VIOLATIONS_TOTAL.name).increment(1);
            }
        }
        targets[0].id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyroute_core::ShardStrategy;

    fn targets() -> Vec<Partition> {
        vec![
            Partition::new("part-0", "127.0.0.1:7400"),
            Partition::new("part-1", "127.0.0.1:7401"),
        ]
    }

    #[tokio::test]
    async fn test_always_first_target() {
        let rule = RoutingRule::new(
            "settings",
            "tenant",
            ShardStrategy::Fixed,
            vec!["part-0".into(), "part-1".into()],
        );
        let targets = targets();
        for key in ["a", "b", "zzz"] {
            let selected = FixedResolver
                .resolve(&rule, &RouteKey::from(key), &targets)
                .await;
            assert_eq!(selected, "part-0");
        }
    }

    #[tokio::test]
    async fn test_pinned_key_mismatch_still_routes() {
        let rule = RoutingRule::new(
            "settings",
            "tenant",
            ShardStrategy::Fixed,
            vec!["part-0".into()],
        )
        .with_pinned_key("global");
        let targets = vec![Partition::new("part-0", "127.0.0.1:7400")];

        let selected = FixedResolver
            .resolve(&rule, &RouteKey::from("tenant-7"), &targets)
            .await;
        assert_eq!(selected, "part-0");
    }
}
