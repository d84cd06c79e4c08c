use super::StrategyResolver;
use async_trait::async_trait;
use keyroute_core::{Partition, PartitionId, RouteKey, RoutingRule};

/// Coarse range policy retained for parity with audit/log partitioning.
///
/// Timestamp keys spread by calendar month across the targets; string (and
/// integer, via their canonical form) keys bucket into three lexicographic
/// ranges (`< "m"`, `< "s"`, rest), clamped to the available targets. This
/// is a documented legacy policy, not a general range-partitioning
/// algorithm; the configured `key_range` bounds are validated at load time
/// but the placement below is what callers historically depend on.
pub(crate) struct RangeResolver;

#[async_trait]
impl StrategyResolver for RangeResolver {
    async fn resolve(
        &self,
        _rule: &RoutingRule,
        key: &RouteKey,
        targets: &[Partition],
    ) -> PartitionId {
        let index = match key.month0() {
            Some(month0) => month0 as usize % targets.len(),
            None => {
                let canonical = key.canonical();
                let bucket = if canonical.as_str() < "m" {
                    0
                } else if canonical.as_str() < "s" {
                    1
                } else {
                    2
                };
                bucket.min(targets.len() - 1)
            }
        };
        targets[index].id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use keyroute_core::ShardStrategy;

    fn targets(n: usize) -> Vec<Partition> {
        (0..n)
            .map(|i| Partition::new(format!("part-{}", i), format!("127.0.0.1:740{}", i)))
            .collect()
    }

    fn rule() -> RoutingRule {
        RoutingRule::new(
            "audit",
            "entity",
            ShardStrategy::Range,
            vec!["part-0".into(), "part-1".into(), "part-2".into()],
        )
    }

    #[tokio::test]
    async fn test_string_bucket_boundaries() {
        let targets = targets(3);
        let rule = rule();
        assert_eq!(
            RangeResolver
                .resolve(&rule, &RouteKey::from("apple"), &targets)
                .await,
            "part-0"
        );
        assert_eq!(
            RangeResolver
                .resolve(&rule, &RouteKey::from("middle"), &targets)
                .await,
            "part-1"
        );
        assert_eq!(
            RangeResolver
                .resolve(&rule, &RouteKey::from("zebra"), &targets)
                .await,
            "part-2"
        );
    }

    #[tokio::test]
    async fn test_bucket_clamps_to_available_targets() {
        let targets = targets(2);
        let rule = rule();
        assert_eq!(
            RangeResolver
                .resolve(&rule, &RouteKey::from("zebra"), &targets)
                .await,
            "part-1"
        );
    }

    #[tokio::test]
    async fn test_timestamp_spreads_by_month() {
        let targets = targets(3);
        let rule = rule();
        let january = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let april = Utc.with_ymd_and_hms(2024, 4, 10, 0, 0, 0).unwrap();
        let june = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();

        // month0 % 3: Jan -> 0, Apr -> 0, Jun -> 2
        assert_eq!(
            RangeResolver
                .resolve(&rule, &RouteKey::from(january), &targets)
                .await,
            "part-0"
        );
        assert_eq!(
            RangeResolver
                .resolve(&rule, &RouteKey::from(april), &targets)
                .await,
            "part-0"
        );
        assert_eq!(
            RangeResolver
                .resolve(&rule, &RouteKey::from(june), &targets)
                .await,
            "part-2"
        );
    }

    #[tokio::test]
    async fn test_integer_keys_use_string_buckets() {
        let targets = targets(3);
        let rule = rule();
        // "42" < "m" lexicographically
        assert_eq!(
            RangeResolver
                .resolve(&rule, &RouteKey::from(42i64), &targets)
                .await,
            "part-0"
        );
    }
}
