//! Strategy resolvers: one concrete type per partitioning strategy behind a
//! common contract, selected from the rule's strategy tag at engine
//! construction. Resolvers are pure over their inputs; only the directory
//! resolver may await (bounded external lookup on cache miss).

mod directory;
mod fixed;
mod hash;
mod range;

pub(crate) use directory::DirectoryResolver;
pub(crate) use fixed::FixedResolver;
pub(crate) use hash::HashResolver;
pub(crate) use range::RangeResolver;

use async_trait::async_trait;
use keyroute_core::{Partition, PartitionId, RouteKey, RoutingRule, ShardStrategy};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolution contract shared by all strategies.
///
/// `targets` is the ACTIVE subset of the rule's target partitions in rule
/// order; the engine guarantees it is non-empty. Resolvers must not touch
/// shared mutable state beyond their own caches.
#[async_trait]
pub(crate) trait StrategyResolver: Send + Sync {
    async fn resolve(
        &self,
        rule: &RoutingRule,
        key: &RouteKey,
        targets: &[Partition],
    ) -> PartitionId;
}

/// Builds the strategy-tag -> resolver map used by the engine.
pub(crate) fn resolver_map(
    directory: DirectoryResolver,
) -> HashMap<ShardStrategy, Arc<dyn StrategyResolver>> {
    let mut resolvers: HashMap<ShardStrategy, Arc<dyn StrategyResolver>> = HashMap::new();
    resolvers.insert(ShardStrategy::Hash, Arc::new(HashResolver));
    resolvers.insert(ShardStrategy::Range, Arc::new(RangeResolver));
    resolvers.insert(ShardStrategy::Directory, Arc::new(directory));
    resolvers.insert(ShardStrategy::Fixed, Arc::new(FixedResolver));
    resolvers
}
