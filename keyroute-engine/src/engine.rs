use crate::metrics::{ROUTING_FALLBACKS_TOTAL, ROUTING_LATENCY_SECONDS, ROUTING_REQUESTS_TOTAL};
use crate::rules::RoutingRuleSet;
use crate::strategy::{resolver_map, DirectoryResolver, StrategyResolver};
use keyroute_core::{
    ConfigError, DirectoryConfig, DirectoryService, Partition, PartitionId, PartitionStatus,
    RouteKey, ShardStrategy, TopologyConfig,
};
use keyroute_registry::PartitionRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, warn};

/// The public routing entry point.
///
/// `route` never fails: every resolution problem degrades to the configured
/// default partition plus an observability event, because callers generally
/// cannot usefully react to "no partition available". Routing is
/// deterministic for a stable topology — the same (resource, key) resolves
/// to the same partition until a partition is added, removed, or changes
/// range or status.
pub struct RoutingEngine {
    registry: Arc<PartitionRegistry>,
    rules: Arc<RoutingRuleSet>,
    default_partition: PartitionId,
    resolvers: HashMap<ShardStrategy, Arc<dyn StrategyResolver>>,
}

impl RoutingEngine {
    pub fn new(
        registry: Arc<PartitionRegistry>,
        rules: Arc<RoutingRuleSet>,
        default_partition: PartitionId,
        directory_service: Option<Arc<dyn DirectoryService>>,
        directory_config: &DirectoryConfig,
    ) -> Self {
        let directory = DirectoryResolver::new(
            directory_service,
            Duration::from_secs(directory_config.cache_ttl_seconds),
            Duration::from_secs(directory_config.lookup_timeout_seconds),
        );
        Self {
            registry,
            rules,
            default_partition,
            resolvers: resolver_map(directory),
        }
    }

    /// Builds a registry, rule set and engine from a validated topology.
    ///
    /// Fails fast on any invariant violation; the engine must not start in
    /// an invalid state.
    pub fn from_config(
        config: &TopologyConfig,
        directory_service: Option<Arc<dyn DirectoryService>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let registry = Arc::new(PartitionRegistry::new());
        for partition in &config.partitions {
            registry
                .register(partition.clone())
                .map_err(|_| ConfigError::DuplicatePartition(partition.id.clone()))?;
        }

        let rules = Arc::new(RoutingRuleSet::new());
        for rule in &config.rules {
            rules.add_rule(rule.clone(), &registry)?;
        }

        Ok(Self::new(
            registry,
            rules,
            config.default_partition.clone(),
            directory_service,
            &config.directory,
        ))
    }

    pub fn registry(&self) -> Arc<PartitionRegistry> {
        self.registry.clone()
    }

    pub fn rules(&self) -> Arc<RoutingRuleSet> {
        self.rules.clone()
    }

    pub fn default_partition(&self) -> &PartitionId {
        &self.default_partition
    }

    /// Resolves a resource name and key to a partition id.
    ///
    /// Resolution order: rule lookup, one status snapshot of the rule's
    /// targets, filter to ACTIVE, strategy resolution over the active
    /// subset. The directory strategy's cache-miss lookup is the only
    /// branch that awaits I/O.
    pub async fn route(&self, resource_name: &str, key: &RouteKey) -> PartitionId {
        let started = Instant::now();
        let partition = self.route_inner(resource_name, key).await;
        metrics::histogram!(ROUTING_LATENCY_SECONDS.name)
            .record(started.elapsed().as_secs_f64());
        metrics::counter!(ROUTING_REQUESTS_TOTAL.name, "partition" => partition.clone())
            .increment(1);
        partition
    }

    /// Batches keys by resolved partition for scatter/gather query
    /// construction. Pure composition of [`route`](Self::route).
    pub async fn route_many(
        &self,
        resource_name: &str,
        keys: Vec<RouteKey>,
    ) -> HashMap<PartitionId, Vec<RouteKey>> {
        let mut batches: HashMap<PartitionId, Vec<RouteKey>> = HashMap::new();
        for key in keys {
            let partition = self.route(resource_name, &key).await;
            batches.entry(partition).or_default().push(key);
        }
        batches
    }

    async fn route_inner(&self, resource_name: &str, key: &RouteKey) -> PartitionId {
        let rule = match self.rules.resolve_rule(resource_name) {
            Some(rule) => rule,
            None => {
                warn!(
                    resource = %resource_name,
                    default = %self.default_partition,
                    "no routing rule matches, routing to default partition"
                );
                metrics::counter!(ROUTING_FALLBACKS_TOTAL.name, "reason" => "no_rule")
                    .increment(1);
                return self.default_partition.clone();
            }
        };

        // One coherent status snapshot per call: a target cannot flip
        // between the filtering and resolution steps below.
        let statuses = self.registry.status_view(&rule.target_partitions);
        let targets: Vec<Partition> = rule
            .target_partitions
            .iter()
            .filter(|id| statuses.get(*id) == Some(&PartitionStatus::Active))
            .filter_map(|id| self.registry.get(id))
            .collect();

        if targets.is_empty() {
            error!(
                resource = %resource_name,
                rule_targets = rule.target_partitions.len(),
                default = %self.default_partition,
                "all target partitions unavailable, routing to default partition"
            );
            metrics::counter!(ROUTING_FALLBACKS_TOTAL.name, "reason" => "no_active_targets")
                .increment(1);
            return self.default_partition.clone();
        }

        match self.resolvers.get(&rule.strategy) {
            Some(resolver) => resolver.resolve(&rule, key, &targets).await,
            None => {
                // Unreachable with the construction-time resolver map, kept
                // as a fallback rather than a panic on the hot path.
                warn!(strategy = ?rule.strategy, "no resolver for strategy");
                self.default_partition.clone()
            }
        }
    }
}

impl std::fmt::Debug for RoutingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingEngine")
            .field("default_partition", &self.default_partition)
            .field("partitions", &self.registry.len())
            .finish()
    }
}
