use super::StrategyResolver;
use crate::directory::DirectoryCache;
use crate::metrics::ROUTING_FALLBACKS_TOTAL;
use async_trait::async_trait;
use keyroute_core::{DirectoryService, Partition, PartitionId, RouteKey, RoutingRule};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Routes through an external directory service with a TTL-bounded cache.
///
/// The cache-miss lookup is the only awaiting branch on the routing path
/// and carries its own timeout; any failure falls back to the first target.
pub(crate) struct DirectoryResolver {
    cache: DirectoryCache,
    service: Option<Arc<dyn DirectoryService>>,
    lookup_timeout: Duration,
}

impl DirectoryResolver {
    pub(crate) fn new(
        service: Option<Arc<dyn DirectoryService>>,
        cache_ttl: Duration,
        lookup_timeout: Duration,
    ) -> Self {
        Self {
            cache: DirectoryCache::new(cache_ttl),
            service,
            lookup_timeout,
        }
    }
}

#[async_trait]
impl StrategyResolver for DirectoryResolver {
    async fn resolve(
        &self,
        rule: &RoutingRule,
        key: &RouteKey,
        targets: &[Partition],
    ) -> PartitionId {
        let key_str = key.canonical();
        if let Some(partition_id) = self.cache.get(&rule.resource_name, &key_str) {
            return partition_id;
        }

        let service = match &self.service {
            Some(service) => service,
            None => {
                warn!(
                    resource = %rule.resource_name,
                    "no directory service configured, falling back to first target"
                );
                metrics::counter!(ROUTING_FALLBACKS_TOTAL.name, "reason" => "directory_missing")
                    .increment(1);
                return targets[0].id.clone();
            }
        };

        match tokio::time::timeout(
            self.lookup_timeout,
            service.lookup(&rule.resource_name, &key_str),
        )
        .await
        {
            Ok(Ok(partition_id)) => {
                self.cache
                    .insert(&rule.resource_name, &key_str, partition_id.clone());
                partition_id
            }
            Ok(Err(error)) => {
                warn!(
                    resource = %rule.resource_name,
                    error = %error,
                    "directory lookup failed, falling back to first target"
                );
                metrics::counter!(ROUTING_FALLBACKS_TOTAL.name, "reason" => "directory_error")
                    .increment(1);
                targets[0].id.clone()
            }
            Err(_) => {
                warn!(
                    resource = %rule.resource_name,
                    timeout_ms = %self.lookup_timeout.as_millis(),
                    "directory lookup timed out, falling back to first target"
                );
                metrics::counter!(ROUTING_FALLBACKS_TOTAL.name, "reason" => "directory_timeout")
                    .increment(1);
                targets[0].id.clone()
            }
        }
    }
}
