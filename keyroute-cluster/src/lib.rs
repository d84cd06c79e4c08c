//! # Keyroute Cluster
//!
//! Background services around the routing engine: health monitoring,
//! rebalance planning and elastic scaling. Each service runs its own tokio
//! loop against the shared [`PartitionRegistry`] and [`RoutingRuleSet`];
//! none of them sits on the routing hot path.
//!
//! [`PartitionRegistry`]: keyroute_registry::PartitionRegistry
//! [`RoutingRuleSet`]: keyroute_engine::RoutingRuleSet

mod health;
mod metrics;
mod rebalance;
mod scaler;


pub use health::HealthMonitor;
pub use metrics::register_cluster_metrics;
pub use rebalance::{PartitionMove, RebalanceCoordinator, RebalancePlan};
pub use scaler::ClusterScaler;
