//! # Keyroute Core
//!
//! Shared types and contracts for the Keyroute shard routing engine.
//!
//! ## Contents
//!
//! - **Data model**: [`Partition`], [`RoutingRule`], [`RouteKey`] and the
//!   range types that bind a partition to a slice of the hash or key space
//! - **Error taxonomy**: [`ConfigError`] (fatal, load time only),
//!   [`RegistryError`] and [`BackendError`] (recoverable, runtime)
//! - **Collaborator traits**: [`ProbeClient`], [`StatsCollector`] and
//!   [`DirectoryService`] — the seams where a backend driver plugs in
//! - **Configuration**: [`TopologyConfig`], the serialized topology loaded
//!   and validated eagerly at startup
//!
//! The engine owns no persisted state; everything is rebuilt from
//! configuration plus live health probes on restart.

mod backend;
mod config;
mod errors;
mod key;
mod partition;
mod rule;

pub use backend::{DirectoryService, ProbeClient, StatsCollector};
pub use config::{
    DirectoryConfig, HealthConfig, RebalanceConfig, ScalerConfig, TopologyConfig,
};
pub use errors::{BackendError, ConfigError, RegistryError};
pub use key::RouteKey;
pub use partition::{
    HashRange, KeyRange, Partition, PartitionId, PartitionStats, PartitionStatus, StatsSample,
};
pub use rule::{validate_rule_targets, RoutingRule, ShardStrategy};
