//! # Keyroute Engine
//!
//! Rule lookup, strategy resolution and the public routing entry point.
//!
//! ## Resolution pipeline
//!
//! ```text
//! route(resource, key)
//!     │
//!     ▼
//! RoutingRuleSet ── exact / longest-prefix rule match
//!     │
//!     ▼
//! PartitionRegistry ── one status snapshot, filter to ACTIVE targets
//!     │
//!     ▼
//! StrategyResolver ── hash | range | directory | fixed
//! ```
//!
//! Every failure on this path degrades to the configured default partition
//! plus a structured event; the hot path never returns an error and, with
//! the exception of directory cache misses, never awaits I/O.

mod directory;
mod engine;
mod hash;
mod metrics;
mod rules;
mod strategy;


pub use engine::RoutingEngine;
pub use hash::fnv1a_32;
pub use metrics::register_routing_metrics;
pub use rules::RoutingRuleSet;
