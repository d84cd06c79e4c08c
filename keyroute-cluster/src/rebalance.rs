//! Periodic data-skew detection and rebalance planning.
//!
//! The coordinator only plans. Each cycle collects a size sample per
//! partition, flags partitions whose size exceeds `skew_factor` times the
//! mean, and proposes one move per flagged partition toward its least
//! loaded rule peer. Executing the data movement belongs to the embedding
//! service, which receives plans over a channel.

use crate::metrics::REBALANCE_PLAN_MOVES;
use keyroute_core::{PartitionId, PartitionStatus, RebalanceConfig, StatsCollector};
use keyroute_engine::RoutingRuleSet;
use keyroute_registry::PartitionRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One proposed data movement between rule peers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionMove {
    pub from: PartitionId,
    pub to: PartitionId,
    /// Bytes to move to bring the source back to the mean.
    pub estimated_bytes: u64,
}

/// Outcome of one rebalance cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalancePlan {
    /// Partitions whose size exceeded the skew threshold this cycle.
    pub imbalanced_partitions: Vec<PartitionId>,
    pub moves: Vec<PartitionMove>,
}

impl RebalancePlan {
    pub fn is_empty(&self) -> bool {
        self.imbalanced_partitions.is_empty() && self.moves.is_empty()
    }
}

pub struct RebalanceCoordinator {
    registry: Arc<PartitionRegistry>,
    rules: Arc<RoutingRuleSet>,
    stats: Arc<dyn StatsCollector>,
    config: RebalanceConfig,
}

impl RebalanceCoordinator {
    pub fn new(
        registry: Arc<PartitionRegistry>,
        rules: Arc<RoutingRuleSet>,
        stats: Arc<dyn StatsCollector>,
        config: RebalanceConfig,
    ) -> Self {
        Self {
            registry,
            rules,
            stats,
            config,
        }
    }

    pub fn registry(&self) -> Arc<PartitionRegistry> {
        self.registry.clone()
    }

    /// Spawns the periodic planning loop. Non-empty plans are sent on
    /// `plan_tx`; the loop stops when the receiver is dropped.
    pub fn start(self: Arc<Self>, plan_tx: mpsc::Sender<RebalancePlan>) -> JoinHandle<()> {
        info!(
            interval_seconds = self.config.check_interval_seconds,
            skew_factor = self.config.skew_factor,
            "starting rebalance coordinator"
        );
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(self.config.check_interval_seconds));
            loop {
                interval.tick().await;
                let plan = self.run_cycle().await;
                if plan.is_empty() {
                    continue;
                }
                metrics::gauge!(REBALANCE_PLAN_MOVES.name).set(plan.moves.len() as f64);
                if plan_tx.send(plan).await.is_err() {
                    warn!("rebalance plan receiver dropped, stopping coordinator");
                    break;
                }
            }
        })
    }

    /// Runs one full cycle: collects stats for every non-OFFLINE partition
    /// and computes a plan from the sizes that arrived in time.
    ///
    /// A partition whose stats collection fails or times out is excluded
    /// from this cycle rather than failing it.
    pub async fn run_cycle(&self) -> RebalancePlan {
        let partitions: Vec<_> = self
            .registry
            .list_all()
            .into_iter()
            .filter(|p| p.status != PartitionStatus::Offline)
            .collect();

        let timeout = Duration::from_secs(self.config.stats_timeout_seconds);
        let samples = partitions.iter().map(|partition| async move {
            let outcome =
                tokio::time::timeout(timeout, self.stats.collect_stats(partition)).await;
            (partition.id.clone(), outcome)
        });

        let mut sizes: HashMap<PartitionId, u64> = HashMap::new();
        for (id, outcome) in futures::future::join_all(samples).await {
            match outcome {
                Ok(Ok(sample)) => {
                    sizes.insert(id.clone(), sample.size_bytes);
                    self.registry.update_stats(&id, sample);
                }
                Ok(Err(error)) => {
                    warn!(partition = %id, %error, "stats collection failed, excluding from this cycle");
                }
                Err(_) => {
                    warn!(partition = %id, "stats collection timed out, excluding from this cycle");
                }
            }
        }

        self.compute_plan(&sizes)
    }

    /// Pure planning step over one cycle's size samples.
    ///
    /// Below `min_partitions` samples there is nothing meaningful to
    /// balance and the plan is empty. Partitions are visited in configured
    /// order so the plan is deterministic for a given set of samples.
    pub fn compute_plan(&self, sizes: &HashMap<PartitionId, u64>) -> RebalancePlan {
        if sizes.len() < self.config.min_partitions {
            return RebalancePlan::default();
        }

        let total: u64 = sizes.values().sum();
        let mean = total as f64 / sizes.len() as f64;
        let threshold = mean * self.config.skew_factor;

        let mut plan = RebalancePlan::default();
        for partition in self.registry.list_all() {
            let Some(&size) = sizes.get(&partition.id) else {
                continue;
            };
            if size as f64 <= threshold {
                continue;
            }
            plan.imbalanced_partitions.push(partition.id.clone());

            match self.pick_destination(&partition.id, sizes) {
                Some(to) => {
                    let estimated_bytes = size.saturating_sub(mean as u64);
                    debug!(
                        from = %partition.id,
                        to = %to,
                        estimated_bytes,
                        "planned rebalance move"
                    );
                    plan.moves.push(PartitionMove {
                        from: partition.id.clone(),
                        to,
                        estimated_bytes,
                    });
                }
                None => {
                    warn!(
                        partition = %partition.id,
                        size_bytes = size,
                        "partition exceeds skew threshold but has no eligible move destination"
                    );
                }
            }
        }

        plan
    }

    /// Least loaded ACTIVE rule peer of `from` with a sample this cycle.
    /// Ties go to the peer listed first in configured order.
    fn pick_destination(
        &self,
        from: &PartitionId,
        sizes: &HashMap<PartitionId, u64>,
    ) -> Option<PartitionId> {
        let mut peers: Vec<PartitionId> = Vec::new();
        for rule in self.rules.rules_targeting(from) {
            for id in rule.target_partitions {
                if id != *from && !peers.contains(&id) {
                    peers.push(id);
                }
            }
        }

        let mut best: Option<(PartitionId, u64)> = None;
        for partition in self.registry.list_all() {
            if partition.status != PartitionStatus::Active || !peers.contains(&partition.id) {
                continue;
            }
            let Some(&size) = sizes.get(&partition.id) else {
                continue;
            };
            if best.as_ref().map_or(true, |(_, smallest)| size < *smallest) {
                best = Some((partition.id, size));
            }
        }
        best.map(|(id, _)| id)
    }
}

impl std::fmt::Debug for RebalanceCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebalanceCoordinator")
            .field("config", &self.config)
            .finish()
    }
}
