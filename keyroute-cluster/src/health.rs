//! Background health monitoring of registered partitions.
//!
//! A periodic loop probes every ACTIVE and OFFLINE partition concurrently
//! and applies status transitions with hysteresis: a partition must fail a
//! configured number of consecutive probes before it is taken offline, and
//! a single successful probe brings it back. READ_ONLY and MIGRATING are
//! operator-owned states and are never touched by the monitor.

use crate::metrics::HEALTH_TRANSITIONS_TOTAL;
use keyroute_core::{HealthConfig, Partition, PartitionId, PartitionStatus, ProbeClient};
use keyroute_registry::PartitionRegistry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct HealthMonitor {
    registry: Arc<PartitionRegistry>,
    probe: Arc<dyn ProbeClient>,
    config: HealthConfig,
    /// Consecutive probe failures per partition; cleared on success or
    /// deregistration.
    failures: Mutex<HashMap<PartitionId, u32>>,
}

impl HealthMonitor {
    pub fn new(
        registry: Arc<PartitionRegistry>,
        probe: Arc<dyn ProbeClient>,
        config: HealthConfig,
    ) -> Self {
        Self {
            registry,
            probe,
            config,
            failures: Mutex::new(HashMap::new()),
        }
    }

    /// Spawns the periodic probe loop and returns its handle.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        info!(
            interval_seconds = self.config.probe_interval_seconds,
            failure_threshold = self.config.failure_threshold,
            "starting health monitor"
        );
        tokio::spawn(async move {
            let mut interval =
                tokio::time::interval(Duration::from_secs(self.config.probe_interval_seconds));
            loop {
                interval.tick().await;
                self.probe_all_once().await;
            }
        })
    }

    /// Runs one probe cycle: probes all monitorable partitions concurrently,
    /// then applies the resulting transitions as a batch.
    pub async fn probe_all_once(&self) {
        let candidates: Vec<Partition> = self
            .registry
            .list_all()
            .into_iter()
            .filter(|p| {
                matches!(
                    p.status,
                    PartitionStatus::Active | PartitionStatus::Offline
                )
            })
            .collect();
        if candidates.is_empty() {
            return;
        }

        let timeout = Duration::from_secs(self.config.probe_timeout_seconds);
        let probes = candidates.iter().map(|partition| async move {
            let alive = match tokio::time::timeout(timeout, self.probe.probe(partition)).await {
                Ok(alive) => alive,
                Err(_) => {
                    debug!(partition = %partition.id, "health probe timed out");
                    false
                }
            };
            (partition.id.clone(), partition.status, alive)
        });
        let results = futures::future::join_all(probes).await;

        for (id, status, alive) in results {
            self.registry.touch_health_check(&id);
            self.apply_probe_result(&id, status, alive);
        }
        self.retain_registered_failures();
    }

    fn apply_probe_result(&self, id: &PartitionId, status: PartitionStatus, alive: bool) {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        if alive {
            failures.remove(id);
            if status == PartitionStatus::Offline
                && self.registry.update_status(id, PartitionStatus::Active)
            {
                info!(partition = %id, "partition recovered, marked active");
                metrics::counter!(
                    HEALTH_TRANSITIONS_TOTAL.name,
                    "partition" => id.clone(),
                    "to" => "active"
                )
                .increment(1);
            }
            return;
        }

        let streak = failures.entry(id.clone()).or_insert(0);
        *streak += 1;
        if *streak >= self.config.failure_threshold && status == PartitionStatus::Active {
            if self.registry.update_status(id, PartitionStatus::Offline) {
                warn!(
                    partition = %id,
                    consecutive_failures = *streak,
                    "marking partition offline after consecutive probe failures"
                );
                metrics::counter!(
                    HEALTH_TRANSITIONS_TOTAL.name,
                    "partition" => id.clone(),
                    "to" => "offline"
                )
                .increment(1);
            }
        } else {
            debug!(
                partition = %id,
                consecutive_failures = *streak,
                threshold = self.config.failure_threshold,
                "health probe failed"
            );
        }
    }

    /// Drops failure streaks for partitions that left the registry so the
    /// map cannot grow without bound under churn.
    fn retain_registered_failures(&self) {
        let mut failures = self.failures.lock().unwrap_or_else(|e| e.into_inner());
        failures.retain(|id, _| self.registry.contains(id));
    }
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthMonitor")
            .field("config", &self.config)
            .finish()
    }
}
