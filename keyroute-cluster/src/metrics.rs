//! Cluster-service metric names emitted through the `metrics` facade.

pub struct Metric {
    pub name: &'static str,
    description: &'static str,
}

pub(crate) const HEALTH_TRANSITIONS_TOTAL: Metric = Metric {
    name: "keyroute_partition_health_transitions_total",
    description: "Partition status transitions applied by the health monitor, labeled by partition and direction",
};

pub(crate) const REBALANCE_PLAN_MOVES: Metric = Metric {
    name: "keyroute_rebalance_plan_moves",
    description: "Number of moves in the most recent rebalance plan",
};

/// Registers metric descriptions with the installed recorder.
pub fn register_cluster_metrics() {
    metrics::describe_counter!(
        HEALTH_TRANSITIONS_TOTAL.name,
        HEALTH_TRANSITIONS_TOTAL.description
    );
    let _counter = metrics::counter!(HEALTH_TRANSITIONS_TOTAL.name);
    metrics::describe_gauge!(REBALANCE_PLAN_MOVES.name, REBALANCE_PLAN_MOVES.description);
    let _gauge = metrics::gauge!(REBALANCE_PLAN_MOVES.name);
}
