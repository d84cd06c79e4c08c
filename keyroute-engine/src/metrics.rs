//! Routing metric names emitted through the `metrics` facade.
//!
//! The embedding service owns the exporter; this crate only registers and
//! emits. Names are suggestions, not a wire contract.

pub struct Metric {
    pub name: &'static str,
    description: &'static str,
}

pub(crate) const COUNTERS: [Metric; 2] = [ROUTING_REQUESTS_TOTAL, ROUTING_FALLBACKS_TOTAL];
pub(crate) const HISTOGRAMS: [Metric; 1] = [ROUTING_LATENCY_SECONDS];

pub(crate) const ROUTING_REQUESTS_TOTAL: Metric = Metric {
    name: "keyroute_routing_requests_total",
    description: "Total routing decisions, labeled by resolved partition",
};

pub(crate) const ROUTING_FALLBACKS_TOTAL: Metric = Metric {
    name: "keyroute_routing_fallbacks_total",
    description: "Routing decisions that degraded to a fallback, labeled by reason",
};

pub(crate) const PINNED_KEY_VIOLATIONS_TOTAL: Metric = Metric {
    name: "keyroute_pinned_key_violations_total",
    description: "Keys that mismatched a FIXED rule's pinned-key sentinel",
};

pub(crate) const ROUTING_LATENCY_SECONDS: Metric = Metric {
    name: "keyroute_routing_latency_seconds",
    description: "Latency of route() decisions",
};

/// Registers metric descriptions with the installed recorder.
pub fn register_routing_metrics() {
    for metric in COUNTERS {
        metrics::describe_counter!(metric.name, metric.description);
        let _counter = metrics::counter!(metric.name);
    }
    metrics::describe_counter!(
        PINNED_KEY_VIOLATIONS_TOTAL.name,
        PINNED_KEY_VIOLATIONS_TOTAL.description
    );
    for metric in HISTOGRAMS {
        metrics::describe_histogram!(metric.name, metric.description);
        let _histogram = metrics::histogram!(metric.name);
    }
}
