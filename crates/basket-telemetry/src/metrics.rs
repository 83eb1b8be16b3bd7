//! Prometheus metrics for the sync engine.
//!
//! All metrics follow the naming convention: `bt_<metric>[_total]`
//!
//! - **Counter**: scans, outbox appends, remote fallbacks, route transitions,
//!   store writes
//! - **Gauge**: outbox depth

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};

use crate::{metric_inc, TelemetryError};

lazy_static! {
    /// Global metrics registry, populated on first access.
    pub static ref REGISTRY: Registry = build_registry();

    /// Scans by workflow and validation outcome
    pub static ref SCANS: CounterVec = CounterVec::new(
        Opts::new("bt_scans_total", "Scans processed by workflow and outcome"),
        &["workflow", "outcome"]
    ).expect("metric creation failed");

    /// Entries waiting in the outbox
    pub static ref OUTBOX_PENDING: Gauge = Gauge::new(
        "bt_outbox_pending",
        "Operations waiting in the outbox for replay"
    ).expect("metric creation failed");

    /// Outbox appends by operation type
    pub static ref OUTBOX_APPENDS: CounterVec = CounterVec::new(
        Opts::new("bt_outbox_appends_total", "Operations appended to the outbox"),
        &["operation"]
    ).expect("metric creation failed");

    /// Writes that took the offline path, by reason (offline/timeout/remote_error)
    pub static ref REMOTE_FALLBACKS: CounterVec = CounterVec::new(
        Opts::new("bt_remote_fallbacks_total", "Remote writes deferred to the outbox"),
        &["reason"]
    ).expect("metric creation failed");

    /// Route status transitions by new status
    pub static ref ROUTE_TRANSITIONS: CounterVec = CounterVec::new(
        Opts::new("bt_route_status_transitions_total", "Route status transitions"),
        &["status"]
    ).expect("metric creation failed");

    /// Local container store writes
    pub static ref STORE_WRITES: Counter = Counter::new(
        "bt_store_writes_total",
        "Container records written to the local store"
    ).expect("metric creation failed");
}

fn build_registry() -> Registry {
    let registry = Registry::new();
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(SCANS.clone()),
        Box::new(OUTBOX_PENDING.clone()),
        Box::new(OUTBOX_APPENDS.clone()),
        Box::new(REMOTE_FALLBACKS.clone()),
        Box::new(ROUTE_TRANSITIONS.clone()),
        Box::new(STORE_WRITES.clone()),
    ];
    for metric in metrics {
        registry
            .register(metric)
            .expect("metric registration failed");
    }
    registry
}

/// Handle proving the registry is populated.
#[derive(Debug, Clone)]
pub struct MetricsHandle {
    registry: Registry,
}

impl MetricsHandle {
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

/// Populate the global registry. Safe to call more than once.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    Ok(MetricsHandle {
        registry: REGISTRY.clone(),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

pub fn record_scan(workflow: &str, outcome: &str) {
    metric_inc!(SCANS, &[workflow, outcome]);
}

pub fn set_outbox_pending(pending: usize) {
    OUTBOX_PENDING.set(pending as f64);
}

pub fn record_outbox_append(operation: &str) {
    metric_inc!(OUTBOX_APPENDS, &[operation]);
}

pub fn record_remote_fallback(reason: &str) {
    metric_inc!(REMOTE_FALLBACKS, &[reason]);
}

pub fn record_route_transition(status: &str) {
    metric_inc!(ROUTE_TRANSITIONS, &[status]);
}

pub fn record_store_write(count: usize) {
    STORE_WRITES.inc_by(count as f64);
}
