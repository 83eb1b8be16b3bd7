//! # Basket Telemetry
//!
//! Logging and metrics for the basket sync engine.
//!
//! - **Logs**: `tracing-subscriber` registry with an `EnvFilter`, pretty or
//!   JSON output.
//! - **Metrics**: Prometheus counters and gauges in one registry, rendered
//!   with `encode_metrics()`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use basket_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BT_SERVICE_NAME` | `basket-sync` | Service name in log output |
//! | `BT_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `BT_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `BT_JSON_LOGS` | `false` | JSON formatted logs |

mod config;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, record_outbox_append, record_remote_fallback, record_route_transition,
    record_scan, record_store_write, register_metrics, set_outbox_pending, MetricsHandle,
    OUTBOX_APPENDS, OUTBOX_PENDING, REMOTE_FALLBACKS, ROUTE_TRANSITIONS, SCANS, STORE_WRITES,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    /// Subscriber could not be installed (usually: one is already set).
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Install the log subscriber and register metrics.
///
/// Call once at startup. A second call returns `TelemetryError::TracerInit`.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    tracing_setup::init_tracing(&config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "telemetry initialized"
    );

    Ok(TelemetryGuard { _metrics: metrics })
}

/// Keeps telemetry alive for the application lifetime.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Convenience macro for recording a metric increment.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
