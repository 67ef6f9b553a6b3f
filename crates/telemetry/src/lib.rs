//! Logging and metrics for freshcart tools
//!
//! - [`init_with_config`] installs a tracing subscriber writing to stderr,
//!   compact or one JSON object per line
//! - [`MetricsRegistry`] holds counters, gauges, and windowed histograms
//! - [`MetricsSink`] turns search events into registry metrics

mod registry;
mod sink;

pub use registry::{HistogramSummary, MetricsRegistry, MetricsSnapshot, Timer, HISTOGRAM_WINDOW};
pub use sink::MetricsSink;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

static METRICS: Lazy<Arc<MetricsRegistry>> = Lazy::new(|| Arc::new(MetricsRegistry::new()));

static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Filter directive when neither `RUST_LOG` nor a settings file names one
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Logging and metrics settings, the `[telemetry]` table of a settings file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub log_level: String,
    /// JSON lines instead of the compact format
    pub json: bool,
    pub show_target: bool,
    pub show_thread_ids: bool,
    pub show_file: bool,
    pub show_line_number: bool,
    /// Feed search events into the metrics registry
    pub metrics_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            json: false,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            metrics_enabled: true,
        }
    }
}

/// Install the global subscriber with default settings
pub fn init() -> anyhow::Result<()> {
    init_with_config(TelemetryConfig::default())
}

/// Install the global subscriber. Fails if one is already set.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let base = tracing_subscriber::registry().with(filter);

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.show_target)
        .with_thread_ids(config.show_thread_ids)
        .with_file(config.show_file)
        .with_line_number(config.show_line_number);

    let result = if config.json {
        tracing::subscriber::set_global_default(base.with(layer.json()))
    } else {
        tracing::subscriber::set_global_default(base.with(layer.compact()))
    };
    result.map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {e}"))?;

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        json = config.json,
        "Logging ready"
    );
    Ok(())
}

/// Random per-process id, attached to exported metrics
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Process-wide registry
pub fn metrics() -> &'static MetricsRegistry {
    &METRICS
}

pub(crate) fn shared_metrics() -> Arc<MetricsRegistry> {
    Arc::clone(&METRICS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_uuid() {
        assert!(Uuid::parse_str(session_id()).is_ok());
        assert_eq!(session_id(), session_id());
    }

    #[test]
    fn test_config_fills_missing_fields() {
        let config: TelemetryConfig = serde_json::from_str(r#"{"json": true}"#).unwrap();
        assert!(config.json);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.metrics_enabled);
    }

    #[test]
    fn test_default_sink_shares_global_registry() {
        let sink = MetricsSink::new();
        sink.registry().increment("test.shared_registry");
        assert_eq!(metrics().counter("test.shared_registry"), 1);
    }
}
