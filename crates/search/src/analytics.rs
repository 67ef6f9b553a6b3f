//! Search analytics events and sinks.
//!
//! The pipeline hands one [`SearchEvent`] per successful search to a
//! [`SearchEventSink`]. Sinks are infallible by signature and must not block;
//! they observe the search, they never change its result.

use crate::config::SearchConfig;
use crate::model::BuyerContext;
use crate::search::SearchStats;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

/// What happened in one search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEvent {
    /// When the search ran (the pipeline clock)
    pub timestamp: DateTime<Utc>,
    /// Who searched
    pub buyer: BuyerContext,
    /// Configuration after resolution
    pub config: SearchConfig,
    /// Per-stage counts
    pub stats: SearchStats,
    /// Wall time spent in the pipeline
    pub execution_time_ms: f64,
}

impl SearchEvent {
    /// Whether the search returned nothing.
    pub fn is_empty_result(&self) -> bool {
        self.stats.output_count == 0
    }
}

/// Receives search events.
pub trait SearchEventSink: Send + Sync {
    /// Record one event.
    fn record(&self, event: &SearchEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl SearchEventSink for NoopSink {
    fn record(&self, _event: &SearchEvent) {}
}

/// Emits each event as a structured `info` log line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl SearchEventSink for TracingSink {
    fn record(&self, event: &SearchEvent) {
        info!(
            latitude = event.buyer.location.latitude,
            longitude = event.buyer.location.longitude,
            mode = %event.config.mode,
            radius_km = event.config.max_radius_km,
            preset = event.config.weight_preset.map(|p| p.name()),
            input = event.stats.input_count,
            output = event.stats.output_count,
            filtered_out = event.stats.filter_breakdown.total(),
            execution_time_ms = event.execution_time_ms,
            "Search completed"
        );
    }
}

impl<S: SearchEventSink + ?Sized> SearchEventSink for std::sync::Arc<S> {
    fn record(&self, event: &SearchEvent) {
        (**self).record(event);
    }
}
