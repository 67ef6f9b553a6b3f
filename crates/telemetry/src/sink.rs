//! Search events into registry metrics.

use crate::registry::MetricsRegistry;
use freshcart_search::{SearchEvent, SearchEventSink, SearchMode};
use std::sync::Arc;

/// Feeds search events into a [`MetricsRegistry`].
///
/// Counters:
/// - `search.requests`, `search.mode.ranking`, `search.mode.filter`
/// - `search.empty_results`
/// - `search.products.input`, `search.products.output`
/// - `search.filtered.{expired,radius,freshness,storage}`
/// - `search.enrichment.invalid_locations`, `search.enrichment.freshness_skipped`
///
/// Histograms: `search.latency_ms`, `search.result_size`.
/// Gauge: `search.last_input_count`.
#[derive(Debug, Clone)]
pub struct MetricsSink {
    registry: Arc<MetricsRegistry>,
}

impl Default for MetricsSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsSink {
    /// Sink over the process-wide registry
    pub fn new() -> Self {
        Self::with_registry(crate::shared_metrics())
    }

    pub fn with_registry(registry: Arc<MetricsRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &MetricsRegistry {
        &self.registry
    }
}

impl SearchEventSink for MetricsSink {
    fn record(&self, event: &SearchEvent) {
        let m = &self.registry;
        let stats = &event.stats;
        let dropped = &stats.filter_breakdown;

        m.increment("search.requests");
        m.increment(match event.config.mode {
            SearchMode::Ranking => "search.mode.ranking",
            SearchMode::Filter => "search.mode.filter",
        });
        if event.is_empty_result() {
            m.increment("search.empty_results");
        }

        let counts = [
            ("search.products.input", stats.input_count),
            ("search.products.output", stats.output_count),
            ("search.filtered.expired", dropped.expired),
            ("search.filtered.radius", dropped.radius),
            ("search.filtered.freshness", dropped.freshness),
            ("search.filtered.storage", dropped.storage),
            ("search.enrichment.invalid_locations", stats.enrichment.invalid_locations),
            ("search.enrichment.freshness_skipped", stats.enrichment.freshness_skipped),
        ];
        for (name, n) in counts {
            m.add(name, n as u64);
        }

        m.observe("search.latency_ms", event.execution_time_ms);
        m.observe("search.result_size", stats.output_count as f64);
        m.set_gauge("search.last_input_count", stats.input_count as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freshcart_search::{BuyerContext, ProductRecord, ProductSearch, SearchConfigInput};

    #[test]
    fn test_counts_searches() {
        let registry = Arc::new(MetricsRegistry::new());
        let sink = Arc::new(MetricsSink::with_registry(Arc::clone(&registry)));
        let search = ProductSearch::new().with_sink(sink);

        let buyer = BuyerContext::new(14.5995, 120.9842);
        let products = vec![
            ProductRecord::new(1).with_location(14.6000, 120.9850),
            ProductRecord::new(2).with_location(15.5000, 121.0000),
            ProductRecord::new(3).with_location(95.0, 0.0),
        ];
        search.search(&buyer, &products, None).unwrap();
        search
            .search(&buyer, &[], Some(&SearchConfigInput::new().with_preset("balanced")))
            .unwrap();

        assert_eq!(registry.counter("search.requests"), 2);
        assert_eq!(registry.counter("search.mode.ranking"), 2);
        assert_eq!(registry.counter("search.empty_results"), 1);
        assert_eq!(registry.counter("search.products.input"), 3);
        assert_eq!(registry.counter("search.products.output"), 2);
        assert_eq!(registry.counter("search.filtered.radius"), 1);
        assert_eq!(registry.counter("search.enrichment.invalid_locations"), 1);
        assert_eq!(registry.histogram("search.latency_ms").unwrap().count, 2);
        assert_eq!(registry.gauge("search.last_input_count"), Some(0));

        let exported = registry.export_json();
        assert_eq!(exported["counters"]["search.requests"], 2);
    }

    #[test]
    fn test_filter_mode_counter() {
        let registry = Arc::new(MetricsRegistry::new());
        let search = ProductSearch::new()
            .with_sink(Arc::new(MetricsSink::with_registry(Arc::clone(&registry))));
        let config = SearchConfigInput::new().with_mode(SearchMode::Filter);

        search
            .search(&BuyerContext::new(0.0, 0.0), &[], Some(&config))
            .unwrap();

        assert_eq!(registry.counter("search.mode.filter"), 1);
        assert_eq!(registry.counter("search.mode.ranking"), 0);
    }
}
