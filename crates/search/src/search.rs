//! The search pipeline: validate, enrich, filter, rank or sort, limit.

use crate::analytics::{SearchEvent, SearchEventSink};
use crate::config::{
    SearchConfig, SearchConfigInput, SearchMode, SortBy, SortOrder, resolve_config_with,
};
use crate::enrich::{EnrichmentStats, enrich_products};
use crate::error::Result;
use crate::filter::{FilterBreakdown, filter_products};
use crate::model::{BuyerContext, EnrichedProduct, ProductRecord, ScoredProduct};
use crate::presets::{PresetTable, WeightPreset};
use crate::rank::rank_products;
use crate::sort::sort_products;
use crate::source::{CandidateQuery, CandidateSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Result cap used by [`quick_search`].
pub const QUICK_SEARCH_LIMIT: usize = 10;

/// Record counts at each pipeline stage.
///
/// `output_count <= filtered_count <= enriched_count == input_count`, and
/// `filter_breakdown.total() == enriched_count - filtered_count`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    /// Records handed to the pipeline
    pub input_count: usize,
    /// Records after enrichment
    pub enriched_count: usize,
    /// Records that passed the filter
    pub filtered_count: usize,
    /// Records returned after the limit
    pub output_count: usize,
    /// Why records were filtered out
    pub filter_breakdown: FilterBreakdown,
    /// What enrichment could compute
    pub enrichment: EnrichmentStats,
}

/// Timing, counts, and the configuration actually used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMetadata {
    /// Pipeline wall time
    pub execution_time_ms: f64,
    /// Per-stage counts
    pub stats: SearchStats,
    /// Configuration after resolution
    pub resolved_config: SearchConfig,
}

/// Ranked output in ranking mode, sorted output in filter mode.
///
/// Serialized as a bare array. On its own an empty array reads back as
/// `Ranked`; [`SearchResult`] restores the variant from
/// `metadata.resolved_config.mode`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductList {
    /// Composite score and rank attached
    Ranked(Vec<ScoredProduct>),
    /// Enriched records in sort order
    Filtered(Vec<EnrichedProduct>),
}

impl ProductList {
    /// Number of products.
    pub fn len(&self) -> usize {
        match self {
            ProductList::Ranked(items) => items.len(),
            ProductList::Filtered(items) => items.len(),
        }
    }

    /// Whether there are no products.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Product IDs in output order.
    pub fn ids(&self) -> Vec<i64> {
        match self {
            ProductList::Ranked(items) => items.iter().map(ScoredProduct::id).collect(),
            ProductList::Filtered(items) => items.iter().map(EnrichedProduct::id).collect(),
        }
    }

    /// Ranked products, if this is ranking output.
    pub fn ranked(&self) -> Option<&[ScoredProduct]> {
        match self {
            ProductList::Ranked(items) => Some(items),
            ProductList::Filtered(_) => None,
        }
    }

    /// Sorted products, if this is filter output.
    pub fn filtered(&self) -> Option<&[EnrichedProduct]> {
        match self {
            ProductList::Filtered(items) => Some(items),
            ProductList::Ranked(_) => None,
        }
    }

    /// Enriched view of every product, in output order.
    pub fn enriched(&self) -> Vec<&EnrichedProduct> {
        match self {
            ProductList::Ranked(items) => items.iter().map(|s| &s.product).collect(),
            ProductList::Filtered(items) => items.iter().collect(),
        }
    }

    fn truncate(&mut self, len: usize) {
        match self {
            ProductList::Ranked(items) => items.truncate(len),
            ProductList::Filtered(items) => items.truncate(len),
        }
    }
}

/// Products plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireSearchResult")]
pub struct SearchResult {
    /// Output products
    pub products: ProductList,
    /// Timing and counts
    pub metadata: SearchMetadata,
}

#[derive(Deserialize)]
struct WireSearchResult {
    products: ProductList,
    metadata: SearchMetadata,
}

impl From<WireSearchResult> for SearchResult {
    fn from(wire: WireSearchResult) -> Self {
        let products = match (wire.products, wire.metadata.resolved_config.mode) {
            (ProductList::Ranked(items), SearchMode::Filter) if items.is_empty() => {
                ProductList::Filtered(Vec::new())
            }
            (products, _) => products,
        };
        Self {
            products,
            metadata: wire.metadata,
        }
    }
}

/// Configured search pipeline.
///
/// The default instance reads the wall clock, resolves presets against
/// [`PresetTable::STANDARD`], and reports to no sink.
///
/// ```
/// use freshcart_search::{BuyerContext, ProductRecord, ProductSearch};
///
/// let buyer = BuyerContext::new(14.5995, 120.9842);
/// let products = vec![ProductRecord::new(1).with_location(14.6010, 120.9860)];
/// let result = ProductSearch::new().search(&buyer, &products, None).unwrap();
/// assert_eq!(result.products.ids(), vec![1]);
/// ```
#[derive(Clone, Default)]
pub struct ProductSearch {
    sink: Option<Arc<dyn SearchEventSink>>,
    clock: Option<DateTime<Utc>>,
    presets: PresetTable,
}

impl fmt::Debug for ProductSearch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductSearch")
            .field("sink", &self.sink.is_some())
            .field("clock", &self.clock)
            .field("presets", &self.presets)
            .finish()
    }
}

impl ProductSearch {
    /// Pipeline with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report each successful search to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn SearchEventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Evaluate freshness at a fixed instant instead of the wall clock.
    #[must_use]
    pub fn with_clock(mut self, now: DateTime<Utc>) -> Self {
        self.clock = Some(now);
        self
    }

    /// Resolve presets against a different table.
    #[must_use]
    pub fn with_presets(mut self, presets: PresetTable) -> Self {
        self.presets = presets;
        self
    }

    /// Resolve caller input the way [`search`](Self::search) will.
    pub fn resolve(&self, config: Option<&SearchConfigInput>) -> SearchConfig {
        match config {
            Some(input) => resolve_config_with(input, &self.presets),
            None => resolve_config_with(&SearchConfigInput::default(), &self.presets),
        }
    }

    /// Run the pipeline over `products`.
    ///
    /// Fails only on an invalid buyer location. Unusable config values fall
    /// back to defaults and individual records with bad data are passed
    /// through without the fields that could not be computed.
    pub fn search(
        &self,
        buyer: &BuyerContext,
        products: &[ProductRecord],
        config: Option<&SearchConfigInput>,
    ) -> Result<SearchResult> {
        let started = Utc::now();
        buyer.validate()?;

        let config = self.resolve(config);
        let now = self.clock.unwrap_or(started);

        let (enriched, enrichment) = enrich_products(buyer, products, now);
        let enriched_count = enriched.len();
        debug!(
            input = products.len(),
            with_distance = enrichment.with_distance,
            with_freshness = enrichment.with_freshness,
            "Enriched"
        );

        let (kept, filter_breakdown) = filter_products(enriched, buyer, &config);
        let filtered_count = kept.len();
        debug!(kept = filtered_count, removed = filter_breakdown.total(), "Filtered");

        let mut products_out = match config.mode {
            SearchMode::Ranking => {
                ProductList::Ranked(rank_products(kept, &config.weights, config.max_radius_km))
            }
            SearchMode::Filter => ProductList::Filtered(sort_products(kept, &config)),
        };
        if let Some(limit) = config.limit {
            products_out.truncate(limit);
        }

        let stats = SearchStats {
            input_count: products.len(),
            enriched_count,
            filtered_count,
            output_count: products_out.len(),
            filter_breakdown,
            enrichment,
        };
        let execution_time_ms = elapsed_ms(started);
        debug!(mode = %config.mode, output = stats.output_count, execution_time_ms, "Search done");

        if let Some(sink) = &self.sink {
            sink.record(&SearchEvent {
                timestamp: now,
                buyer: *buyer,
                config: config.clone(),
                stats,
                execution_time_ms,
            });
        }

        Ok(SearchResult {
            products: products_out,
            metadata: SearchMetadata {
                execution_time_ms,
                stats,
                resolved_config: config,
            },
        })
    }

    /// Fetch candidates from `source`, then run the pipeline.
    ///
    /// The source only narrows by seller and product type. Distance is left
    /// to the pipeline filter so out-of-radius records show up in
    /// `filter_breakdown.radius`.
    pub fn search_source<S: CandidateSource + ?Sized>(
        &self,
        source: &S,
        buyer: &BuyerContext,
        seller_id: Option<i64>,
        product_type_id: Option<i64>,
        config: Option<&SearchConfigInput>,
    ) -> Result<SearchResult> {
        buyer.validate()?;
        let query = CandidateQuery {
            buyer: buyer.location,
            radius_km: None,
            seller_id,
            product_type_id,
        };
        let candidates = source.candidates(&query)?;
        debug!(candidates = candidates.len(), "Fetched candidates");
        self.search(buyer, &candidates, config)
    }
}

fn elapsed_ms(started: DateTime<Utc>) -> f64 {
    let elapsed = Utc::now() - started;
    elapsed
        .num_microseconds()
        .map_or(0.0, |us| us.max(0) as f64 / 1000.0)
}

/// Run the pipeline with default settings.
pub fn search(
    buyer: &BuyerContext,
    products: &[ProductRecord],
    config: Option<&SearchConfigInput>,
) -> Result<SearchResult> {
    ProductSearch::new().search(buyer, products, config)
}

/// Top ten by the balanced preset.
pub fn quick_search(buyer: &BuyerContext, products: &[ProductRecord]) -> Result<SearchResult> {
    let config = SearchConfigInput::new()
        .with_mode(SearchMode::Ranking)
        .with_preset(WeightPreset::Balanced.name())
        .with_limit(QUICK_SEARCH_LIMIT);
    search(buyer, products, Some(&config))
}

/// Filter mode, lowest price first.
pub fn cheapest_first(buyer: &BuyerContext, products: &[ProductRecord]) -> Result<SearchResult> {
    sorted_by(buyer, products, SortBy::Price, SortOrder::Asc, None)
}

/// Filter mode, closest first.
pub fn nearest_first(buyer: &BuyerContext, products: &[ProductRecord]) -> Result<SearchResult> {
    sorted_by(buyer, products, SortBy::Distance, SortOrder::Asc, None)
}

/// Filter mode, freshest first, dropping anything below `min_freshness`.
pub fn freshest_first(
    buyer: &BuyerContext,
    products: &[ProductRecord],
    min_freshness: f64,
) -> Result<SearchResult> {
    sorted_by(buyer, products, SortBy::Freshness, SortOrder::Desc, Some(min_freshness))
}

fn sorted_by(
    buyer: &BuyerContext,
    products: &[ProductRecord],
    sort_by: SortBy,
    sort_order: SortOrder,
    min_freshness: Option<f64>,
) -> Result<SearchResult> {
    let mut config = SearchConfigInput::new()
        .with_mode(SearchMode::Filter)
        .with_sort(sort_by, sort_order);
    config.min_freshness_score = min_freshness;
    search(buyer, products, Some(&config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use crate::model::StorageCondition;
    use crate::source::InMemoryCatalog;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    const BUYER_LAT: f64 = 14.5995;
    const BUYER_LNG: f64 = 120.9842;
    // One degree of latitude is about 111.19 km.
    const KM_PER_DEG_LAT: f64 = 111.195;

    fn buyer() -> BuyerContext {
        BuyerContext::new(BUYER_LAT, BUYER_LNG)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap()
    }

    fn at_km(id: i64, km_north: f64) -> ProductRecord {
        ProductRecord::new(id).with_location(BUYER_LAT + km_north / KM_PER_DEG_LAT, BUYER_LNG)
    }

    fn pipeline() -> ProductSearch {
        ProductSearch::new().with_clock(now())
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<SearchEvent>>);

    impl SearchEventSink for Recorder {
        fn record(&self, event: &SearchEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_same_location_zero_distance() {
        let products = vec![ProductRecord::new(1).with_location(BUYER_LAT, BUYER_LNG)];
        let result = pipeline().search(&buyer(), &products, None).unwrap();
        let ranked = result.products.ranked().unwrap();
        assert_eq!(ranked[0].product.distance_km, Some(0.0));
        assert_eq!(ranked[0].rank, 1);
    }

    #[test]
    fn test_filter_mode_radius() {
        let products = vec![at_km(1, 1.0), at_km(2, 3.0)];
        let config = SearchConfigInput::new()
            .with_mode(SearchMode::Filter)
            .with_radius(2.0);
        let result = pipeline().search(&buyer(), &products, Some(&config)).unwrap();

        assert_eq!(result.products.ids(), vec![1]);
        assert!(result.products.filtered().is_some());
        assert_eq!(result.metadata.stats.filter_breakdown.radius, 1);
        assert_eq!(result.metadata.stats.filtered_count, 1);
    }

    #[test]
    fn test_ranking_with_extreme_proximity_weight() {
        let closer_staler = at_km(1, 1.0).with_shelf_life(10, 8, now());
        let farther_fresher = at_km(2, 4.0).with_shelf_life(10, 0, now());
        let config = SearchConfigInput::new().with_weights(100.0, 0.0);
        let result = pipeline()
            .search(&buyer(), &[farther_fresher, closer_staler], Some(&config))
            .unwrap();

        assert_eq!(result.products.ids(), vec![1, 2]);
        assert_eq!(result.metadata.resolved_config.weights.proximity_weight, 100.0);
    }

    #[test]
    fn test_filter_mode_price_sort() {
        let products = vec![
            ProductRecord::new(1).with_price(50.0),
            ProductRecord::new(2).with_price(30.0),
            ProductRecord::new(3).with_price(80.0),
            ProductRecord::new(4).with_price(30.0),
        ];
        let result = cheapest_first(&buyer(), &products).unwrap();
        assert_eq!(result.products.ids(), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_unknown_preset_falls_back() {
        let products = vec![at_km(1, 1.0)];
        let config = SearchConfigInput::new().with_preset("turbo");
        let result = pipeline().search(&buyer(), &products, Some(&config)).unwrap();
        let resolved = &result.metadata.resolved_config;
        assert_eq!(resolved.weight_preset, None);
        assert_eq!(resolved.weights, crate::presets::Weights::DEFAULT);
    }

    #[test]
    fn test_stats_invariants() {
        let products = vec![
            at_km(1, 0.5).with_shelf_life(10, 0, now()),
            at_km(2, 25.0),
            at_km(3, 1.0).with_shelf_life(10, 9, now() - Duration::days(5)),
            ProductRecord::new(4).with_storage(StorageCondition::Frozen),
            ProductRecord::new(5),
        ];
        let config = SearchConfigInput::new()
            .with_min_freshness(20.0)
            .with_exclude_expired(true)
            .with_limit(1);
        let buyer = buyer().with_storage(StorageCondition::Refrigerated);
        let stats = pipeline()
            .search(&buyer, &products, Some(&config))
            .unwrap()
            .metadata
            .stats;

        assert_eq!(stats.input_count, 5);
        assert_eq!(stats.enriched_count, 5);
        assert_eq!(stats.filtered_count, 2);
        assert_eq!(stats.output_count, 1);
        assert_eq!(stats.filter_breakdown.expired, 1);
        assert_eq!(stats.filter_breakdown.radius, 1);
        assert_eq!(stats.filter_breakdown.storage, 1);
        assert_eq!(
            stats.filter_breakdown.total(),
            stats.enriched_count - stats.filtered_count
        );
    }

    #[test]
    fn test_deterministic_with_fixed_clock() {
        let products: Vec<ProductRecord> = (0..20)
            .map(|i| at_km(i, i as f64 * 0.4).with_shelf_life(7 + i % 5, i % 3, now() - Duration::days(i % 4)))
            .collect();
        let a = pipeline().search(&buyer(), &products, None).unwrap();
        let b = pipeline().search(&buyer(), &products, None).unwrap();
        assert_eq!(a.products, b.products);
        assert_eq!(a.metadata.stats, b.metadata.stats);
    }

    #[test]
    fn test_invalid_buyer_rejected() {
        let err = search(&BuyerContext::new(91.0, 0.0), &[], None).unwrap_err();
        assert!(matches!(err, SearchError::InvalidInput(_)));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_sink_receives_one_event() {
        let recorder = Arc::new(Recorder::default());
        let search = pipeline().with_sink(recorder.clone());
        search.search(&buyer(), &[at_km(1, 1.0)], None).unwrap();
        let _ = search.search(&BuyerContext::new(f64::NAN, 0.0), &[], None);

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp, now());
        assert_eq!(events[0].stats.output_count, 1);
    }

    #[test]
    fn test_quick_search_limits_to_ten() {
        let products: Vec<ProductRecord> = (0..15).map(|i| at_km(i, i as f64 * 0.2)).collect();
        let result = quick_search(&buyer(), &products).unwrap();
        assert_eq!(result.products.len(), QUICK_SEARCH_LIMIT);
        assert_eq!(result.metadata.resolved_config.weight_preset, Some(WeightPreset::Balanced));
        assert_eq!(result.products.ids()[0], 0);
    }

    #[test]
    fn test_nearest_and_freshest() {
        let products = vec![
            at_km(1, 3.0).with_shelf_life(10, 0, Utc::now()),
            at_km(2, 1.0).with_shelf_life(10, 6, Utc::now()),
        ];
        assert_eq!(nearest_first(&buyer(), &products).unwrap().products.ids(), vec![2, 1]);

        let freshest = freshest_first(&buyer(), &products, 50.0).unwrap();
        assert_eq!(freshest.products.ids(), vec![1]);
        assert_eq!(freshest.metadata.stats.filter_breakdown.freshness, 1);
    }

    #[test]
    fn test_search_source_applies_query() {
        let catalog = InMemoryCatalog::new(vec![
            at_km(1, 1.0).with_seller(7, 1),
            at_km(2, 1.5).with_seller(8, 1),
            at_km(3, 40.0).with_seller(7, 1),
        ]);
        let config = SearchConfigInput::new().with_radius(5.0);
        let result = pipeline()
            .search_source(&catalog, &buyer(), Some(7), None, Some(&config))
            .unwrap();

        assert_eq!(result.products.ids(), vec![1]);
        assert_eq!(result.metadata.stats.input_count, 2);
        assert_eq!(result.metadata.stats.filter_breakdown.radius, 1);
    }

    #[test]
    fn test_search_source_counts_radius_rejections() {
        let catalog = InMemoryCatalog::new(vec![at_km(1, 1.0), at_km(2, 3.0)]);
        let config = SearchConfigInput::new()
            .with_radius(2.0)
            .with_mode(SearchMode::Filter);

        let direct = pipeline()
            .search(&buyer(), catalog.products(), Some(&config))
            .unwrap();
        let sourced = pipeline()
            .search_source(&catalog, &buyer(), None, None, Some(&config))
            .unwrap();

        for result in [&direct, &sourced] {
            assert_eq!(result.products.ids(), vec![1]);
            assert_eq!(result.metadata.stats.input_count, 2);
            assert_eq!(result.metadata.stats.filter_breakdown.radius, 1);
        }
    }

    #[test]
    fn test_empty_result_keeps_mode_through_json() {
        for mode in [SearchMode::Ranking, SearchMode::Filter] {
            let config = SearchConfigInput::new().with_mode(mode);
            let result = pipeline().search(&buyer(), &[], Some(&config)).unwrap();
            let json = serde_json::to_string(&result).unwrap();
            let back: SearchResult = serde_json::from_str(&json).unwrap();

            assert_eq!(back.products, result.products);
            assert_eq!(back.products.filtered().is_some(), mode == SearchMode::Filter);
        }
    }

    #[test]
    fn test_wire_shape() {
        let result = pipeline()
            .search(&buyer(), &[at_km(1, 1.0).with_price(20.0)], None)
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["products"][0]["combined_score"].is_number());
        assert_eq!(json["products"][0]["rank"], 1);
        assert!(json["metadata"]["execution_time_ms"].is_number());
        assert_eq!(json["metadata"]["stats"]["input_count"], 1);
        assert_eq!(json["metadata"]["resolved_config"]["sort_order"], "desc");
    }
}
