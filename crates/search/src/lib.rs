//! Perishable-product search for the freshcart marketplace.
//!
//! This crate provides:
//! - Distance and shelf-life freshness enrichment
//! - Buyer-constraint filtering with per-reason counts
//! - Weighted proximity/freshness ranking and single-key sorting
//! - Lenient and strict configuration resolution with named weight presets
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use freshcart_search::{BuyerContext, ProductRecord, SearchConfigInput, SearchMode, search};
//!
//! let buyer = BuyerContext::new(14.5995, 120.9842);
//! let products = vec![
//!     ProductRecord::new(1).with_location(14.6010, 120.9860).with_shelf_life(14, 1, Utc::now()),
//!     ProductRecord::new(2).with_location(14.6500, 121.0300).with_shelf_life(7, 5, Utc::now()),
//! ];
//!
//! let config = SearchConfigInput::new().with_preset("balanced");
//! let result = search(&buyer, &products, Some(&config)).unwrap();
//!
//! assert_eq!(result.products.ids(), vec![1, 2]);
//! assert_eq!(result.metadata.resolved_config.mode, SearchMode::Ranking);
//! ```

pub mod analytics;
mod config;
mod enrich;
mod error;
mod filter;
mod freshness;
mod json;
mod model;
mod presets;
mod rank;
mod search;
mod sort;
pub mod source;

#[cfg(feature = "wasm")]
mod wasm;

pub use analytics::{NoopSink, SearchEvent, SearchEventSink, TracingSink};
pub use config::{
    DEFAULT_MAX_RADIUS_KM, DEFAULT_MIN_FRESHNESS, SearchConfig, SearchConfigInput, SearchMode,
    SortBy, SortOrder, WeightsInput, create_config, create_config_with, resolve_config,
    resolve_config_with,
};
pub use enrich::{EnrichmentStats, enrich_product, enrich_products};
pub use error::{Result, SearchError, SearchErrorCode};
pub use filter::{FilterBreakdown, FilterReason, filter_products, rejection_reason};
pub use freshness::{Freshness, evaluate_freshness};
pub use json::search_json;
pub use model::{BuyerContext, EnrichedProduct, ProductRecord, ScoredProduct, StorageCondition};
pub use presets::{PresetTable, WeightPreset, Weights};
pub use rank::{
    MAX_SCORE, NEUTRAL_SCORE, combined_score, freshness_score, proximity_score, rank_products,
};
pub use search::{
    ProductList, ProductSearch, QUICK_SEARCH_LIMIT, SearchMetadata, SearchResult, SearchStats,
    cheapest_first, freshest_first, nearest_first, quick_search, search,
};
pub use sort::sort_products;
pub use source::{CandidateQuery, CandidateSource, InMemoryCatalog};

pub use freshcart_geo::{Coordinate, haversine_distance};
