//! Single-key sorting for filter mode.

use crate::config::{SearchConfig, SortBy, SortOrder};
use crate::model::EnrichedProduct;
use crate::rank::combined_score;
use std::cmp::Ordering;

/// Sort by `config.sort_by` in `config.sort_order`.
///
/// The sort is stable. A listing missing the key compares lower than any
/// listing that has it, so missing keys lead in ascending order and trail in
/// descending order. `SortBy::Score` uses the ranking composite with the
/// configured weights and radius.
pub fn sort_products(mut products: Vec<EnrichedProduct>, config: &SearchConfig) -> Vec<EnrichedProduct> {
    let ascending = |a: &EnrichedProduct, b: &EnrichedProduct| -> Ordering {
        match config.sort_by {
            SortBy::Price => cmp_missing_lowest(a.product.price, b.product.price),
            SortBy::Distance => cmp_missing_lowest(a.distance_km, b.distance_km),
            SortBy::Freshness => cmp_missing_lowest(a.freshness_percent, b.freshness_percent),
            SortBy::Expiration => a.expiration_date.cmp(&b.expiration_date),
            SortBy::Score => combined_score(a, &config.weights, config.max_radius_km)
                .total_cmp(&combined_score(b, &config.weights, config.max_radius_km)),
        }
    };

    match config.sort_order {
        SortOrder::Asc => products.sort_by(ascending),
        SortOrder::Desc => products.sort_by(|a, b| ascending(b, a)),
    }

    products
}

fn cmp_missing_lowest(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
