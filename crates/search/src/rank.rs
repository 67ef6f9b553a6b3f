//! Weighted composite ranking.
//!
//! Each listing gets two component scores on a 0–100 scale:
//!
//! - proximity: `100 × (1 − distance / max_radius)`, floored at 0 at or
//!   beyond the radius
//! - freshness: the freshness percentage
//!
//! A missing component takes [`NEUTRAL_SCORE`]. The composite is
//! `proximity × proximity_weight + freshness × freshness_weight`, with the
//! weights used as given.

use crate::model::{EnrichedProduct, ScoredProduct};
use crate::presets::Weights;

/// Upper bound of a component score.
pub const MAX_SCORE: f64 = 100.0;

/// Component score used when the underlying field is missing.
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Closer is higher; 0 at or beyond `max_radius_km`.
pub fn proximity_score(distance_km: Option<f64>, max_radius_km: f64) -> f64 {
    match distance_km {
        Some(distance) if max_radius_km > 0.0 => {
            (MAX_SCORE * (1.0 - distance / max_radius_km)).clamp(0.0, MAX_SCORE)
        }
        Some(_) => 0.0,
        None => NEUTRAL_SCORE,
    }
}

/// The freshness percentage itself, clamped to 0–100.
pub fn freshness_score(freshness_percent: Option<f64>) -> f64 {
    freshness_percent.map_or(NEUTRAL_SCORE, |pct| pct.clamp(0.0, MAX_SCORE))
}

/// Weighted composite for one listing.
pub fn combined_score(product: &EnrichedProduct, weights: &Weights, max_radius_km: f64) -> f64 {
    proximity_score(product.distance_km, max_radius_km) * weights.proximity_weight
        + freshness_score(product.freshness_percent) * weights.freshness_weight
}

/// Score, sort descending by composite, and assign ranks `1..=N`.
///
/// The sort is stable: equal scores keep their input order.
pub fn rank_products(
    products: Vec<EnrichedProduct>,
    weights: &Weights,
    max_radius_km: f64,
) -> Vec<ScoredProduct> {
    let mut scored: Vec<ScoredProduct> = products
        .into_iter()
        .map(|product| {
            let combined_score = combined_score(&product, weights, max_radius_km);
            ScoredProduct {
                product,
                combined_score,
                rank: 0,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.combined_score.total_cmp(&a.combined_score));

    for (index, item) in scored.iter_mut().enumerate() {
        item.rank = index + 1;
    }

    scored
}
