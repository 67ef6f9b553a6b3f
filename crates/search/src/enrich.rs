//! Attach distance and freshness to candidate products.
//!
//! Enrichment is best-effort per record. A listing without a location gets no
//! distance; a listing without shelf-life data (or with a shelf life that
//! fails the guard) gets no freshness. Nothing here fails the whole batch.

use crate::freshness::evaluate_freshness;
use crate::model::{BuyerContext, EnrichedProduct, ProductRecord};
use chrono::{DateTime, Utc};
use freshcart_geo::haversine_distance;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// What enrichment managed to compute across a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentStats {
    /// Records that received `distance_km`
    pub with_distance: usize,
    /// Records whose location was present but out of range
    pub invalid_locations: usize,
    /// Records that received freshness fields
    pub with_freshness: usize,
    /// Records whose shelf-life data was present but rejected
    pub freshness_skipped: usize,
}

#[derive(Debug, Clone, Copy, Default)]
struct RecordOutcome {
    distance: bool,
    invalid_location: bool,
    freshness: bool,
    freshness_skipped: bool,
}

impl EnrichmentStats {
    fn add(&mut self, outcome: RecordOutcome) {
        self.with_distance += usize::from(outcome.distance);
        self.invalid_locations += usize::from(outcome.invalid_location);
        self.with_freshness += usize::from(outcome.freshness);
        self.freshness_skipped += usize::from(outcome.freshness_skipped);
    }
}

/// Enrich one record relative to the buyer at time `now`.
pub fn enrich_product(
    buyer: &BuyerContext,
    product: &ProductRecord,
    now: DateTime<Utc>,
) -> EnrichedProduct {
    enrich_with_outcome(buyer, product, now).0
}

/// Enrich every record, preserving input order.
///
/// With the `parallel` feature the records are processed on the rayon pool.
pub fn enrich_products(
    buyer: &BuyerContext,
    products: &[ProductRecord],
    now: DateTime<Utc>,
) -> (Vec<EnrichedProduct>, EnrichmentStats) {
    #[cfg(feature = "parallel")]
    let results: Vec<(EnrichedProduct, RecordOutcome)> = {
        use rayon::prelude::*;
        products
            .par_iter()
            .map(|product| enrich_with_outcome(buyer, product, now))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let results: Vec<(EnrichedProduct, RecordOutcome)> = products
        .iter()
        .map(|product| enrich_with_outcome(buyer, product, now))
        .collect();

    let mut stats = EnrichmentStats::default();
    let enriched = results
        .into_iter()
        .map(|(product, outcome)| {
            stats.add(outcome);
            product
        })
        .collect();

    (enriched, stats)
}

fn enrich_with_outcome(
    buyer: &BuyerContext,
    product: &ProductRecord,
    now: DateTime<Utc>,
) -> (EnrichedProduct, RecordOutcome) {
    let mut enriched = EnrichedProduct::bare(product.clone());
    let mut outcome = RecordOutcome::default();

    if let Some(location) = product.location {
        if location.is_valid() {
            enriched.distance_km = Some(haversine_distance(&buyer.location, &location));
            outcome.distance = true;
        } else {
            warn!(
                product_id = product.id,
                latitude = location.latitude,
                longitude = location.longitude,
                "Skipping distance for out-of-range location"
            );
            outcome.invalid_location = true;
        }
    }

    if let (Some(total), Some(listed_at)) = (product.total_shelf_life_days, product.listed_at) {
        let used = product.days_already_used.unwrap_or(0);
        match evaluate_freshness(product.id, total, used, listed_at, now) {
            Ok(freshness) => {
                enriched.remaining_shelf_life_days = Some(freshness.remaining_shelf_life_days);
                enriched.freshness_percent = Some(freshness.freshness_percent);
                enriched.expiration_date = Some(freshness.expiration_date);
                enriched.is_expired = Some(freshness.is_expired);
                outcome.freshness = true;
            }
            Err(e) => {
                warn!(product_id = product.id, error = %e, "Skipping freshness");
                outcome.freshness_skipped = true;
            }
        }
    }

    (enriched, outcome)
}
