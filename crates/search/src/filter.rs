//! Drop listings the buyer cannot or should not see.

use crate::config::SearchConfig;
use crate::model::{BuyerContext, EnrichedProduct};
use serde::{Deserialize, Serialize};

/// Why a listing was removed. Rules run in declaration order and a listing
/// is attributed to the first rule that removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterReason {
    /// Shelf life has run out (only when `exclude_expired` is set)
    Expired,
    /// Farther than `max_radius_km`
    Radius,
    /// Below `min_freshness_score`
    Freshness,
    /// Needs colder storage than the buyer has
    Storage,
}

/// Per-rule removal counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterBreakdown {
    /// Removed as expired
    pub expired: usize,
    /// Removed for distance
    pub radius: usize,
    /// Removed for low freshness
    pub freshness: usize,
    /// Removed for storage incompatibility
    pub storage: usize,
}

impl FilterBreakdown {
    /// Total removed.
    pub fn total(&self) -> usize {
        self.expired + self.radius + self.freshness + self.storage
    }

    fn record(&mut self, reason: FilterReason) {
        match reason {
            FilterReason::Expired => self.expired += 1,
            FilterReason::Radius => self.radius += 1,
            FilterReason::Freshness => self.freshness += 1,
            FilterReason::Storage => self.storage += 1,
        }
    }
}

/// First rule that removes `product`, or `None` if it survives.
///
/// A listing missing the field a rule looks at passes that rule.
pub fn rejection_reason(
    product: &EnrichedProduct,
    buyer: &BuyerContext,
    config: &SearchConfig,
) -> Option<FilterReason> {
    if config.exclude_expired && product.is_expired == Some(true) {
        return Some(FilterReason::Expired);
    }

    if product
        .distance_km
        .is_some_and(|km| km > config.max_radius_km)
    {
        return Some(FilterReason::Radius);
    }

    if product
        .freshness_percent
        .is_some_and(|pct| pct < config.min_freshness_score)
    {
        return Some(FilterReason::Freshness);
    }

    if let (Some(capability), Some(required)) =
        (buyer.storage_capability, product.product.storage_condition)
    {
        if !capability.accepts(required) {
            return Some(FilterReason::Storage);
        }
    }

    None
}

/// Keep the listings that pass every rule, in input order.
pub fn filter_products(
    products: Vec<EnrichedProduct>,
    buyer: &BuyerContext,
    config: &SearchConfig,
) -> (Vec<EnrichedProduct>, FilterBreakdown) {
    let mut breakdown = FilterBreakdown::default();
    let kept = products
        .into_iter()
        .filter(|product| match rejection_reason(product, buyer, config) {
            Some(reason) => {
                breakdown.record(reason);
                false
            }
            None => true,
        })
        .collect();

    (kept, breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ProductRecord, StorageCondition};

    fn product(id: i64, distance: Option<f64>, freshness: Option<f64>) -> EnrichedProduct {
        let mut p = EnrichedProduct::bare(ProductRecord::new(id));
        p.distance_km = distance;
        p.freshness_percent = freshness;
        p
    }

    fn buyer() -> BuyerContext {
        BuyerContext::new(14.5995, 120.9842)
    }

    #[test]
    fn test_radius_rule() {
        let config = SearchConfig {
            max_radius_km: 2.0,
            ..SearchConfig::default()
        };
        let products = vec![product(1, Some(1.0), None), product(2, Some(3.0), None)];
        let (kept, breakdown) = filter_products(products, &buyer(), &config);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id(), 1);
        assert_eq!(breakdown.radius, 1);
        assert_eq!(breakdown.total(), 1);
    }

    #[test]
    fn test_radius_boundary_is_inclusive() {
        let config = SearchConfig {
            max_radius_km: 2.0,
            ..SearchConfig::default()
        };
        assert_eq!(rejection_reason(&product(1, Some(2.0), None), &buyer(), &config), None);
    }

    #[test]
    fn test_freshness_rule() {
        let config = SearchConfig {
            min_freshness_score: 50.0,
            ..SearchConfig::default()
        };
        let products = vec![
            product(1, None, Some(49.9)),
            product(2, None, Some(50.0)),
            product(3, None, None),
        ];
        let (kept, breakdown) = filter_products(products, &buyer(), &config);
        let ids: Vec<i64> = kept.iter().map(EnrichedProduct::id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(breakdown.freshness, 1);
    }

    #[test]
    fn test_expired_rule_only_when_enabled() {
        let mut expired = product(1, Some(0.5), Some(0.0));
        expired.is_expired = Some(true);

        let lenient = SearchConfig::default();
        assert_eq!(rejection_reason(&expired, &buyer(), &lenient), None);

        let strict = SearchConfig {
            exclude_expired: true,
            ..SearchConfig::default()
        };
        assert_eq!(rejection_reason(&expired, &buyer(), &strict), Some(FilterReason::Expired));
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let mut p = product(1, Some(50.0), Some(0.0));
        p.is_expired = Some(true);
        let config = SearchConfig {
            exclude_expired: true,
            min_freshness_score: 10.0,
            ..SearchConfig::default()
        };
        let (_, breakdown) = filter_products(vec![p], &buyer(), &config);
        assert_eq!(breakdown, FilterBreakdown { expired: 1, ..Default::default() });
    }

    #[test]
    fn test_storage_rule() {
        let frozen = EnrichedProduct::bare(ProductRecord::new(1).with_storage(StorageCondition::Frozen));
        let chilled =
            EnrichedProduct::bare(ProductRecord::new(2).with_storage(StorageCondition::Refrigerated));
        let unknown = EnrichedProduct::bare(ProductRecord::new(3));
        let config = SearchConfig::default();

        let fridge_only = buyer().with_storage(StorageCondition::Refrigerated);
        let (kept, breakdown) = filter_products(
            vec![frozen.clone(), chilled.clone(), unknown.clone()],
            &fridge_only,
            &config,
        );
        let ids: Vec<i64> = kept.iter().map(EnrichedProduct::id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(breakdown.storage, 1);

        // No declared capability: storage is not checked.
        let (kept, _) = filter_products(vec![frozen, chilled, unknown], &buyer(), &config);
        assert_eq!(kept.len(), 3);
    }

    #[test]
    fn test_missing_data_never_filtered() {
        let config = SearchConfig {
            max_radius_km: 0.1,
            min_freshness_score: 99.0,
            exclude_expired: true,
            ..SearchConfig::default()
        };
        let bare = product(1, None, None);
        let ambient_buyer = buyer().with_storage(StorageCondition::Ambient);
        assert_eq!(rejection_reason(&bare, &ambient_buyer, &config), None);
    }
}
