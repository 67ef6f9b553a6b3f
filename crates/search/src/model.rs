//! Buyer, product, and enriched-product types.
//!
//! Every field a data source may leave out is an `Option`. Downstream stages
//! match on presence; none of them assume a complete record.

use crate::error::{Result, SearchError};
use chrono::{DateTime, Utc};
use freshcart_geo::Coordinate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage a product requires, or the best storage a buyer can provide.
///
/// Ordered from least to most demanding: a buyer who can freeze can also
/// refrigerate and keep things at room temperature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageCondition {
    /// Room temperature
    Ambient,
    /// 0–8 °C
    Refrigerated,
    /// Below −18 °C
    Frozen,
}

impl StorageCondition {
    /// All conditions, least demanding first.
    pub const ALL: [StorageCondition; 3] = [
        StorageCondition::Ambient,
        StorageCondition::Refrigerated,
        StorageCondition::Frozen,
    ];

    /// Whether a buyer with this capability can take a product that
    /// requires `required`.
    #[inline]
    pub fn accepts(self, required: StorageCondition) -> bool {
        required <= self
    }

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            StorageCondition::Ambient => "ambient",
            StorageCondition::Refrigerated => "refrigerated",
            StorageCondition::Frozen => "frozen",
        }
    }
}

impl fmt::Display for StorageCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageCondition {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ambient" | "room" | "dry" => Ok(StorageCondition::Ambient),
            "refrigerated" | "chilled" | "fridge" => Ok(StorageCondition::Refrigerated),
            "frozen" | "freezer" => Ok(StorageCondition::Frozen),
            other => Err(SearchError::InvalidInput(format!(
                "unknown storage condition `{other}`"
            ))),
        }
    }
}

/// Who is searching and what they can store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuyerContext {
    /// Buyer location
    pub location: Coordinate,
    /// Best storage the buyer has, if declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_capability: Option<StorageCondition>,
}

impl BuyerContext {
    /// Buyer at the given coordinate with no declared storage.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            location: Coordinate::new(latitude, longitude),
            storage_capability: None,
        }
    }

    /// Declare the buyer's storage capability.
    #[must_use]
    pub fn with_storage(mut self, capability: StorageCondition) -> Self {
        self.storage_capability = Some(capability);
        self
    }

    /// Reject non-finite or out-of-range coordinates.
    pub fn validate(&self) -> Result<()> {
        self.location
            .validate()
            .map_err(|e| SearchError::InvalidInput(format!("buyer location: {e}")))
    }
}

/// A listed product as returned by the data source, joined with seller and
/// product-type metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Product ID
    pub id: i64,
    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Seller ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<i64>,
    /// Product type (category) ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type_id: Option<i64>,
    /// Unit price, > 0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Units available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    /// Seller location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinate>,
    /// Shelf life of the product type, in days
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_shelf_life_days: Option<i64>,
    /// Days spent in storage before listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_already_used: Option<i64>,
    /// When the listing went live
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listed_at: Option<DateTime<Utc>>,
    /// Storage the product requires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_condition: Option<StorageCondition>,
}

impl ProductRecord {
    /// A record with only an ID; everything else absent.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            name: None,
            seller_id: None,
            product_type_id: None,
            price: None,
            quantity: None,
            location: None,
            total_shelf_life_days: None,
            days_already_used: None,
            listed_at: None,
            storage_condition: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the unit price.
    #[must_use]
    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Set available quantity.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Set the seller location.
    #[must_use]
    pub fn with_location(mut self, latitude: f64, longitude: f64) -> Self {
        self.location = Some(Coordinate::new(latitude, longitude));
        self
    }

    /// Set shelf-life constants and listing time together.
    #[must_use]
    pub fn with_shelf_life(
        mut self,
        total_days: i64,
        days_used: i64,
        listed_at: DateTime<Utc>,
    ) -> Self {
        self.total_shelf_life_days = Some(total_days);
        self.days_already_used = Some(days_used);
        self.listed_at = Some(listed_at);
        self
    }

    /// Set the required storage.
    #[must_use]
    pub fn with_storage(mut self, condition: StorageCondition) -> Self {
        self.storage_condition = Some(condition);
        self
    }

    /// Set seller and product-type IDs.
    #[must_use]
    pub fn with_seller(mut self, seller_id: i64, product_type_id: i64) -> Self {
        self.seller_id = Some(seller_id);
        self.product_type_id = Some(product_type_id);
        self
    }
}

/// A product record plus computed distance and freshness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedProduct {
    /// The untouched input record
    #[serde(flatten)]
    pub product: ProductRecord,
    /// Great-circle distance from the buyer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
    /// Shelf-life days left; negative once past expiry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_shelf_life_days: Option<i64>,
    /// Remaining shelf life, 0–100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness_percent: Option<f64>,
    /// When the product runs out of shelf life
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    /// Whether remaining shelf life is zero or less
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_expired: Option<bool>,
}

impl EnrichedProduct {
    /// Wrap a record with no enrichment yet.
    pub fn bare(product: ProductRecord) -> Self {
        Self {
            product,
            distance_km: None,
            remaining_shelf_life_days: None,
            freshness_percent: None,
            expiration_date: None,
            is_expired: None,
        }
    }

    /// Product ID.
    #[inline]
    pub fn id(&self) -> i64 {
        self.product.id
    }
}

/// An enriched product with its ranking-mode score and 1-based rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredProduct {
    /// The enriched record
    #[serde(flatten)]
    pub product: EnrichedProduct,
    /// Weighted composite of proximity and freshness scores
    pub combined_score: f64,
    /// Position after sorting, starting at 1
    pub rank: usize,
}

impl ScoredProduct {
    /// Product ID.
    #[inline]
    pub fn id(&self) -> i64 {
        self.product.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_storage_capability_ordering() {
        use StorageCondition::*;

        assert!(Frozen.accepts(Ambient));
        assert!(Frozen.accepts(Refrigerated));
        assert!(Frozen.accepts(Frozen));
        assert!(Refrigerated.accepts(Ambient));
        assert!(!Refrigerated.accepts(Frozen));
        assert!(Ambient.accepts(Ambient));
        assert!(!Ambient.accepts(Refrigerated));
    }

    #[test]
    fn test_storage_parse_aliases() {
        assert_eq!("Chilled".parse::<StorageCondition>().unwrap(), StorageCondition::Refrigerated);
        assert_eq!(" frozen ".parse::<StorageCondition>().unwrap(), StorageCondition::Frozen);
        assert!("lukewarm".parse::<StorageCondition>().is_err());
    }

    #[test]
    fn test_buyer_validation() {
        assert!(BuyerContext::new(14.5995, 120.9842).validate().is_ok());
        let err = BuyerContext::new(f64::NAN, 120.0).validate().unwrap_err();
        assert!(matches!(err, SearchError::InvalidInput(_)));
    }

    #[test]
    fn test_partial_record_deserializes() {
        let record: ProductRecord = serde_json::from_str(r#"{"id": 7, "price": 45.5}"#).unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.price, Some(45.5));
        assert!(record.location.is_none());
        assert!(record.listed_at.is_none());
    }

    #[test]
    fn test_enriched_product_wire_shape_is_flat() {
        let listed = Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap();
        let mut enriched = EnrichedProduct::bare(
            ProductRecord::new(3)
                .with_price(30.0)
                .with_shelf_life(14, 1, listed)
                .with_storage(StorageCondition::Refrigerated),
        );
        enriched.distance_km = Some(1.25);
        enriched.freshness_percent = Some(50.0);

        let scored = ScoredProduct {
            product: enriched,
            combined_score: 61.5,
            rank: 1,
        };
        let json = serde_json::to_value(&scored).unwrap();

        assert_eq!(json["id"], 3);
        assert_eq!(json["price"], 30.0);
        assert_eq!(json["storage_condition"], "refrigerated");
        assert_eq!(json["distance_km"], 1.25);
        assert_eq!(json["freshness_percent"], 50.0);
        assert_eq!(json["combined_score"], 61.5);
        assert_eq!(json["rank"], 1);
        assert!(json.get("is_expired").is_none());
    }
}
