//! Candidate product sources.
//!
//! A [`CandidateSource`] is the data-store seam: given the buyer's location
//! and optional filters it returns the joined product records the pipeline
//! should consider. The radius here is an optional prefilter for callers
//! that do not need rejection counts; [`ProductSearch::search_source`]
//! leaves it unset so the pipeline filter sees and counts every record.
//!
//! [`ProductSearch::search_source`]: crate::ProductSearch::search_source

use crate::error::{Result, SearchError};
use crate::model::ProductRecord;
use freshcart_geo::{Coordinate, haversine_distance};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Parameters for fetching candidates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateQuery {
    /// Buyer location
    pub buyer: Coordinate,
    /// Prefilter radius; `None` returns every location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_km: Option<f64>,
    /// Only this seller's listings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<i64>,
    /// Only this product type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_type_id: Option<i64>,
}

impl CandidateQuery {
    /// Unfiltered query around `buyer`.
    pub fn around(buyer: Coordinate) -> Self {
        Self {
            buyer,
            radius_km: None,
            seller_id: None,
            product_type_id: None,
        }
    }

    /// Restrict to a radius.
    #[must_use]
    pub fn within(mut self, radius_km: f64) -> Self {
        self.radius_km = Some(radius_km);
        self
    }

    /// Restrict to one seller.
    #[must_use]
    pub fn seller(mut self, seller_id: i64) -> Self {
        self.seller_id = Some(seller_id);
        self
    }

    /// Restrict to one product type.
    #[must_use]
    pub fn product_type(mut self, product_type_id: i64) -> Self {
        self.product_type_id = Some(product_type_id);
        self
    }

    fn matches(&self, record: &ProductRecord) -> bool {
        if self.seller_id.is_some_and(|id| record.seller_id != Some(id)) {
            return false;
        }
        if self
            .product_type_id
            .is_some_and(|id| record.product_type_id != Some(id))
        {
            return false;
        }
        match (self.radius_km, record.location) {
            (Some(radius), Some(location)) if location.is_valid() => {
                haversine_distance(&self.buyer, &location) <= radius
            }
            // Unlocated or malformed records go through; enrichment and the
            // pipeline filter decide what to do with them.
            _ => true,
        }
    }
}

/// Somewhere candidate products come from.
pub trait CandidateSource {
    /// Fetch candidates for a query.
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<ProductRecord>>;
}

/// A catalog held in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryCatalog {
    products: Vec<ProductRecord>,
}

impl InMemoryCatalog {
    /// Wrap a list of records.
    pub fn new(products: Vec<ProductRecord>) -> Self {
        Self { products }
    }

    /// Parse a JSON array of product records.
    pub fn from_json(json: &str) -> Result<Self> {
        let products: Vec<ProductRecord> = serde_json::from_str(json)?;
        Ok(Self::new(products))
    }

    /// Read a JSON array of product records from disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SearchError::Source(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// All records.
    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }
}

impl CandidateSource for InMemoryCatalog {
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<ProductRecord>> {
        let found: Vec<ProductRecord> = self
            .products
            .iter()
            .filter(|record| query.matches(record))
            .cloned()
            .collect();
        debug!(total = self.products.len(), matched = found.len(), "Catalog query");
        Ok(found)
    }
}

impl<S: CandidateSource + ?Sized> CandidateSource for &S {
    fn candidates(&self, query: &CandidateQuery) -> Result<Vec<ProductRecord>> {
        (**self).candidates(query)
    }
}
