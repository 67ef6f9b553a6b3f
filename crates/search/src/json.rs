//! Dynamic JSON entry point.
//!
//! Request shape:
//!
//! ```json
//! {
//!   "buyer": { "latitude": 14.5995, "longitude": 120.9842, "storage_capability": "frozen" },
//!   "products": [ { "id": 1, "price": 45.0, "location": { "latitude": 14.6, "longitude": 120.98 } } ],
//!   "config": { "mode": "filter", "sort_by": "price", "sort_order": "asc" }
//! }
//! ```
//!
//! `storage_capability` and `config` are optional. The response is the
//! serialized [`SearchResult`](crate::SearchResult).

use crate::config::SearchConfigInput;
use crate::error::{Result, SearchError};
use crate::model::{BuyerContext, ProductRecord, StorageCondition};
use crate::search::ProductSearch;
use serde::Deserialize;
use serde_json::Value;

impl ProductSearch {
    /// Run a search described by a JSON request.
    pub fn search_json(&self, request: &Value) -> Result<Value> {
        let buyer = parse_buyer(request)?;
        let products = parse_products(request)?;
        let config = parse_config(request)?;

        let result = self.search(&buyer, &products, config.as_ref())?;
        Ok(serde_json::to_value(&result)?)
    }
}

/// [`ProductSearch::search_json`] with default settings.
pub fn search_json(request: &Value) -> Result<Value> {
    ProductSearch::new().search_json(request)
}

fn parse_buyer(request: &Value) -> Result<BuyerContext> {
    let buyer = request
        .get("buyer")
        .filter(|b| b.is_object())
        .ok_or_else(|| SearchError::InvalidInput("`buyer` must be an object".into()))?;

    let coordinate = |field: &str| {
        buyer.get(field).and_then(Value::as_f64).ok_or_else(|| {
            SearchError::InvalidInput(format!("`buyer.{field}` must be a number"))
        })
    };
    let mut context = BuyerContext::new(coordinate("latitude")?, coordinate("longitude")?);

    match buyer.get("storage_capability") {
        None | Some(Value::Null) => {}
        Some(Value::String(name)) => {
            context = context.with_storage(name.parse::<StorageCondition>()?);
        }
        Some(_) => {
            return Err(SearchError::InvalidInput(
                "`buyer.storage_capability` must be a string".into(),
            ));
        }
    }

    Ok(context)
}

fn parse_products(request: &Value) -> Result<Vec<ProductRecord>> {
    let items = request
        .get("products")
        .and_then(Value::as_array)
        .ok_or_else(|| SearchError::InvalidInput("`products` must be an array".into()))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            ProductRecord::deserialize(item)
                .map_err(|e| SearchError::InvalidInput(format!("`products[{index}]`: {e}")))
        })
        .collect()
}

fn parse_config(request: &Value) -> Result<Option<SearchConfigInput>> {
    match request.get("config") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => SearchConfigInput::deserialize(value)
            .map(Some)
            .map_err(|e| SearchError::InvalidInput(format!("`config`: {e}"))),
    }
}
