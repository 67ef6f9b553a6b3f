//! WASM bindings for the search pipeline.

use wasm_bindgen::prelude::*;

/// Run a search from a JSON request string.
///
/// # Arguments
/// * `request_json` - `{ "buyer": {...}, "products": [...], "config": {...} }`
///
/// # Returns
/// The serialized search result, or an error string for malformed input
#[wasm_bindgen]
pub fn search_products(request_json: &str) -> Result<String, JsValue> {
    let request: serde_json::Value =
        serde_json::from_str(request_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let response = crate::search_json(&request).map_err(|e| JsValue::from_str(&e.to_string()))?;
    serde_json::to_string(&response).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Great-circle distance in kilometers between two points.
#[wasm_bindgen]
pub fn distance_km(from_lat: f64, from_lng: f64, to_lat: f64, to_lng: f64) -> f64 {
    freshcart_geo::haversine_distance(
        &freshcart_geo::Coordinate::new(from_lat, from_lng),
        &freshcart_geo::Coordinate::new(to_lat, to_lng),
    )
}

/// Weight presets as a JSON array of `{ name, proximity_weight, freshness_weight }`.
#[wasm_bindgen]
pub fn weight_presets() -> String {
    let presets: Vec<serde_json::Value> = crate::PresetTable::STANDARD
        .iter()
        .map(|(preset, weights)| {
            serde_json::json!({
                "name": preset.name(),
                "proximity_weight": weights.proximity_weight,
                "freshness_weight": weights.freshness_weight,
            })
        })
        .collect();
    serde_json::Value::Array(presets).to_string()
}
