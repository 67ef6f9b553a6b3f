//! Search configuration: defaults, lenient resolution, strict validation.
//!
//! There are two ways to turn caller input into a [`SearchConfig`]:
//!
//! - [`resolve_config`] is what the search pipeline uses. It never fails:
//!   missing or unusable values fall back to defaults and a warning is logged.
//! - [`create_config`] is a strict constructor for callers that want bad
//!   input rejected. It names the offending field in its error. The pipeline
//!   never calls it.

use crate::error::{Result, SearchError};
use crate::presets::{PresetTable, WeightPreset, Weights};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Default search radius.
pub const DEFAULT_MAX_RADIUS_KM: f64 = 10.0;

/// Default minimum freshness (no threshold).
pub const DEFAULT_MIN_FRESHNESS: f64 = 0.0;

/// Which output the pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Weighted composite score, descending, with ranks
    #[default]
    Ranking,
    /// Sorted by a single criterion
    Filter,
}

/// Sort criterion for filter mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Unit price
    Price,
    /// Distance from the buyer
    Distance,
    /// Freshness percentage
    Freshness,
    /// Composite ranking score
    #[default]
    Score,
    /// Expiration date
    Expiration,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first
    Asc,
    /// Largest first
    #[default]
    Desc,
}

macro_rules! named_enum {
    ($ty:ident, $field:literal, { $($name:literal => $variant:ident),+ $(,)? }) => {
        impl $ty {
            /// Wire name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }

            /// Case-insensitive parse of a wire name.
            pub fn from_name(name: &str) -> Option<Self> {
                match name.trim().to_lowercase().as_str() {
                    $($name => Some($ty::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = SearchError;

            fn from_str(s: &str) -> Result<Self> {
                $ty::from_name(s).ok_or_else(|| {
                    SearchError::config(
                        $field,
                        format!(
                            "unknown value `{}`, expected one of: {}",
                            s,
                            [$($name),+].join(", ")
                        ),
                    )
                })
            }
        }
    };
}

named_enum!(SearchMode, "mode", { "ranking" => Ranking, "filter" => Filter });
named_enum!(SortBy, "sort_by", {
    "price" => Price,
    "distance" => Distance,
    "freshness" => Freshness,
    "score" => Score,
    "expiration" => Expiration,
});
named_enum!(SortOrder, "sort_order", { "asc" => Asc, "desc" => Desc });

/// Fully resolved search configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Drop listings farther than this
    pub max_radius_km: f64,
    /// Relative ranking weights
    pub weights: Weights,
    /// Drop listings below this freshness percentage
    pub min_freshness_score: f64,
    /// Ranking or filter output
    pub mode: SearchMode,
    /// Filter-mode sort key
    pub sort_by: SortBy,
    /// Filter-mode sort direction
    pub sort_order: SortOrder,
    /// Preset the weights came from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_preset: Option<WeightPreset>,
    /// Drop listings whose shelf life has run out
    #[serde(default)]
    pub exclude_expired: bool,
    /// Keep at most this many results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_radius_km: DEFAULT_MAX_RADIUS_KM,
            weights: Weights::DEFAULT,
            min_freshness_score: DEFAULT_MIN_FRESHNESS,
            mode: SearchMode::Ranking,
            sort_by: SortBy::Score,
            sort_order: SortOrder::Desc,
            weight_preset: None,
            exclude_expired: false,
            limit: None,
        }
    }
}

/// Caller-supplied weights; either half may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightsInput {
    /// Weight of the proximity score
    pub proximity_weight: Option<f64>,
    /// Weight of the freshness score
    pub freshness_weight: Option<f64>,
}

/// Raw caller configuration. Every field is optional; enum-like fields are
/// kept as strings so that unknown names reach the resolver instead of
/// failing deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfigInput {
    /// Search radius in km
    pub max_radius_km: Option<f64>,
    /// Explicit weights
    pub weights: Option<WeightsInput>,
    /// Minimum freshness percentage
    pub min_freshness_score: Option<f64>,
    /// `ranking` or `filter`
    pub mode: Option<String>,
    /// `price`, `distance`, `freshness`, `score` or `expiration`
    pub sort_by: Option<String>,
    /// `asc` or `desc`
    pub sort_order: Option<String>,
    /// Preset name; overrides explicit weights
    pub weight_preset: Option<String>,
    /// Drop expired listings
    pub exclude_expired: Option<bool>,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl SearchConfigInput {
    /// Empty input: everything defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search radius.
    #[must_use]
    pub fn with_radius(mut self, km: f64) -> Self {
        self.max_radius_km = Some(km);
        self
    }

    /// Set both weights.
    #[must_use]
    pub fn with_weights(mut self, proximity: f64, freshness: f64) -> Self {
        self.weights = Some(WeightsInput {
            proximity_weight: Some(proximity),
            freshness_weight: Some(freshness),
        });
        self
    }

    /// Set the minimum freshness percentage.
    #[must_use]
    pub fn with_min_freshness(mut self, percent: f64) -> Self {
        self.min_freshness_score = Some(percent);
        self
    }

    /// Set the output mode.
    #[must_use]
    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = Some(mode.as_str().to_string());
        self
    }

    /// Set the filter-mode sort.
    #[must_use]
    pub fn with_sort(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = Some(sort_by.as_str().to_string());
        self.sort_order = Some(sort_order.as_str().to_string());
        self
    }

    /// Name a weight preset.
    #[must_use]
    pub fn with_preset(mut self, name: impl Into<String>) -> Self {
        self.weight_preset = Some(name.into());
        self
    }

    /// Toggle expired-listing exclusion.
    #[must_use]
    pub fn with_exclude_expired(mut self, exclude: bool) -> Self {
        self.exclude_expired = Some(exclude);
        self
    }

    /// Cap the number of results.
    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Overlay `other` on top of `self`: fields set in `other` win.
    #[must_use]
    pub fn merged_with(mut self, other: &SearchConfigInput) -> Self {
        if other.max_radius_km.is_some() {
            self.max_radius_km = other.max_radius_km;
        }
        if let Some(theirs) = other.weights {
            let mut ours = self.weights.unwrap_or_default();
            if theirs.proximity_weight.is_some() {
                ours.proximity_weight = theirs.proximity_weight;
            }
            if theirs.freshness_weight.is_some() {
                ours.freshness_weight = theirs.freshness_weight;
            }
            self.weights = Some(ours);
        }
        if other.min_freshness_score.is_some() {
            self.min_freshness_score = other.min_freshness_score;
        }
        if other.mode.is_some() {
            self.mode.clone_from(&other.mode);
        }
        if other.sort_by.is_some() {
            self.sort_by.clone_from(&other.sort_by);
        }
        if other.sort_order.is_some() {
            self.sort_order.clone_from(&other.sort_order);
        }
        if other.weight_preset.is_some() {
            self.weight_preset.clone_from(&other.weight_preset);
        }
        if other.exclude_expired.is_some() {
            self.exclude_expired = other.exclude_expired;
        }
        if other.limit.is_some() {
            self.limit = other.limit;
        }
        self
    }
}

impl From<&SearchConfig> for SearchConfigInput {
    fn from(config: &SearchConfig) -> Self {
        Self {
            max_radius_km: Some(config.max_radius_km),
            weights: Some(WeightsInput {
                proximity_weight: Some(config.weights.proximity_weight),
                freshness_weight: Some(config.weights.freshness_weight),
            }),
            min_freshness_score: Some(config.min_freshness_score),
            mode: Some(config.mode.as_str().to_string()),
            sort_by: Some(config.sort_by.as_str().to_string()),
            sort_order: Some(config.sort_order.as_str().to_string()),
            weight_preset: config.weight_preset.map(|p| p.name().to_string()),
            exclude_expired: Some(config.exclude_expired),
            limit: config.limit,
        }
    }
}

/// Lenient resolution against the standard preset table.
pub fn resolve_config(input: &SearchConfigInput) -> SearchConfig {
    resolve_config_with(input, &PresetTable::STANDARD)
}

/// Lenient resolution: merge `input` over the defaults.
///
/// Never fails. Missing, non-finite, or out-of-domain numbers take their
/// defaults; unknown mode/sort names take their defaults; an unknown preset
/// is ignored and the explicit (or default) weights stay. Every fallback
/// logs a warning. A known preset overrides explicit weights.
///
/// Weights above 1 are passed through unchanged; they skew the composite
/// score instead of being rejected.
pub fn resolve_config_with(input: &SearchConfigInput, presets: &PresetTable) -> SearchConfig {
    let defaults = SearchConfig::default();

    let max_radius_km = match input.max_radius_km {
        Some(km) if km.is_finite() && km > 0.0 => km,
        Some(km) => {
            warn!(value = km, "Ignoring unusable max_radius_km, using default");
            defaults.max_radius_km
        }
        None => defaults.max_radius_km,
    };

    let explicit = input.weights.unwrap_or_default();
    let mut weights = Weights::new(
        lenient_weight(
            "proximity_weight",
            explicit.proximity_weight,
            defaults.weights.proximity_weight,
        ),
        lenient_weight(
            "freshness_weight",
            explicit.freshness_weight,
            defaults.weights.freshness_weight,
        ),
    );

    let mut weight_preset = None;
    if let Some(name) = input.weight_preset.as_deref() {
        match presets.lookup(name) {
            Some((preset, preset_weights)) => {
                weights = preset_weights;
                weight_preset = Some(preset);
            }
            None => warn!(preset = name, "Unknown weight preset, keeping explicit weights"),
        }
    }

    let min_freshness_score = match input.min_freshness_score {
        Some(score) if score.is_finite() => score,
        Some(score) => {
            warn!(value = score, "Ignoring non-finite min_freshness_score, using default");
            defaults.min_freshness_score
        }
        None => defaults.min_freshness_score,
    };

    let limit = match input.limit {
        Some(0) => {
            warn!("Ignoring limit of 0");
            None
        }
        other => other,
    };

    SearchConfig {
        max_radius_km,
        weights,
        min_freshness_score,
        mode: lenient_name("mode", input.mode.as_deref(), SearchMode::from_name, defaults.mode),
        sort_by: lenient_name("sort_by", input.sort_by.as_deref(), SortBy::from_name, defaults.sort_by),
        sort_order: lenient_name(
            "sort_order",
            input.sort_order.as_deref(),
            SortOrder::from_name,
            defaults.sort_order,
        ),
        weight_preset,
        exclude_expired: input.exclude_expired.unwrap_or(defaults.exclude_expired),
        limit,
    }
}

fn lenient_weight(field: &str, value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(w) if w.is_finite() && w >= 0.0 => w,
        Some(w) => {
            warn!(field, value = w, "Ignoring unusable weight, using default");
            default
        }
        None => default,
    }
}

fn lenient_name<T: Copy>(
    field: &str,
    value: Option<&str>,
    parse: fn(&str) -> Option<T>,
    default: T,
) -> T {
    match value {
        Some(name) => parse(name).unwrap_or_else(|| {
            warn!(field, value = name, "Unknown value, using default");
            default
        }),
        None => default,
    }
}

/// Strict construction against the standard preset table.
pub fn create_config(input: &SearchConfigInput) -> Result<SearchConfig> {
    create_config_with(input, &PresetTable::STANDARD)
}

/// Strict construction: every supplied field must be in its domain.
///
/// # Errors
/// [`SearchError::ConfigValidation`] naming the first offending field:
/// `max_radius_km` (must be finite and > 0), `weights.proximity_weight` /
/// `weights.freshness_weight` (must be in 0–1), `min_freshness_score`
/// (must be in 0–100), `mode`, `sort_by`, `sort_order`, `weight_preset`
/// (must be known names), `limit` (must be ≥ 1).
pub fn create_config_with(input: &SearchConfigInput, presets: &PresetTable) -> Result<SearchConfig> {
    if let Some(km) = input.max_radius_km {
        if !km.is_finite() || km <= 0.0 {
            return Err(SearchError::config(
                "max_radius_km",
                format!("must be a positive number of kilometers, got {km}"),
            ));
        }
    }

    if let Some(weights) = input.weights {
        strict_weight("weights.proximity_weight", weights.proximity_weight)?;
        strict_weight("weights.freshness_weight", weights.freshness_weight)?;
    }

    if let Some(score) = input.min_freshness_score {
        if !(0.0..=100.0).contains(&score) {
            return Err(SearchError::config(
                "min_freshness_score",
                format!("must be between 0 and 100, got {score}"),
            ));
        }
    }

    if let Some(mode) = input.mode.as_deref() {
        mode.parse::<SearchMode>()?;
    }
    if let Some(sort_by) = input.sort_by.as_deref() {
        sort_by.parse::<SortBy>()?;
    }
    if let Some(sort_order) = input.sort_order.as_deref() {
        sort_order.parse::<SortOrder>()?;
    }

    if let Some(name) = input.weight_preset.as_deref() {
        if presets.lookup(name).is_none() {
            let known: Vec<&str> = presets.iter().map(|(p, _)| p.name()).collect();
            return Err(SearchError::config(
                "weight_preset",
                format!("unknown preset `{name}`, expected one of: {}", known.join(", ")),
            ));
        }
    }

    if input.limit == Some(0) {
        return Err(SearchError::config("limit", "must be at least 1"));
    }

    Ok(resolve_config_with(input, presets))
}

fn strict_weight(field: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(w) if !(0.0..=1.0).contains(&w) => Err(SearchError::config(
            field,
            format!("must be between 0 and 1, got {w}"),
        )),
        _ => Ok(()),
    }
}
