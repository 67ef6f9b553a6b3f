//! Named proximity/freshness weight pairs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative weights for the ranker's two component scores.
///
/// Weights are on the 0–1 scale and are *relative*: the ranker multiplies
/// each 0–100 component score by its weight and adds them without
/// renormalizing. Pairs that sum to 1 keep the composite in 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    /// Weight of the proximity score
    pub proximity_weight: f64,
    /// Weight of the freshness score
    pub freshness_weight: f64,
}

impl Weights {
    /// Weights used when the caller supplies none: 0.4 proximity, 0.6 freshness.
    pub const DEFAULT: Weights = Weights::new(0.4, 0.6);

    /// Create a weight pair.
    pub const fn new(proximity_weight: f64, freshness_weight: f64) -> Self {
        Self {
            proximity_weight,
            freshness_weight,
        }
    }

    /// Sum of both weights.
    pub fn total(&self) -> f64 {
        self.proximity_weight + self.freshness_weight
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Named weight presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightPreset {
    /// Same weights as an unconfigured search
    Default,
    /// Equal weight on distance and freshness
    Balanced,
    /// Nearby sellers first
    ProximityFocused,
    /// Freshest stock first
    FreshnessFocused,
}

impl WeightPreset {
    /// Canonical (kebab-case) name.
    pub fn name(self) -> &'static str {
        match self {
            WeightPreset::Default => "default",
            WeightPreset::Balanced => "balanced",
            WeightPreset::ProximityFocused => "proximity-focused",
            WeightPreset::FreshnessFocused => "freshness-focused",
        }
    }

    /// One-line description for listings.
    pub fn description(self) -> &'static str {
        match self {
            WeightPreset::Default => "Slight preference for freshness",
            WeightPreset::Balanced => "Distance and freshness count equally",
            WeightPreset::ProximityFocused => "Favor sellers close to the buyer",
            WeightPreset::FreshnessFocused => "Favor stock with the most shelf life left",
        }
    }

    /// Parse a preset name. Case-insensitive; `_` is accepted for `-`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().replace('_', "-").as_str() {
            "default" => Some(WeightPreset::Default),
            "balanced" => Some(WeightPreset::Balanced),
            "proximity-focused" | "proximity" => Some(WeightPreset::ProximityFocused),
            "freshness-focused" | "freshness" => Some(WeightPreset::FreshnessFocused),
            _ => None,
        }
    }
}

impl fmt::Display for WeightPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable preset → weights table.
///
/// Passed by reference into config resolution; [`PresetTable::STANDARD`] is
/// the table every built-in entry point uses.
#[derive(Debug, Clone, Copy)]
pub struct PresetTable {
    entries: &'static [(WeightPreset, Weights)],
}

impl PresetTable {
    /// The built-in presets.
    pub const STANDARD: PresetTable = PresetTable {
        entries: &[
            (WeightPreset::Default, Weights::DEFAULT),
            (WeightPreset::Balanced, Weights::new(0.5, 0.5)),
            (WeightPreset::ProximityFocused, Weights::new(0.7, 0.3)),
            (WeightPreset::FreshnessFocused, Weights::new(0.3, 0.7)),
        ],
    };

    /// Build a table from a static slice.
    pub const fn new(entries: &'static [(WeightPreset, Weights)]) -> Self {
        Self { entries }
    }

    /// Weights for a preset, if the table has it.
    pub fn weights(&self, preset: WeightPreset) -> Option<Weights> {
        self.entries
            .iter()
            .find(|(p, _)| *p == preset)
            .map(|(_, w)| *w)
    }

    /// Look a preset up by name.
    pub fn lookup(&self, name: &str) -> Option<(WeightPreset, Weights)> {
        let preset = WeightPreset::from_name(name)?;
        self.weights(preset).map(|w| (preset, w))
    }

    /// All entries in table order.
    pub fn iter(&self) -> impl Iterator<Item = &(WeightPreset, Weights)> {
        self.entries.iter()
    }
}

impl Default for PresetTable {
    fn default() -> Self {
        Self::STANDARD
    }
}
