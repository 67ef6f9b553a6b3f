//! Shelf-life decay: how fresh a listing still is.

use crate::error::{Result, SearchError};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Freshness estimate for one listing at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Freshness {
    /// Whole days since the listing went live (never negative)
    pub days_since_listing: i64,
    /// Shelf-life days left; negative once past expiry
    pub remaining_shelf_life_days: i64,
    /// Remaining shelf life as a percentage, clamped to 0–100
    pub freshness_percent: f64,
    /// `listed_at` plus the shelf life that was left at listing time
    pub expiration_date: DateTime<Utc>,
    /// `remaining_shelf_life_days <= 0`
    pub is_expired: bool,
}

/// Estimate freshness from a product type's shelf life and how long the
/// item has already been used up.
///
/// Days since listing are whole days (partial days truncate) and are clamped
/// at zero for listings timestamped after `now`.
///
/// # Errors
/// - [`SearchError::InvalidShelfLife`] if `total_shelf_life_days <= 0`, or if
///   the expiration date falls outside the representable range
/// - [`SearchError::InvalidDaysUsed`] if `days_already_used < 0`
///
/// # Example
/// ```
/// use chrono::Utc;
/// use freshcart_search::evaluate_freshness;
///
/// let now = Utc::now();
/// let freshness = evaluate_freshness(1, 14, 1, now, now).unwrap();
/// assert!((freshness.freshness_percent - 92.857).abs() < 0.01);
/// assert!(!freshness.is_expired);
/// ```
pub fn evaluate_freshness(
    id: i64,
    total_shelf_life_days: i64,
    days_already_used: i64,
    listed_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Freshness> {
    if total_shelf_life_days <= 0 {
        return Err(SearchError::InvalidShelfLife {
            id,
            days: total_shelf_life_days,
            reason: "must be positive",
        });
    }
    if days_already_used < 0 {
        return Err(SearchError::InvalidDaysUsed {
            id,
            days: days_already_used,
        });
    }

    let days_since_listing = (now - listed_at).num_days().max(0);
    let total_days_used = days_already_used.saturating_add(days_since_listing);
    let remaining_shelf_life_days = total_shelf_life_days.saturating_sub(total_days_used);

    let freshness_percent = (remaining_shelf_life_days as f64 / total_shelf_life_days as f64
        * 100.0)
        .clamp(0.0, 100.0);

    let expiration_date = TimeDelta::try_days(total_shelf_life_days - days_already_used)
        .and_then(|left| listed_at.checked_add_signed(left))
        .ok_or(SearchError::InvalidShelfLife {
            id,
            days: total_shelf_life_days,
            reason: "puts the expiration date out of range",
        })?;

    Ok(Freshness {
        days_since_listing,
        remaining_shelf_life_days,
        freshness_percent,
        expiration_date,
        is_expired: remaining_shelf_life_days <= 0,
    })
}
