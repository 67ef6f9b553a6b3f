//! Rate-gated, cached geocoding.
//!
//! Address lookups go through an external provider that allows at most one
//! request per second. [`CachedGeocoder`] puts a TTL cache in front of any
//! [`Geocoder`] and funnels every outbound call through a single [`RateGate`],
//! so concurrent callers queue behind each other instead of tripping the
//! provider's limit.
//!
//! # Example
//!
//! ```no_run
//! use freshcart_geo::{CachedGeocoder, Coordinate, Geocoder};
//!
//! async fn locate<G: Geocoder>(provider: G) -> freshcart_geo::Result<Option<Coordinate>> {
//!     let geocoder = CachedGeocoder::new(provider);
//!     // Second lookup is served from the cache without touching the gate.
//!     geocoder.geocode("Quiapo, Manila").await?;
//!     geocoder.geocode("Quiapo, Manila").await
//! }
//! ```

use crate::{Coordinate, GeoError, Result};
use std::collections::HashMap;
use std::future::Future;
use std::sync::RwLock;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Minimum spacing between outbound provider calls.
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// How long lookups stay cached (7 days).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Entries kept per cache before the oldest is evicted.
pub const DEFAULT_CACHE_CAPACITY: usize = 10_000;

/// Address ↔ coordinate translation.
pub trait Geocoder: Send + Sync {
    /// Resolves an address to a coordinate. `Ok(None)` means "no match".
    fn geocode(&self, address: &str) -> impl Future<Output = Result<Option<Coordinate>>> + Send;

    /// Resolves a coordinate to a display address. `Ok(None)` means "no match".
    fn reverse(&self, coordinate: Coordinate) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Serializes callers so that consecutive releases are at least
/// `min_interval` apart.
///
/// The gate is a single token: the mutex is held while waiting, and tokio's
/// mutex is fair, so callers are released in arrival order.
#[derive(Debug)]
pub struct RateGate {
    min_interval: Duration,
    last_release: Mutex<Option<Instant>>,
}

impl RateGate {
    /// Create a gate with the given minimum spacing.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_release: Mutex::new(None),
        }
    }

    /// Minimum spacing enforced by this gate.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for the next slot. Returns how long this caller slept.
    pub async fn acquire(&self) -> Duration {
        let mut last = self.last_release.lock().await;
        let mut waited = Duration::ZERO;

        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            let now = Instant::now();
            if ready_at > now {
                waited = ready_at - now;
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last = Some(Instant::now());
        waited
    }
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: std::time::Instant,
}

/// In-memory TTL cache keyed by normalized lookup strings.
///
/// Bounded: inserting a new key into a full cache first drops expired
/// entries, then the entry closest to expiry.
#[derive(Debug)]
pub struct GeocodeCache<V> {
    ttl: Duration,
    capacity: usize,
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> GeocodeCache<V> {
    /// Create an empty cache whose entries live for `ttl`, holding at most
    /// [`DEFAULT_CACHE_CAPACITY`] entries.
    pub fn new(ttl: Duration) -> Self {
        Self::with_capacity(ttl, DEFAULT_CACHE_CAPACITY)
    }

    /// Create an empty cache holding at most `capacity` entries (minimum 1).
    pub fn with_capacity(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Get a live entry. Expired entries are evicted on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(key) {
                Some(entry) if entry.expires_at > std::time::Instant::now() => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries
            .get(key)
            .is_some_and(|entry| entry.expires_at <= std::time::Instant::now())
        {
            entries.remove(key);
        }
        None
    }

    /// Insert or replace an entry.
    pub fn insert(&self, key: impl Into<String>, value: V) {
        let entry = CacheEntry {
            value,
            expires_at: std::time::Instant::now() + self.ttl,
        };
        let key = key.into();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());

        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            let now = std::time::Instant::now();
            entries.retain(|_, entry| entry.expires_at > now);

            if entries.len() >= self.capacity {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, entry)| entry.expires_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    debug!(key = %oldest, "Geocode cache full, evicting");
                    entries.remove(&oldest);
                }
            }
        }

        entries.insert(key, entry);
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge(&self) -> usize {
        let now = std::time::Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of stored entries, including ones not yet purged.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A [`Geocoder`] wrapper adding caching and rate limiting.
pub struct CachedGeocoder<G> {
    inner: G,
    gate: RateGate,
    forward: GeocodeCache<Option<Coordinate>>,
    reverse: GeocodeCache<Option<String>>,
}

impl<G: Geocoder> CachedGeocoder<G> {
    /// Wrap a provider with the default 1 s spacing and 7-day TTL.
    pub fn new(inner: G) -> Self {
        Self::with_limits(inner, DEFAULT_MIN_INTERVAL, DEFAULT_CACHE_TTL)
    }

    /// Wrap a provider with explicit spacing and TTL.
    pub fn with_limits(inner: G, min_interval: Duration, ttl: Duration) -> Self {
        Self {
            inner,
            gate: RateGate::new(min_interval),
            forward: GeocodeCache::new(ttl),
            reverse: GeocodeCache::new(ttl),
        }
    }

    /// The wrapped provider.
    pub fn inner(&self) -> &G {
        &self.inner
    }

    /// Drop expired entries from both caches.
    pub fn purge_expired(&self) -> usize {
        self.forward.purge() + self.reverse.purge()
    }
}

impl<G: Geocoder> Geocoder for CachedGeocoder<G> {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>> {
        let key = address_key(address)?;
        if let Some(hit) = self.forward.get(&key) {
            debug!(address = %key, "Geocode cache hit");
            return Ok(hit);
        }

        let waited = self.gate.acquire().await;
        // Another caller may have filled the entry while we queued.
        if let Some(hit) = self.forward.get(&key) {
            return Ok(hit);
        }

        debug!(address = %key, waited_ms = waited.as_millis() as u64, "Geocode provider call");
        let result = self.inner.geocode(address.trim()).await?;
        if let Some(coord) = result {
            if !coord.is_valid() {
                return Err(GeoError::Provider(format!(
                    "provider returned out-of-range coordinate ({}, {})",
                    coord.latitude, coord.longitude
                )));
            }
        }

        self.forward.insert(key, result);
        Ok(result)
    }

    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>> {
        coordinate.validate()?;
        let key = coordinate_key(&coordinate);
        if let Some(hit) = self.reverse.get(&key) {
            debug!(coordinate = %key, "Reverse geocode cache hit");
            return Ok(hit);
        }

        self.gate.acquire().await;
        if let Some(hit) = self.reverse.get(&key) {
            return Ok(hit);
        }

        let result = self.inner.reverse(coordinate).await?;
        self.reverse.insert(key, result.clone());
        Ok(result)
    }
}

/// Normalized cache key for an address: trimmed, lowercased, single-spaced.
fn address_key(address: &str) -> Result<String> {
    let key = address
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if key.is_empty() {
        return Err(GeoError::InvalidAddress("address is empty".into()));
    }
    Ok(key)
}

/// Cache key for a coordinate, rounded to ~0.1 m.
fn coordinate_key(coordinate: &Coordinate) -> String {
    format!("{:.6},{:.6}", coordinate.latitude, coordinate.longitude)
}
