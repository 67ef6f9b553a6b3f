//! In-process counters, gauges, and latency histograms.

use crate::session_id;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// Samples kept per histogram; older samples roll off.
pub const HISTOGRAM_WINDOW: usize = 1024;

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

#[derive(Debug, Default)]
struct Histogram {
    window: VecDeque<f64>,
    count: u64,
    sum: f64,
}

impl Histogram {
    fn observe(&mut self, value: f64) {
        if self.window.len() == HISTOGRAM_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(value);
        self.count += 1;
        self.sum += value;
    }

    fn summary(&self) -> HistogramSummary {
        let mut sorted: Vec<f64> = self.window.iter().copied().collect();
        sorted.sort_by(f64::total_cmp);

        HistogramSummary {
            count: self.count,
            sum: self.sum,
            min: sorted.first().copied().unwrap_or(0.0),
            max: sorted.last().copied().unwrap_or(0.0),
            mean: if self.count == 0 { 0.0 } else { self.sum / self.count as f64 },
            p50: nearest_rank(&sorted, 0.50),
            p90: nearest_rank(&sorted, 0.90),
            p99: nearest_rank(&sorted, 0.99),
        }
    }
}

fn nearest_rank(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n => sorted[((q * n as f64).ceil() as usize).clamp(1, n) - 1],
    }
}

/// Summary of one histogram.
///
/// `count`, `sum`, and `mean` cover every observation; `min`, `max`, and the
/// percentiles cover the last [`HISTOGRAM_WINDOW`] samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramSummary {
    pub count: u64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
}

/// Point-in-time copy of a registry.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub session_id: String,
    pub uptime_secs: u64,
    pub counters: BTreeMap<String, u64>,
    pub gauges: BTreeMap<String, u64>,
    pub histograms: BTreeMap<String, HistogramSummary>,
}

/// Named metrics, safe to share across threads.
#[derive(Debug)]
pub struct MetricsRegistry {
    counters: RwLock<BTreeMap<String, AtomicU64>>,
    gauges: RwLock<BTreeMap<String, AtomicU64>>,
    histograms: RwLock<BTreeMap<String, Histogram>>,
    started: Instant,
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(BTreeMap::new()),
            gauges: RwLock::new(BTreeMap::new()),
            histograms: RwLock::new(BTreeMap::new()),
            started: Instant::now(),
        }
    }

    /// Add one to a counter
    pub fn increment(&self, name: &str) {
        self.add(name, 1);
    }

    /// Add `delta` to a counter, creating it at zero first
    pub fn add(&self, name: &str, delta: u64) {
        if let Some(counter) = read(&self.counters).get(name) {
            counter.fetch_add(delta, Ordering::Relaxed);
            return;
        }
        write(&self.counters)
            .entry(name.to_owned())
            .or_default()
            .fetch_add(delta, Ordering::Relaxed);
    }

    /// Counter value; 0 if never touched
    pub fn counter(&self, name: &str) -> u64 {
        read(&self.counters)
            .get(name)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    /// Overwrite a gauge
    pub fn set_gauge(&self, name: &str, value: u64) {
        if let Some(gauge) = read(&self.gauges).get(name) {
            gauge.store(value, Ordering::Relaxed);
            return;
        }
        write(&self.gauges).insert(name.to_owned(), AtomicU64::new(value));
    }

    /// Gauge value, if ever set
    pub fn gauge(&self, name: &str) -> Option<u64> {
        read(&self.gauges).get(name).map(|g| g.load(Ordering::Relaxed))
    }

    /// Record one observation
    pub fn observe(&self, name: &str, value: f64) {
        write(&self.histograms)
            .entry(name.to_owned())
            .or_default()
            .observe(value);
    }

    /// Record a duration in milliseconds
    pub fn observe_duration(&self, name: &str, duration: Duration) {
        self.observe(name, duration.as_secs_f64() * 1000.0);
    }

    /// Summary of one histogram, if it has observations
    pub fn histogram(&self, name: &str) -> Option<HistogramSummary> {
        read(&self.histograms).get(name).map(Histogram::summary)
    }

    /// Seconds since the registry was created
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    /// Copy every metric out
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            session_id: session_id().to_owned(),
            uptime_secs: self.uptime_secs(),
            counters: read(&self.counters)
                .iter()
                .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
                .collect(),
            gauges: read(&self.gauges)
                .iter()
                .map(|(k, v)| (k.clone(), v.load(Ordering::Relaxed)))
                .collect(),
            histograms: read(&self.histograms)
                .iter()
                .map(|(k, h)| (k.clone(), h.summary()))
                .collect(),
        }
    }

    /// Snapshot as JSON
    pub fn export_json(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

/// Measures one operation and records it into the global registry as a
/// histogram in milliseconds. Records exactly once: on [`stop`](Timer::stop)
/// or, failing that, on drop.
pub struct Timer {
    name: String,
    started: Instant,
    done: bool,
}

impl Timer {
    /// Start timing `name`
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            started: Instant::now(),
            done: false,
        }
    }

    /// Record and return the elapsed time
    pub fn stop(mut self) -> Duration {
        let elapsed = self.finish();
        tracing::debug!(metric = %self.name, elapsed_ms = elapsed.as_millis() as u64, "Timer stopped");
        elapsed
    }

    fn finish(&mut self) -> Duration {
        let elapsed = self.started.elapsed();
        if !self.done {
            self.done = true;
            crate::metrics().observe_duration(&self.name, elapsed);
        }
        elapsed
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let registry = MetricsRegistry::new();
        registry.increment("requests");
        registry.increment("requests");
        registry.add("requests", 3);

        assert_eq!(registry.counter("requests"), 5);
        assert_eq!(registry.counter("never_touched"), 0);
    }

    #[test]
    fn test_gauge_overwrites() {
        let registry = MetricsRegistry::new();
        registry.set_gauge("queue", 42);
        registry.set_gauge("queue", 7);

        assert_eq!(registry.gauge("queue"), Some(7));
        assert_eq!(registry.gauge("missing"), None);
    }

    #[test]
    fn test_histogram_summary() {
        let registry = MetricsRegistry::new();
        for v in 1..=10 {
            registry.observe("latency", f64::from(v));
        }
        let summary = registry.histogram("latency").unwrap();

        assert_eq!(summary.count, 10);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 10.0);
        assert_eq!(summary.mean, 5.5);
        assert_eq!(summary.p50, 5.0);
        assert_eq!(summary.p90, 9.0);
        assert_eq!(summary.p99, 10.0);
    }

    #[test]
    fn test_histogram_window_rolls() {
        let registry = MetricsRegistry::new();
        for v in 0..(HISTOGRAM_WINDOW + 10) {
            registry.observe("size", v as f64);
        }
        let summary = registry.histogram("size").unwrap();

        assert_eq!(summary.count, (HISTOGRAM_WINDOW + 10) as u64);
        assert_eq!(summary.min, 10.0);
    }

    #[test]
    fn test_timer_records_once() {
        let name = "test.timer_records_once";
        let timer = Timer::start(name);
        std::thread::sleep(Duration::from_millis(10));
        let elapsed = timer.stop();

        assert!(elapsed >= Duration::from_millis(10));
        assert_eq!(crate::metrics().histogram(name).unwrap().count, 1);
    }

    #[test]
    fn test_snapshot_is_sorted_json() {
        let registry = MetricsRegistry::new();
        registry.increment("b");
        registry.increment("a");
        let json = registry.export_json();

        let keys: Vec<&String> = json["counters"].as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(json["session_id"], session_id());
    }
}
