//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Throughput and latency counters for operator-triggered inspection. These
// are in-core accounting primitives, not a metrics transport: the counter is
// a lock-free atomic on the hot path, and the histogram sorts a copy of its
// samples on query, which is acceptable off the matching path.
//--------------------------------------------------------------------------------------------------

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::Mutex;

/// Monotonic event counter with a wall-clock start; reports events/second
/// over the elapsed window.
#[derive(Debug)]
pub struct ThroughputCounter {
    count: AtomicU64,
    started_at: Instant,
}

impl ThroughputCounter {
    pub fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
            started_at: Instant::now(),
        }
    }

    /// Adds `count` events to the counter.
    #[inline]
    pub fn increment(&self, count: u64) {
        self.count.fetch_add(count, Ordering::Relaxed);
    }

    /// Total events counted since start.
    pub fn total(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Seconds elapsed since the counter started.
    pub fn elapsed_seconds(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }

    /// Events per second over the elapsed window; 0 until any time has
    /// passed.
    pub fn per_second(&self) -> f64 {
        let elapsed = self.elapsed_seconds();
        if elapsed > 0.0 {
            self.total() as f64 / elapsed
        } else {
            0.0
        }
    }
}

impl Default for ThroughputCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary statistics over recorded latency samples, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySummary {
    pub count: usize,
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p90: u64,
    pub p99: u64,
}

/// Append-only latency sample store. Percentiles sort a copy on query.
#[derive(Debug, Default)]
pub struct LatencyHistogram {
    samples: Mutex<Vec<u64>>,
}

impl LatencyHistogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one latency sample in nanoseconds.
    pub fn record(&self, latency_ns: u64) {
        self.samples.lock().push(latency_ns);
    }

    /// Number of recorded samples.
    pub fn count(&self) -> usize {
        self.samples.lock().len()
    }

    /// Discards all samples.
    pub fn reset(&self) {
        self.samples.lock().clear();
    }

    /// The sample at the given percentile (0.0..=1.0); 0 with no samples.
    pub fn percentile(&self, percentile: f64) -> u64 {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return 0;
        }
        let mut sorted = samples.clone();
        drop(samples);
        sorted.sort_unstable();
        let index = ((sorted.len() as f64) * percentile) as usize;
        sorted[index.min(sorted.len() - 1)]
    }

    /// Computes min/max/mean and common percentiles in one pass; None with
    /// no samples.
    pub fn summary(&self) -> Option<LatencySummary> {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return None;
        }
        let mut sorted = samples.clone();
        drop(samples);
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();
        let at = |p: f64| {
            let index = ((count as f64) * p) as usize;
            sorted[index.min(count - 1)]
        };
        Some(LatencySummary {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean: sum as f64 / count as f64,
            p50: at(0.5),
            p90: at(0.9),
            p99: at(0.99),
        })
    }
}
