//! Probe latency histogram using HdrHistogram
//!
//! Each query worker owns one [`LatencyHistogram`] and records the latency
//! of every successful probe. After the barrier the coordinator merges them
//! into a single run-wide histogram.
//!
//! # Example
//!
//! ```
//! use objpulse::stats::histogram::LatencyHistogram;
//! use std::time::Duration;
//!
//! let mut hist = LatencyHistogram::new();
//! hist.record(Duration::from_micros(100));
//! hist.record(Duration::from_micros(300));
//!
//! let summary = hist.summary().unwrap();
//! assert_eq!(summary.count, 2);
//! ```

use crate::Result;
use hdrhistogram::Histogram;
use serde::Serialize;
use std::time::Duration;

/// Largest trackable value: one hour in nanoseconds
const MAX_NANOS: u64 = 3_600_000_000_000;

/// Probe latencies, 1ns to 1 hour, 3 significant digits
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    histogram: Histogram<u64>,
}

/// Point-in-time digest of a histogram, in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencySummary {
    pub count: u64,
    pub min_us: f64,
    pub mean_us: f64,
    pub p50_us: f64,
    pub p99_us: f64,
    pub max_us: f64,
}

fn micros(nanos: u64) -> f64 {
    nanos as f64 / 1_000.0
}

impl LatencyHistogram {
    pub fn new() -> Self {
        let histogram = Histogram::new_with_bounds(1, MAX_NANOS, 3)
            .expect("Failed to create histogram with valid bounds");
        Self { histogram }
    }

    /// Record one latency sample, clamped to the trackable range
    #[inline]
    pub fn record(&mut self, latency: Duration) {
        let nanos = u64::try_from(latency.as_nanos()).unwrap_or(MAX_NANOS);
        // in range after the clamp, so recording cannot fail
        let recorded = self.histogram.record(nanos.clamp(1, MAX_NANOS));
        debug_assert!(recorded.is_ok());
    }

    /// Latency at `percentile` (0.0 - 100.0), or None when empty
    pub fn percentile(&self, percentile: f64) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.value_at_percentile(percentile)))
    }

    pub fn min(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.min()))
    }

    pub fn max(&self) -> Option<Duration> {
        if self.is_empty() {
            return None;
        }
        Some(Duration::from_nanos(self.histogram.max()))
    }

    pub fn len(&self) -> u64 {
        self.histogram.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histogram.len() == 0
    }

    /// Fold another worker's samples into this histogram
    pub fn merge(&mut self, other: &LatencyHistogram) -> Result<()> {
        self.histogram
            .add(&other.histogram)
            .map_err(|e| anyhow::anyhow!("Failed to merge histograms: {}", e))?;
        Ok(())
    }

    /// Digest for reports, or None when no sample was recorded
    pub fn summary(&self) -> Option<LatencySummary> {
        if self.is_empty() {
            return None;
        }
        let h = &self.histogram;
        Some(LatencySummary {
            count: h.len(),
            min_us: micros(h.min()),
            mean_us: h.mean() / 1_000.0,
            p50_us: micros(h.value_at_percentile(50.0)),
            p99_us: micros(h.value_at_percentile(99.0)),
            max_us: micros(h.max()),
        })
    }
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let hist = LatencyHistogram::new();
        assert!(hist.is_empty());
        assert!(hist.percentile(50.0).is_none());
        assert!(hist.min().is_none());
        assert!(hist.summary().is_none());
    }

    #[test]
    fn test_percentiles() {
        let mut hist = LatencyHistogram::new();
        for i in 1..=100 {
            hist.record(Duration::from_micros(i * 10));
        }
        assert_eq!(hist.len(), 100);

        let p50 = hist.percentile(50.0).unwrap();
        let p99 = hist.percentile(99.0).unwrap();
        assert!(p50.as_micros() >= 450 && p50.as_micros() <= 550);
        assert!(p99.as_micros() >= 940 && p99.as_micros() <= 1040);

        let min = hist.min().unwrap();
        let max = hist.max().unwrap();
        assert!(min.as_micros() >= 9 && min.as_micros() <= 11);
        assert!(max.as_micros() >= 995 && max.as_micros() <= 1005);
    }

    #[test]
    fn test_clamps_out_of_range() {
        let mut hist = LatencyHistogram::new();
        hist.record(Duration::ZERO);
        hist.record(Duration::from_secs(2 * 3600));
        assert_eq!(hist.len(), 2);
        // max reports the bucket's highest equivalent value, ~0.1% above the clamp
        let max = hist.max().unwrap();
        assert!(max >= Duration::from_secs(3599), "max = {:?}", max);
        assert!(max < Duration::from_secs(3605), "max = {:?}", max);
        let min = hist.min().unwrap();
        assert!(min <= Duration::from_nanos(1));
    }

    #[test]
    fn test_merge() {
        let mut a = LatencyHistogram::new();
        a.record(Duration::from_micros(100));
        let mut b = LatencyHistogram::new();
        b.record(Duration::from_micros(200));
        b.record(Duration::from_micros(300));

        a.merge(&b).unwrap();
        assert_eq!(a.len(), 3);
        let max = a.max().unwrap();
        assert!(max.as_micros() >= 299 && max.as_micros() <= 301);
    }

    #[test]
    fn test_summary_units() {
        let mut hist = LatencyHistogram::new();
        hist.record(Duration::from_millis(2));
        let summary = hist.summary().unwrap();
        assert_eq!(summary.count, 1);
        assert!((summary.min_us - 2000.0).abs() < 2.0);
        assert!((summary.max_us - 2000.0).abs() < 2.0);
    }
}
