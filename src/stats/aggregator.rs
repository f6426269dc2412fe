//! Result aggregation
//!
//! Folds per-worker records into [`RunTotals`]. Failed workers are counted
//! as workers but add nothing to the total, so the total always equals the
//! sum over successful workers.
//!
//! # Example
//!
//! ```
//! use objpulse::stats::{aggregator, TransferResult};
//! use std::time::Duration;
//!
//! let results = vec![
//!     TransferResult::succeeded(0, "0".into(), Duration::from_secs(1), 4096),
//!     TransferResult::succeeded(1, "1".into(), Duration::from_secs(1), 8192),
//! ];
//! let totals = aggregator::transfer_totals(&results, Duration::from_secs(1));
//! assert_eq!(totals.total, 12288);
//! ```

use super::histogram::LatencyHistogram;
use super::{QueryCount, RunTotals, TransferResult};
use crate::Result;
use std::time::Duration;

/// Totals of a transfer run measured over `elapsed`
pub fn transfer_totals(results: &[TransferResult], elapsed: Duration) -> RunTotals {
    let (failed, total) = results.iter().fold((0, 0u64), |(failed, total), r| {
        if r.is_ok() {
            (failed, total + r.bytes)
        } else {
            (failed + 1, total)
        }
    });

    RunTotals {
        workers: results.len(),
        failed,
        total,
        elapsed,
    }
}

/// Totals of a query run measured over `elapsed`
pub fn query_totals(counts: &[QueryCount], elapsed: Duration) -> RunTotals {
    RunTotals {
        workers: counts.len(),
        failed: 0,
        total: counts.iter().map(|c| c.requests).sum(),
        elapsed,
    }
}

/// Merge every worker's probe latencies into one histogram
pub fn merge_latency(counts: &[QueryCount]) -> Result<LatencyHistogram> {
    let mut merged = LatencyHistogram::new();
    for count in counts {
        merged.merge(&count.latency)?;
    }
    Ok(merged)
}
