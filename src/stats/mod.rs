//! Per-worker results and run totals
//!
//! Every worker produces exactly one record: a [`TransferResult`] for
//! upload/download workers or a [`QueryCount`] for probe workers. Records
//! are owned by their worker until the coordinator collects them after the
//! barrier; [`aggregator`] then folds them into [`RunTotals`].

pub mod aggregator;
pub mod histogram;

use crate::error::WorkerError;
use crate::util::time::{ceil_rate, mib_per_sec};
use histogram::LatencyHistogram;
use std::time::Duration;

/// Outcome of one object transfer
#[derive(Debug)]
pub struct TransferResult {
    /// Worker index, also the object key suffix
    pub index: usize,
    pub key: String,
    pub elapsed: Duration,
    /// Bytes moved; always 0 for a failed transfer
    pub bytes: u64,
    pub error: Option<WorkerError>,
}

impl TransferResult {
    pub fn succeeded(index: usize, key: String, elapsed: Duration, bytes: u64) -> Self {
        Self {
            index,
            key,
            elapsed,
            bytes,
            error: None,
        }
    }

    pub fn failed(index: usize, key: String, elapsed: Duration, error: WorkerError) -> Self {
        Self {
            index,
            key,
            elapsed,
            bytes: 0,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// This worker's own throughput in MB/s
    pub fn mib_per_sec(&self) -> u64 {
        mib_per_sec(self.bytes, self.elapsed)
    }
}

/// Completed probes of one query worker
#[derive(Debug, Clone, Default)]
pub struct QueryCount {
    pub index: usize,
    pub key: String,
    pub requests: u64,
    pub latency: LatencyHistogram,
}

impl QueryCount {
    pub fn new(index: usize, key: impl Into<String>) -> Self {
        Self {
            index,
            key: key.into(),
            requests: 0,
            latency: LatencyHistogram::new(),
        }
    }

    /// Count one successful probe
    pub fn record(&mut self, latency: Duration) {
        self.requests += 1;
        self.latency.record(latency);
    }
}

/// Totals derived once after the barrier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunTotals {
    /// Workers reported, failed ones included
    pub workers: usize,
    pub failed: usize,
    /// Bytes (transfers) or requests (queries) from successful workers
    pub total: u64,
    /// Wall clock from first dispatch to last completion
    pub elapsed: Duration,
}

impl RunTotals {
    /// Aggregate transfer throughput in MB/s
    pub fn mib_per_sec(&self) -> u64 {
        mib_per_sec(self.total, self.elapsed)
    }

    /// Aggregate request rate in req/s
    pub fn per_sec(&self) -> u64 {
        ceil_rate(self.total, self.elapsed)
    }
}
