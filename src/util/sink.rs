//! Discarding download destination
//!
//! [`NullSink`] stands in for a file during download runs. It accepts
//! positional writes from any number of concurrent part fetchers and keeps
//! only counters, so measured throughput carries no storage cost.

use std::sync::atomic::{AtomicU64, Ordering};

/// Write-at sink that drops the data
///
/// `written()` is the sum of all write lengths. Part fetchers of a
/// multi-part download cover disjoint ranges, so this equals the object
/// size. Overlapping writes would be counted twice; `extent()` (highest
/// offset written) is kept alongside to spot that.
#[derive(Debug, Default)]
pub struct NullSink {
    written: AtomicU64,
    extent: AtomicU64,
}

impl NullSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `buf` at `offset` and return its length
    pub fn write_at(&self, offset: u64, buf: &[u8]) -> usize {
        let len = buf.len() as u64;
        self.written.fetch_add(len, Ordering::Relaxed);
        self.extent.fetch_max(offset.saturating_add(len), Ordering::Relaxed);
        buf.len()
    }

    /// Total bytes accepted
    pub fn written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    /// One past the highest byte offset written
    pub fn extent(&self) -> u64 {
        self.extent.load(Ordering::Relaxed)
    }
}
