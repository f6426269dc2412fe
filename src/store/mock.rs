//! Mock object store for testing
//!
//! [`MockStore`] keeps object sizes in memory and never stores payloads.
//! Behaviour is scripted at construction: preloaded objects, keys whose
//! requests fail, simulated latency, and how probes answer.
//!
//! # Example
//!
//! ```
//! use objpulse::store::mock::{HeadBehavior, MockStore};
//!
//! let store = MockStore::new("bench")
//!     .with_object("obj0", 1024)
//!     .with_failing_key("obj1")
//!     .with_head_behavior(HeadBehavior::Succeed);
//! assert_eq!(store.object_size("obj0"), Some(1024));
//! ```

use super::{read_part, ObjectStore, TransferOptions};
use crate::error::StoreError;
use crate::util::deadline::Deadline;
use crate::util::sink::NullSink;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// How `head` answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadBehavior {
    /// Succeed for stored objects, `NotFound` otherwise
    Succeed,
    /// Report the deadline as already exceeded
    DeadlineExceeded,
    /// Fail with a backend error
    Fail,
}

/// Call counters for verification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub puts: usize,
    pub gets: usize,
    pub deletes: usize,
    pub heads: usize,
}

#[derive(Debug)]
struct MockState {
    objects: Mutex<HashMap<String, u64>>,
    put_options: Mutex<Vec<TransferOptions>>,
    puts: AtomicUsize,
    gets: AtomicUsize,
    deletes: AtomicUsize,
    heads: AtomicUsize,
}

/// In-memory store with scripted failures
///
/// Clones share the stored objects and counters.
#[derive(Debug, Clone)]
pub struct MockStore {
    bucket: String,
    failing: HashSet<String>,
    latency: Duration,
    head_behavior: HeadBehavior,
    state: Arc<MockState>,
}

impl MockStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            failing: HashSet::new(),
            latency: Duration::ZERO,
            head_behavior: HeadBehavior::Succeed,
            state: Arc::new(MockState {
                objects: Mutex::new(HashMap::new()),
                put_options: Mutex::new(Vec::new()),
                puts: AtomicUsize::new(0),
                gets: AtomicUsize::new(0),
                deletes: AtomicUsize::new(0),
                heads: AtomicUsize::new(0),
            }),
        }
    }

    /// Preload an object of `size` bytes
    pub fn with_object(self, key: impl Into<String>, size: u64) -> Self {
        self.objects().insert(key.into(), size);
        self
    }

    /// Make every request for `key` fail
    pub fn with_failing_key(mut self, key: impl Into<String>) -> Self {
        self.failing.insert(key.into());
        self
    }

    /// Delay every request by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_head_behavior(mut self, behavior: HeadBehavior) -> Self {
        self.head_behavior = behavior;
        self
    }

    /// Size of a stored object
    pub fn object_size(&self, key: &str) -> Option<u64> {
        self.objects().get(key).copied()
    }

    pub fn object_count(&self) -> usize {
        self.objects().len()
    }

    /// Options passed to every `put`, in call order
    pub fn put_options(&self) -> Vec<TransferOptions> {
        self.state
            .put_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn calls(&self) -> CallCounts {
        CallCounts {
            puts: self.state.puts.load(Ordering::Relaxed),
            gets: self.state.gets.load(Ordering::Relaxed),
            deletes: self.state.deletes.load(Ordering::Relaxed),
            heads: self.state.heads.load(Ordering::Relaxed),
        }
    }

    fn objects(&self) -> MutexGuard<'_, HashMap<String, u64>> {
        self.state
            .objects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn check_failing(&self, key: &str) -> Result<(), StoreError> {
        if self.failing.contains(key) {
            Err(StoreError::backend(key, "injected failure"))
        } else {
            Ok(())
        }
    }

    async fn simulate_latency(&self) {
        if self.latency.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn put(
        &self,
        key: &str,
        body: &mut (dyn Read + Send),
        opts: TransferOptions,
    ) -> Result<(), StoreError> {
        self.state.puts.fetch_add(1, Ordering::Relaxed);
        self.state
            .put_options
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(opts);
        self.simulate_latency().await;
        self.check_failing(key)?;

        let mut part = vec![0u8; opts.part_size];
        let mut size = 0u64;
        loop {
            let n = read_part(body, &mut part).map_err(|source| StoreError::Body {
                key: key.to_string(),
                source,
            })?;
            if n == 0 {
                break;
            }
            size += n as u64;
        }

        self.objects().insert(key.to_string(), size);
        Ok(())
    }

    async fn get(
        &self,
        key: &str,
        opts: TransferOptions,
        sink: &NullSink,
    ) -> Result<u64, StoreError> {
        self.state.gets.fetch_add(1, Ordering::Relaxed);
        self.simulate_latency().await;
        self.check_failing(key)?;

        let size = self
            .object_size(key)
            .ok_or_else(|| StoreError::NotFound { key: key.to_string() })?;
        if size == 0 {
            return Ok(0);
        }

        // parts land last-to-first, like a parallel downloader finishing out of order
        let part_size = opts.part_size.max(1) as u64;
        let zeros = vec![0u8; part_size.min(size) as usize];
        let parts = size.div_ceil(part_size);
        let mut written = 0u64;
        for part in (0..parts).rev() {
            let offset = part * part_size;
            let len = part_size.min(size - offset) as usize;
            written += sink.write_at(offset, &zeros[..len]) as u64;
        }
        Ok(written)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.state.deletes.fetch_add(1, Ordering::Relaxed);
        self.simulate_latency().await;
        self.check_failing(key)?;

        match self.objects().remove(key) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound { key: key.to_string() }),
        }
    }

    async fn head(&self, key: &str, deadline: &Deadline) -> Result<(), StoreError> {
        self.state.heads.fetch_add(1, Ordering::Relaxed);
        deadline
            .guard(async {
                self.simulate_latency().await;
                match self.head_behavior {
                    HeadBehavior::DeadlineExceeded => Err(StoreError::DeadlineExceeded),
                    HeadBehavior::Fail => Err(StoreError::backend(key, "injected failure")),
                    HeadBehavior::Succeed => {
                        self.check_failing(key)?;
                        if self.objects().contains_key(key) {
                            Ok(())
                        } else {
                            Err(StoreError::NotFound { key: key.to_string() })
                        }
                    }
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::buffer::{FillPattern, SyntheticReader};

    fn opts(part_size: usize) -> TransferOptions {
        TransferOptions {
            part_size,
            concurrency: 2,
        }
    }

    #[tokio::test]
    async fn test_put_records_size_and_options() {
        let store = MockStore::new("b");
        let mut body = SyntheticReader::new(10_000, 1024, FillPattern::Random);
        store.put("k", &mut body, opts(4096)).await.unwrap();

        assert_eq!(store.object_size("k"), Some(10_000));
        assert_eq!(store.put_options(), vec![opts(4096)]);
        assert_eq!(store.calls().puts, 1);
    }

    #[tokio::test]
    async fn test_get_writes_every_part() {
        let store = MockStore::new("b").with_object("k", 10_000);
        let sink = NullSink::new();
        let n = store.get("k", opts(4096), &sink).await.unwrap();

        assert_eq!(n, 10_000);
        assert_eq!(sink.written(), 10_000);
        assert_eq!(sink.extent(), 10_000);
    }

    #[tokio::test]
    async fn test_get_missing_object() {
        let store = MockStore::new("b");
        let sink = NullSink::new();
        let err = store.get("nope", opts(4096), &sink).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_failing_key() {
        let store = MockStore::new("b").with_failing_key("bad");
        let mut body = SyntheticReader::new(100, 10, FillPattern::Zeros);
        let err = store.put("bad", &mut body, opts(64)).await.unwrap_err();
        assert!(matches!(err, StoreError::Backend { .. }));
        assert_eq!(store.object_count(), 0);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MockStore::new("b").with_object("k", 1);
        store.delete("k").await.unwrap();
        assert_eq!(store.object_count(), 0);
        assert!(store.delete("k").await.is_err());
        assert_eq!(store.calls().deletes, 2);
    }

    #[tokio::test]
    async fn test_head_behaviors() {
        let (deadline, _cancel) = Deadline::after(Duration::from_secs(60));

        let store = MockStore::new("b").with_object("k", 1);
        assert!(store.head("k", &deadline).await.is_ok());
        assert!(matches!(
            store.head("missing", &deadline).await,
            Err(StoreError::NotFound { .. })
        ));

        let store = MockStore::new("b")
            .with_object("k", 1)
            .with_head_behavior(HeadBehavior::DeadlineExceeded);
        assert!(matches!(
            store.head("k", &deadline).await,
            Err(StoreError::DeadlineExceeded)
        ));

        let store = MockStore::new("b").with_head_behavior(HeadBehavior::Fail);
        let err = store.head("k", &deadline).await.unwrap_err();
        assert!(!err.is_termination());
    }
}
