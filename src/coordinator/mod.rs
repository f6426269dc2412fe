//! Coordinator module
//!
//! Orchestrates one benchmark run: fans out one task per object (transfers)
//! or per concurrency slot (queries), waits for all of them at a single
//! barrier, then aggregates. Fan-out is unbounded; throttling, if any, is
//! left to the store client.
//!
//! Transfer failures stay in their worker's result. A query failure other
//! than the deadline firing is fatal for the whole run: the coordinator
//! cancels the sibling probe loops and returns the error.

use crate::config::{RunConfig, RunMode};
use crate::error::WorkerError;
use crate::stats::aggregator;
use crate::stats::histogram::LatencyHistogram;
use crate::stats::{QueryCount, RunTotals, TransferResult};
use crate::store::ObjectStore;
use crate::util::deadline::Deadline;
use crate::worker::{self, query};
use crate::Result;
use anyhow::Context;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Results of an upload or download run
#[derive(Debug)]
pub struct TransferReport {
    pub mode: RunMode,
    pub started_at: DateTime<Utc>,
    /// One entry per object, in index order
    pub results: Vec<TransferResult>,
    pub totals: RunTotals,
}

/// Results of a query run
#[derive(Debug)]
pub struct QueryReport {
    pub started_at: DateTime<Utc>,
    /// One entry per probe worker, in index order
    pub counts: Vec<QueryCount>,
    pub totals: RunTotals,
    /// All workers' probe latencies merged
    pub latency: LatencyHistogram,
    /// The run was stopped by an interrupt before its deadline
    pub interrupted: bool,
}

#[derive(Debug)]
pub enum RunReport {
    Transfer(TransferReport),
    Query(QueryReport),
}

/// Outcome of deleting the benchmark objects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub deleted: usize,
    pub failed: usize,
}

/// Runs one benchmark against one store
pub struct Coordinator {
    config: Arc<RunConfig>,
    store: Arc<dyn ObjectStore>,
}

impl Coordinator {
    pub fn new(config: RunConfig, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// Run the configured mode to completion
    ///
    /// Query runs also stop early on Ctrl-C.
    pub async fn run(&self) -> Result<RunReport> {
        match self.config.mode {
            RunMode::Upload | RunMode::Download => {
                Ok(RunReport::Transfer(self.run_transfers().await))
            }
            RunMode::Query => {
                let interrupt = async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                };
                Ok(RunReport::Query(self.run_query_until(interrupt).await?))
            }
        }
    }

    /// Transfer every object in parallel and wait for all of them
    pub async fn run_transfers(&self) -> TransferReport {
        let mode = self.config.mode;
        info!(mode = %mode, objects = self.config.files, "starting transfer run");

        let started_at = Utc::now();
        let start = Instant::now();

        let handles: Vec<_> = (0..self.config.files)
            .map(|index| {
                let store = Arc::clone(&self.store);
                let config = Arc::clone(&self.config);
                tokio::spawn(async move {
                    match config.mode {
                        RunMode::Upload => worker::upload_object(store.as_ref(), &config, index).await,
                        _ => worker::download_object(store.as_ref(), &config, index).await,
                    }
                })
            })
            .collect();

        let joined = join_all(handles).await;
        let elapsed = start.elapsed();

        let results: Vec<TransferResult> = joined
            .into_iter()
            .enumerate()
            .map(|(index, res)| {
                res.unwrap_or_else(|e| {
                    error!(worker = index, error = %e, "transfer worker panicked");
                    TransferResult::failed(
                        index,
                        self.config.object_key(index),
                        Duration::ZERO,
                        WorkerError::Join(e),
                    )
                })
            })
            .collect();

        let totals = aggregator::transfer_totals(&results, elapsed);
        info!(
            bytes = totals.total,
            failed = totals.failed,
            elapsed = ?elapsed,
            "transfer run finished"
        );

        TransferReport {
            mode,
            started_at,
            results,
            totals,
        }
    }

    /// Probe until the run duration elapses or `interrupt` completes
    ///
    /// One deadline is created here and shared by every probe worker.
    pub async fn run_query_until<I>(&self, interrupt: I) -> Result<QueryReport>
    where
        I: Future<Output = ()> + Send + 'static,
    {
        let workers = self.config.concurrency;
        info!(workers, duration = ?self.config.duration, "starting query run");

        let started_at = Utc::now();
        let start = Instant::now();
        let (deadline, cancel) = Deadline::after(self.config.duration);

        let watcher = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                interrupt.await;
                info!("interrupted, stopping probes");
                cancel.cancel();
            }
        });

        let handles: Vec<_> = (0..workers)
            .map(|index| {
                let store = Arc::clone(&self.store);
                let config = Arc::clone(&self.config);
                let deadline = deadline.clone();
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    let key = config.object_key(index);
                    let res = query::probe_loop(store.as_ref(), index, &key, &deadline).await;
                    if let Err(e) = &res {
                        error!(worker = index, key = %key, error = %e, "probe failed, cancelling run");
                        cancel.cancel();
                    }
                    res.with_context(|| {
                        format!("get object ({}/{}) headers", store.bucket(), key)
                    })
                })
            })
            .collect();

        let joined = join_all(handles).await;
        let elapsed = start.elapsed();
        watcher.abort();

        let interrupted = deadline.is_cancelled();
        let mut counts = Vec::with_capacity(joined.len());
        for res in joined {
            counts.push(res.context("query worker panicked")??);
        }

        let totals = aggregator::query_totals(&counts, elapsed);
        let latency = aggregator::merge_latency(&counts)?;
        info!(requests = totals.total, elapsed = ?elapsed, "query run finished");

        Ok(QueryReport {
            started_at,
            counts,
            totals,
            latency,
            interrupted,
        })
    }

    /// Delete every benchmark object, one at a time
    ///
    /// Failures are reported and skipped; they never abort the remaining
    /// deletions.
    pub async fn cleanup(&self) -> CleanupReport {
        let mut report = CleanupReport::default();
        let bucket = self.store.bucket();

        for index in 0..self.config.files {
            let key = self.config.object_key(index);
            match self.store.delete(&key).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    warn!(bucket, key = %key, error = %e, "delete failed");
                    eprintln!("delete {}/{}: {}", bucket, key, e);
                    report.failed += 1;
                }
            }
        }

        info!(deleted = report.deleted, failed = report.failed, "cleanup finished");
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::backend::OpendalStore;
    use crate::store::mock::{HeadBehavior, MockStore};
    use crate::util::time::MIB;

    fn coordinator(config: RunConfig, store: &MockStore) -> Coordinator {
        Coordinator::new(config, Arc::new(store.clone()))
    }

    fn query_config(concurrency: usize, duration: Duration) -> RunConfig {
        let mut config = RunConfig::new(RunMode::Query, "bench");
        config.concurrency = concurrency;
        config.duration = duration;
        config
    }

    #[tokio::test]
    async fn test_upload_three_objects() {
        let store = MockStore::new("bench");
        let mut config = RunConfig::new(RunMode::Upload, "bench");
        config.files = 3;
        config.object_size = 10 * MIB;
        config.chunk_size = 5 * MIB;
        config.concurrency = 2;

        let report = coordinator(config, &store).run_transfers().await;

        assert_eq!(report.mode, RunMode::Upload);
        assert_eq!(report.results.len(), 3);
        for (i, result) in report.results.iter().enumerate() {
            assert!(result.is_ok());
            assert_eq!(result.index, i);
            assert_eq!(result.bytes, 10485760);
        }
        assert_eq!(report.totals.total, 31457280);
        assert_eq!(report.totals.workers, 3);
        assert_eq!(store.object_count(), 3);
        assert_eq!(store.calls().puts, 3);
    }

    #[tokio::test]
    async fn test_download_single_object() {
        let store = MockStore::new("bench").with_object("0", 100 * MIB);
        let mut config = RunConfig::new(RunMode::Download, "bench");
        config.chunk_size = 5 * MIB;

        let report = coordinator(config, &store).run_transfers().await;

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].bytes, 104857600);
        assert_eq!(report.totals.total, 104857600);
    }

    #[tokio::test]
    async fn test_failed_object_contributes_zero() {
        let store = MockStore::new("bench")
            .with_object("obj0", 1000)
            .with_object("obj1", 2000)
            .with_object("obj2", 3000)
            .with_failing_key("obj1");
        let mut config = RunConfig::new(RunMode::Download, "bench");
        config.files = 3;
        config.prefix = "obj".into();
        config.chunk_size = 512;

        let report = coordinator(config, &store).run_transfers().await;

        assert!(report.results[0].is_ok());
        assert!(!report.results[1].is_ok());
        assert!(report.results[2].is_ok());
        assert_eq!(report.totals.total, 4000);
        assert_eq!(report.totals.failed, 1);
        assert_eq!(report.totals.workers, 3);
    }

    #[tokio::test]
    async fn test_query_immediate_deadline() {
        let store = MockStore::new("bench").with_head_behavior(HeadBehavior::DeadlineExceeded);
        let config = query_config(4, Duration::from_secs(1));

        let report = coordinator(config, &store)
            .run_query_until(std::future::pending())
            .await
            .unwrap();

        assert_eq!(report.counts.len(), 4);
        assert_eq!(report.totals.total, 0);
        assert!(report.latency.is_empty());
        assert!(!report.interrupted);
    }

    #[tokio::test]
    async fn test_query_bounded_by_latency() {
        let store = MockStore::new("bench")
            .with_object("0", 1)
            .with_object("1", 1)
            .with_latency(Duration::from_millis(10));
        let config = query_config(2, Duration::from_millis(200));

        let report = coordinator(config, &store)
            .run_query_until(std::future::pending())
            .await
            .unwrap();

        let total: u64 = report.counts.iter().map(|c| c.requests).sum();
        assert_eq!(report.totals.total, total);
        assert!(total >= 2);
        assert!(total <= 2 * 20, "got {} requests", total);
        assert_eq!(report.latency.len(), total);
        assert!(report.totals.elapsed >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_query_fatal_error() {
        let store = MockStore::new("bench")
            .with_object("0", 1)
            .with_object("1", 1)
            .with_failing_key("1")
            .with_latency(Duration::from_millis(1));
        let config = query_config(2, Duration::from_secs(30));

        let start = Instant::now();
        let err = coordinator(config, &store)
            .run_query_until(std::future::pending())
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("get object (bench/1) headers"));
        // the healthy sibling was cancelled instead of running out the clock
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_query_interrupt() {
        let store = MockStore::new("bench")
            .with_object("0", 1)
            .with_latency(Duration::from_millis(1));
        let config = query_config(1, Duration::from_secs(30));

        let report = coordinator(config, &store)
            .run_query_until(tokio::time::sleep(Duration::from_millis(50)))
            .await
            .unwrap();

        assert!(report.interrupted);
        assert!(report.totals.total >= 1);
        assert!(report.totals.elapsed < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_cleanup_continues_past_failures() {
        let store = MockStore::new("bench")
            .with_object("0", 1)
            .with_object("1", 1)
            .with_object("2", 1)
            .with_failing_key("1");
        let mut config = RunConfig::new(RunMode::Upload, "bench");
        config.files = 4;

        let report = coordinator(config, &store).cleanup().await;

        // "1" fails by injection, "3" was never there
        assert_eq!(report, CleanupReport { deleted: 2, failed: 2 });
        assert_eq!(store.calls().deletes, 4);
        assert_eq!(store.object_size("1"), Some(1));
    }

    #[tokio::test]
    async fn test_memory_backend_full_cycle() {
        let store: Arc<dyn ObjectStore> = Arc::new(OpendalStore::memory("bench").unwrap());

        let mut config = RunConfig::new(RunMode::Upload, "bench");
        config.files = 2;
        config.object_size = MIB + 123;
        config.chunk_size = 256 * 1024;
        config.concurrency = 2;
        config.prefix = "cycle-".into();

        let upload = Coordinator::new(config.clone(), Arc::clone(&store));
        match upload.run().await.unwrap() {
            RunReport::Transfer(report) => assert_eq!(report.totals.total, 2 * (MIB + 123)),
            RunReport::Query(_) => panic!("expected a transfer report"),
        }

        config.mode = RunMode::Download;
        let report = Coordinator::new(config.clone(), Arc::clone(&store))
            .run_transfers()
            .await;
        assert_eq!(report.totals.failed, 0);
        assert_eq!(report.totals.total, 2 * (MIB + 123));

        config.mode = RunMode::Query;
        config.duration = Duration::from_millis(100);
        let report = Coordinator::new(config.clone(), Arc::clone(&store))
            .run_query_until(std::future::pending())
            .await
            .unwrap();
        assert_eq!(report.counts.len(), 2);
        assert!(report.totals.total > 0);

        let cleanup = Coordinator::new(config, store).cleanup().await;
        assert_eq!(cleanup, CleanupReport { deleted: 2, failed: 0 });
    }
}
