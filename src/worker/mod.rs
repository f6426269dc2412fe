//! Benchmark workers
//!
//! A worker performs exactly one object's transfer ([`upload_object`],
//! [`download_object`]) or repeated probes of one object
//! ([`query::probe_loop`]). Workers share nothing mutable: each gets the
//! run configuration by reference, builds its own reader or sink, and hands
//! back a single result record.
//!
//! Transfer workers have no timeout or cancellation. They run until the
//! store call returns, and a failure is captured in the returned
//! [`TransferResult`] instead of being propagated.

pub mod query;

use crate::config::RunConfig;
use crate::stats::TransferResult;
use crate::store::ObjectStore;
use crate::util::buffer::SyntheticReader;
use crate::util::sink::NullSink;
use std::time::Instant;
use tracing::debug;

/// Upload one synthetic object of `object_size` bytes to `prefix + index`
pub async fn upload_object(
    store: &dyn ObjectStore,
    config: &RunConfig,
    index: usize,
) -> TransferResult {
    let key = config.object_key(index);
    let opts = config.transfer_options();
    let mut body = SyntheticReader::new(config.object_size, opts.part_size, config.fill);

    debug!(worker = index, key = %key, size = config.object_size, "upload start");
    let start = Instant::now();
    let res = store.put(&key, &mut body, opts).await;
    let elapsed = start.elapsed();

    match res {
        Ok(()) => {
            debug!(worker = index, key = %key, ?elapsed, "upload done");
            TransferResult::succeeded(index, key, elapsed, config.object_size)
        }
        Err(err) => {
            debug!(worker = index, key = %key, error = %err, "upload failed");
            TransferResult::failed(index, key, elapsed, err.into())
        }
    }
}

/// Download `prefix + index` into a fresh [`NullSink`]
pub async fn download_object(
    store: &dyn ObjectStore,
    config: &RunConfig,
    index: usize,
) -> TransferResult {
    let key = config.object_key(index);
    let sink = NullSink::new();

    debug!(worker = index, key = %key, "download start");
    let start = Instant::now();
    let res = store.get(&key, config.transfer_options(), &sink).await;
    let elapsed = start.elapsed();

    match res {
        Ok(reported) => {
            let written = sink.written();
            if reported != written || sink.extent() != written {
                debug!(
                    worker = index,
                    key = %key,
                    reported,
                    written,
                    extent = sink.extent(),
                    "download byte counts disagree"
                );
            }
            debug!(worker = index, key = %key, bytes = written, ?elapsed, "download done");
            TransferResult::succeeded(index, key, elapsed, written)
        }
        Err(err) => {
            debug!(worker = index, key = %key, error = %err, "download failed");
            TransferResult::failed(index, key, elapsed, err.into())
        }
    }
}
