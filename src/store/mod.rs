//! Object store abstraction
//!
//! The benchmark core never speaks a storage protocol itself. It drives an
//! [`ObjectStore`], a bucket-scoped client that can upload from a byte
//! stream, download into a [`NullSink`], delete, and answer existence
//! probes under a [`Deadline`].
//!
//! # Implementations
//!
//! - [`backend::OpendalStore`]: S3-compatible services (and an in-process
//!   memory service) through `opendal`
//! - [`mock::MockStore`]: scriptable in-process store for tests
//!
//! # Multi-part transfers
//!
//! `put` and `get` receive [`TransferOptions`]. The client splits one object
//! into parts of `part_size` bytes and keeps up to `concurrency` parts in
//! flight. Retries, if any, belong to the client; the benchmark never retries.

pub mod backend;
pub mod mock;

use crate::error::StoreError;
use crate::util::deadline::Deadline;
use crate::util::sink::NullSink;
use async_trait::async_trait;
use std::io::{self, Read};

/// Per-object multi-part settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    /// Bytes per part
    pub part_size: usize,
    /// Parts in flight for one object
    pub concurrency: usize,
}

/// Bucket-scoped object store client
///
/// Implementations must be shareable across worker tasks. A failed call
/// affects only the object it was issued for.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket every key is resolved against
    fn bucket(&self) -> &str;

    /// Upload `body` until it reports end of stream
    async fn put(
        &self,
        key: &str,
        body: &mut (dyn Read + Send),
        opts: TransferOptions,
    ) -> Result<(), StoreError>;

    /// Download the whole object into `sink` and return the bytes written
    async fn get(&self, key: &str, opts: TransferOptions, sink: &NullSink)
        -> Result<u64, StoreError>;

    /// Remove the object
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Cheap existence/metadata probe
    ///
    /// Must return `DeadlineExceeded` or `Cancelled` (and nothing else) when
    /// it stops because `deadline` fired.
    async fn head(&self, key: &str, deadline: &Deadline) -> Result<(), StoreError>;
}

/// Read from `body` until `part` is full or the stream ends
///
/// Sources such as the synthetic reader hand out less than a full part per
/// call, so one part may take several reads. Returns the bytes filled; 0
/// means the stream is exhausted.
pub fn read_part(body: &mut (dyn Read + Send), part: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < part.len() {
        match body.read(&mut part[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
