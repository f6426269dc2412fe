//! objpulse - object storage benchmark
//!
//! Drives parallel upload, download, and metadata-query workloads against
//! one bucket of an S3-compatible store and reports per-worker and
//! aggregate performance.
//!
//! # Architecture
//!
//! - **Synthetic data**: bounded readers that repeat one buffer of zeros or
//!   random bytes, and a null sink that only counts
//! - **Store seam**: an [`store::ObjectStore`] trait with an `opendal`
//!   backend and a scriptable mock
//! - **Workers**: one task per object (transfers) or per concurrency slot
//!   (queries), joined at a single barrier
//! - **Reports**: ceiling throughput, probe latency percentiles, text or JSON

pub mod config;
pub mod coordinator;
pub mod error;
pub mod output;
pub mod stats;
pub mod store;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::{RunConfig, StoreConfig};
pub use coordinator::Coordinator;
pub use store::ObjectStore;

/// Result type used throughout objpulse
pub type Result<T> = anyhow::Result<T>;
