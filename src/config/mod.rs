//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.
//! The result is a pair of immutable values built once per invocation:
//! [`RunConfig`] for the benchmark and [`StoreConfig`] for the backend.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::store::TransferOptions;
use crate::util::buffer::FillPattern;
use std::fmt;
use std::time::Duration;

pub const DEFAULT_CHUNK_SIZE: u64 = 64 * 1024 * 1024;
pub const DEFAULT_REGION: &str = "us-east-1";

/// Largest part count a multi-part upload may use
pub const MAX_PARTS: u64 = 10_000;

/// Benchmark to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Upload,
    Download,
    Query,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Upload => write!(f, "upload"),
            RunMode::Download => write!(f, "download"),
            RunMode::Query => write!(f, "query"),
        }
    }
}

/// Parameters of one benchmark run
///
/// Never mutated once workers start; the coordinator shares it behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub mode: RunMode,
    /// Objects to transfer (one worker each)
    pub files: usize,
    /// Parts in flight per object; also the worker count in query mode
    pub concurrency: usize,
    /// Multi-part part size in bytes
    pub chunk_size: u64,
    /// Upload object size in bytes
    pub object_size: u64,
    /// Object keys are `prefix` followed by the worker index
    pub prefix: String,
    pub fill: FillPattern,
    pub bucket: String,
    /// Query mode wall-clock budget
    pub duration: Duration,
    /// Delete uploaded objects after an upload run
    pub delete_after: bool,
}

impl RunConfig {
    pub fn new(mode: RunMode, bucket: impl Into<String>) -> Self {
        Self {
            mode,
            files: 1,
            concurrency: 1,
            chunk_size: DEFAULT_CHUNK_SIZE,
            object_size: 0,
            prefix: String::new(),
            fill: FillPattern::Zeros,
            bucket: bucket.into(),
            duration: Duration::from_secs(1),
            delete_after: false,
        }
    }

    /// Key of the object owned by worker `index`
    pub fn object_key(&self, index: usize) -> String {
        format!("{}{}", self.prefix, index)
    }

    /// Part settings handed to the store for every transfer
    pub fn transfer_options(&self) -> TransferOptions {
        TransferOptions {
            part_size: usize::try_from(self.chunk_size).unwrap_or(usize::MAX),
            concurrency: self.concurrency,
        }
    }

    /// Number of workers the run fans out to
    pub fn worker_count(&self) -> usize {
        match self.mode {
            RunMode::Upload | RunMode::Download => self.files,
            RunMode::Query => self.concurrency,
        }
    }
}

/// Backend connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub bucket: String,
    /// Empty for AWS, `memory` for the in-process backend, else an S3 URL
    pub endpoint: String,
    pub region: String,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    /// Path-style bucket addressing instead of virtual-host style
    pub path_style: bool,
    /// Log every backend request
    pub debug: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            endpoint: String::new(),
            region: DEFAULT_REGION.to_string(),
            access_key: None,
            secret_key: None,
            path_style: false,
            debug: false,
        }
    }
}

impl fmt::Display for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bucket={} prefix={:?} workers={} concurrency={} chunk={}B",
            self.mode,
            self.bucket,
            self.prefix,
            self.worker_count(),
            self.concurrency,
            self.chunk_size
        )?;
        match self.mode {
            RunMode::Upload => write!(f, " size={}B fill={}", self.object_size, self.fill),
            RunMode::Download => Ok(()),
            RunMode::Query => write!(f, " duration={}s", self.duration.as_secs_f64()),
        }
    }
}
