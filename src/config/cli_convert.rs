//! CLI to Config conversion utilities
//!
//! Precedence for every setting: command line, then config file, then the
//! built-in default.

use super::cli::Cli;
use super::toml::FileConfig;
use super::{RunConfig, RunMode, StoreConfig, DEFAULT_CHUNK_SIZE, DEFAULT_REGION};
use crate::util::buffer::FillPattern;
use anyhow::{Context, Result};
use std::time::Duration;

/// Parse a size string (e.g., "1G", "100M", "4k") to bytes
pub fn parse_size(s: &str) -> Result<u64> {
    let s = s.trim().to_lowercase();

    let (num_str, multiplier) = if s.ends_with('k') || s.ends_with("kb") {
        (s.trim_end_matches("kb").trim_end_matches('k'), 1024u64)
    } else if s.ends_with('m') || s.ends_with("mb") {
        (s.trim_end_matches("mb").trim_end_matches('m'), 1024 * 1024)
    } else if s.ends_with('g') || s.ends_with("gb") {
        (s.trim_end_matches("gb").trim_end_matches('g'), 1024 * 1024 * 1024)
    } else if s.ends_with('t') || s.ends_with("tb") {
        (s.trim_end_matches("tb").trim_end_matches('t'), 1024 * 1024 * 1024 * 1024)
    } else {
        (s.trim_end_matches('b'), 1)
    };

    let num: u64 = num_str
        .parse()
        .with_context(|| format!("Invalid size format: {}", s))?;

    num.checked_mul(multiplier)
        .with_context(|| format!("Size out of range: {}", s))
}

/// Pick the run mode from the mode flags
///
/// Exactly one of upload/download/query must be set.
pub fn mode_from_flags(upload: bool, download: bool, query: bool) -> Result<RunMode> {
    match (upload, download, query) {
        (true, false, false) => Ok(RunMode::Upload),
        (false, true, false) => Ok(RunMode::Download),
        (false, false, true) => Ok(RunMode::Query),
        (false, false, false) => anyhow::bail!("must specify one of upload/download/query"),
        _ => anyhow::bail!("must only specify one of upload/download/query"),
    }
}

/// Build the run and store configuration from CLI arguments and an
/// optional config file
pub fn resolve(cli: &Cli, file: &FileConfig) -> Result<(RunConfig, StoreConfig)> {
    let mode = mode_from_flags(cli.upload, cli.download, cli.query)?;
    let run = &file.run;
    let store_file = &file.store;

    let bucket = cli
        .bucket
        .clone()
        .or_else(|| store_file.bucket.clone())
        .unwrap_or_default();

    let chunk_size = match cli.chunksize.as_deref().or(run.chunk_size.as_deref()) {
        Some(s) => parse_size(s).context("Invalid chunk size")?,
        None => DEFAULT_CHUNK_SIZE,
    };
    let object_size = match cli.objectsize.as_deref().or(run.object_size.as_deref()) {
        Some(s) => parse_size(s).context("Invalid object size")?,
        None => 0,
    };

    let fill = if cli.rand {
        FillPattern::Random
    } else {
        run.fill.unwrap_or_default()
    };

    let mut config = RunConfig::new(mode, bucket.clone());
    config.files = cli.files.or(run.files).unwrap_or(1);
    config.concurrency = cli.concurrency.or(run.concurrency).unwrap_or(1);
    config.chunk_size = chunk_size;
    config.object_size = object_size;
    config.prefix = cli
        .prefix
        .clone()
        .or_else(|| run.prefix.clone())
        .unwrap_or_default();
    config.fill = fill;
    config.duration = Duration::from_secs(cli.sec.or(run.duration_secs).unwrap_or(1));
    config.delete_after = cli.delete || run.delete_after.unwrap_or(false);

    let store = StoreConfig {
        bucket,
        endpoint: cli
            .endpoint
            .clone()
            .or_else(|| store_file.endpoint.clone())
            .unwrap_or_default(),
        region: cli
            .region
            .clone()
            .or_else(|| store_file.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string()),
        access_key: cli.access.clone().or_else(|| store_file.access_key.clone()),
        secret_key: cli.secret.clone().or_else(|| store_file.secret_key.clone()),
        path_style: cli.pathstyle || store_file.path_style.unwrap_or(false),
        debug: cli.debug,
    };

    Ok((config, store))
}
