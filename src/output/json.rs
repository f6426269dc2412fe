//! JSON output formatting
//!
//! Same content as the text report, as one JSON document on stdout.
//! Failed transfer workers carry their error message instead of a rate.

use crate::config::RunMode;
use crate::coordinator::{QueryReport, TransferReport};
use crate::stats::histogram::LatencySummary;
use crate::stats::RunTotals;
use crate::util::time::ceil_rate;
use crate::Result;
use anyhow::Context;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct JsonTransferWorker {
    pub index: usize,
    pub key: String,
    pub elapsed_us: u64,
    pub bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mb_per_sec: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JsonQueryWorker {
    pub index: usize,
    pub key: String,
    pub requests: u64,
    pub req_per_sec: u64,
}

#[derive(Debug, Serialize)]
pub struct JsonTotals {
    pub workers: usize,
    pub failed: usize,
    pub total: u64,
    pub elapsed_us: u64,
    /// MB/s for transfers, req/s for queries
    pub rate: u64,
}

impl JsonTotals {
    fn new(totals: &RunTotals, rate: u64) -> Self {
        Self {
            workers: totals.workers,
            failed: totals.failed,
            total: totals.total,
            elapsed_us: micros(totals),
            rate,
        }
    }
}

fn micros(totals: &RunTotals) -> u64 {
    u64::try_from(totals.elapsed.as_micros()).unwrap_or(u64::MAX)
}

#[derive(Debug, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum JsonReport {
    Upload(JsonTransferReport),
    Download(JsonTransferReport),
    Query(JsonQueryReport),
}

#[derive(Debug, Serialize)]
pub struct JsonTransferReport {
    pub bucket: String,
    /// RFC 3339
    pub started_at: String,
    pub workers: Vec<JsonTransferWorker>,
    pub totals: JsonTotals,
}

#[derive(Debug, Serialize)]
pub struct JsonQueryReport {
    pub bucket: String,
    pub started_at: String,
    pub interrupted: bool,
    pub workers: Vec<JsonQueryWorker>,
    pub totals: JsonTotals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<LatencySummary>,
}

pub fn transfer_report(bucket: &str, report: &TransferReport) -> JsonReport {
    let workers = report
        .results
        .iter()
        .map(|r| JsonTransferWorker {
            index: r.index,
            key: r.key.clone(),
            elapsed_us: u64::try_from(r.elapsed.as_micros()).unwrap_or(u64::MAX),
            bytes: r.bytes,
            mb_per_sec: r.is_ok().then(|| r.mib_per_sec()),
            error: r.error.as_ref().map(|e| e.to_string()),
        })
        .collect();

    let body = JsonTransferReport {
        bucket: bucket.to_string(),
        started_at: report.started_at.to_rfc3339(),
        workers,
        totals: JsonTotals::new(&report.totals, report.totals.mib_per_sec()),
    };

    match report.mode {
        RunMode::Upload => JsonReport::Upload(body),
        _ => JsonReport::Download(body),
    }
}

pub fn query_report(bucket: &str, report: &QueryReport) -> JsonReport {
    let elapsed = report.totals.elapsed;
    let workers = report
        .counts
        .iter()
        .map(|c| JsonQueryWorker {
            index: c.index,
            key: c.key.clone(),
            requests: c.requests,
            req_per_sec: ceil_rate(c.requests, elapsed),
        })
        .collect();

    JsonReport::Query(JsonQueryReport {
        bucket: bucket.to_string(),
        started_at: report.started_at.to_rfc3339(),
        interrupted: report.interrupted,
        workers,
        totals: JsonTotals::new(&report.totals, report.totals.per_sec()),
        latency: report.latency.summary(),
    })
}

/// Serialize a report as pretty-printed JSON
pub fn to_json_string(report: &JsonReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize JSON report")
}

/// Print a report to stdout as JSON
pub fn print_report(report: &JsonReport) -> Result<()> {
    println!("{}", to_json_string(report)?);
    Ok(())
}
