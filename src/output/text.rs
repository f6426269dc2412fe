//! Human-readable text output
//!
//! One line per worker, a blank line, then one `run perf` line built from
//! the totals. Rendering is pure so reports can be checked in tests; the
//! `print_*` wrappers write to stdout.

use crate::coordinator::{QueryReport, TransferReport};
use crate::stats::histogram::LatencyHistogram;
use crate::stats::TransferResult;
use crate::util::time::{ceil_rate, format_duration};
use std::fmt::Write;

fn transfer_line(out: &mut String, result: &TransferResult) {
    match &result.error {
        Some(err) => {
            let _ = writeln!(out, "{}: {}", result.index, err);
        }
        None => {
            let _ = writeln!(
                out,
                "{}: {} in {} ({} MB/s)",
                result.index,
                result.bytes,
                format_duration(result.elapsed),
                result.mib_per_sec()
            );
        }
    }
}

/// Render an upload or download report
pub fn render_transfer_report(report: &TransferReport) -> String {
    let mut out = String::new();
    for result in &report.results {
        transfer_line(&mut out, result);
    }

    let totals = &report.totals;
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "run perf: {} in {} ({} MB/s)",
        totals.total,
        format_duration(totals.elapsed),
        totals.mib_per_sec()
    );
    out
}

fn latency_line(latency: &LatencyHistogram) -> Option<String> {
    let s = latency.summary()?;
    Some(format!(
        "latency: min {:.0}us p50 {:.0}us p99 {:.0}us max {:.0}us mean {:.0}us",
        s.min_us, s.p50_us, s.p99_us, s.max_us, s.mean_us
    ))
}

/// Render a query report
///
/// Every probe worker runs for the whole run, so per-worker rates use the
/// run's measured elapsed time.
pub fn render_query_report(report: &QueryReport) -> String {
    let mut out = String::new();
    let totals = &report.totals;
    let elapsed = format_duration(totals.elapsed);

    for count in &report.counts {
        let _ = writeln!(
            out,
            "{}: {} requests in {} ({} req/s)",
            count.index,
            count.requests,
            elapsed,
            ceil_rate(count.requests, totals.elapsed)
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "run perf: {} requests in {} ({} req/s)",
        totals.total,
        elapsed,
        totals.per_sec()
    );
    if let Some(line) = latency_line(&report.latency) {
        let _ = writeln!(out, "{}", line);
    }
    if report.interrupted {
        let _ = writeln!(out, "(interrupted before the configured duration)");
    }
    out
}

pub fn print_transfer_report(report: &TransferReport) {
    print!("{}", render_transfer_report(report));
}

pub fn print_query_report(report: &QueryReport) {
    print!("{}", render_query_report(report));
}
