//! Timing and rate helpers for reports

use std::time::Duration;

pub const MIB: u64 = 1024 * 1024;

/// Format a duration in human-readable form
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use objpulse::util::time::format_duration;
///
/// assert_eq!(format_duration(Duration::from_nanos(500)), "500ns");
/// assert_eq!(format_duration(Duration::from_micros(2500)), "2.50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();

    if nanos < 1_000 {
        format!("{}ns", nanos)
    } else if nanos < 1_000_000 {
        format!("{:.2}us", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.2}ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.2}s", nanos as f64 / 1_000_000_000.0)
    }
}

/// Amount per second, rounded up
///
/// Rounding up keeps a tiny but nonzero amount from reporting as 0.
/// A zero-length interval has no meaningful rate and yields 0.
pub fn ceil_rate(amount: u64, elapsed: Duration) -> u64 {
    let seconds = elapsed.as_secs_f64();
    if seconds > 0.0 {
        (amount as f64 / seconds).ceil() as u64
    } else {
        0
    }
}

/// Throughput in MiB per second, rounded up
pub fn mib_per_sec(bytes: u64, elapsed: Duration) -> u64 {
    let seconds = elapsed.as_secs_f64();
    if seconds > 0.0 {
        (bytes as f64 / seconds / MIB as f64).ceil() as u64
    } else {
        0
    }
}
