//! Query probe loop
//!
//! One probe worker issues `head` requests against a single object key as
//! fast as the store answers, until the shared [`Deadline`] fires. The
//! deadline is checked before every request and passed into it, so a probe
//! still in flight at expiry ends with `DeadlineExceeded` (or `Cancelled`).
//! Either ends the loop normally. Any other error is returned and the
//! coordinator treats it as fatal for the whole run.

use crate::error::StoreError;
use crate::stats::QueryCount;
use crate::store::ObjectStore;
use crate::util::deadline::Deadline;
use std::time::Instant;
use tracing::debug;

/// Probe `key` until `deadline` fires and return the completed count
pub async fn probe_loop(
    store: &dyn ObjectStore,
    index: usize,
    key: &str,
    deadline: &Deadline,
) -> Result<QueryCount, StoreError> {
    let mut count = QueryCount::new(index, key);

    loop {
        if let Err(err) = deadline.check() {
            debug!(worker = index, reason = %err, requests = count.requests, "probe loop stopped");
            break;
        }

        let start = Instant::now();
        match store.head(key, deadline).await {
            Ok(()) => count.record(start.elapsed()),
            Err(err) if err.is_termination() => {
                debug!(worker = index, reason = %err, requests = count.requests, "probe loop stopped");
                break;
            }
            Err(err) => return Err(err),
        }
    }

    Ok(count)
}
