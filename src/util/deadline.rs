//! Run deadline and cancellation for query probes
//!
//! A query run creates one [`Deadline`] when the loop starts. Every probe
//! worker holds a clone and passes it into each request. The deadline fires
//! when the wall-clock budget runs out or when the paired [`CancelHandle`]
//! is triggered (interrupt, or a fatal error in a sibling worker).

use crate::error::StoreError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// Shared expiry point plus cancellation flag
#[derive(Debug, Clone)]
pub struct Deadline {
    expires_at: Instant,
    cancelled: watch::Receiver<bool>,
}

/// Trigger side of a [`Deadline`]
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    /// Cancel every request guarded by the paired deadline
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Deadline {
    /// Start a deadline that expires `budget` from now
    pub fn after(budget: Duration) -> (Self, CancelHandle) {
        Self::at(Instant::now() + budget)
    }

    /// Start a deadline that expires at `expires_at`
    pub fn at(expires_at: Instant) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let deadline = Self {
            expires_at,
            cancelled: rx,
        };
        (deadline, CancelHandle { tx: Arc::new(tx) })
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Fail fast if the deadline already fired
    pub fn check(&self) -> Result<(), StoreError> {
        if self.is_cancelled() {
            Err(StoreError::Cancelled)
        } else if Instant::now() >= self.expires_at {
            Err(StoreError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }

    /// Run `request` unless the deadline fires first
    ///
    /// A request still in flight when the deadline fires is dropped and the
    /// call reports `DeadlineExceeded` or `Cancelled`.
    pub async fn guard<T, F>(&self, request: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        self.check()?;

        let mut cancelled = self.cancelled.clone();
        tokio::select! {
            biased;
            _ = wait_cancelled(&mut cancelled) => Err(StoreError::Cancelled),
            _ = tokio::time::sleep_until(self.expires_at) => Err(StoreError::DeadlineExceeded),
            res = request => res,
        }
    }
}

async fn wait_cancelled(rx: &mut watch::Receiver<bool>) {
    let closed = rx.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        // sender gone without cancelling: only the timer can end the request
        std::future::pending::<()>().await;
    }
}
