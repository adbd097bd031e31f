use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::err::decode_error::ReError;
use crate::err::CResult;

/// A deadline plus a cooperative cancel flag, threaded through every blocking
/// operation in the spec's concurrency model (§5: "every blocking operation
/// must accept a cancellation token carrying a deadline").
///
/// Generalises `ShutdownHandle`'s single `AtomicBool` (common::server) from a
/// process-wide shutdown switch into a per-call token any number of
/// operations can share and race against.
#[derive(Clone)]
pub struct Deadline {
    inner: Arc<Inner>,
}

struct Inner {
    cancelled: AtomicBool,
    expires_at: Option<Instant>,
}

impl Deadline {
    pub fn none() -> Self {
        Deadline {
            inner: Arc::new(Inner { cancelled: AtomicBool::new(false), expires_at: None }),
        }
    }

    pub fn after(timeout: Duration) -> Self {
        Deadline {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                expires_at: Some(Instant::now() + timeout),
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub fn is_expired(&self) -> bool {
        match self.inner.expires_at {
            Some(at) => Instant::now() >= at,
            None => false,
        }
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.inner.expires_at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Check whether this deadline has already fired, returning the
    /// appropriate `ReError` variant without blocking.
    pub fn check(&self) -> CResult<()> {
        if self.is_cancelled() {
            return Err(ReError::Canceled("operation canceled".to_string()));
        }
        if self.is_expired() {
            return Err(ReError::Timeout("deadline exceeded".to_string()));
        }
        Ok(())
    }

    /// Race `fut` against cancellation/expiry, returning whichever resolves first.
    pub async fn race<F, T>(&self, fut: F) -> CResult<T>
    where
        F: std::future::Future<Output = CResult<T>>,
    {
        self.check()?;
        match self.remaining() {
            None => fut.await,
            Some(remaining) => {
                tokio::select! {
                    res = fut => res,
                    _ = sleep(remaining) => Err(ReError::Timeout("deadline exceeded".to_string())),
                }
            }
        }
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Deadline::none()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn expired_deadline_short_circuits() {
        let d = Deadline::after(Duration::from_millis(0));
        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(d.check().is_err());
    }

    #[tokio::test]
    async fn cancel_is_observed_immediately() {
        let d = Deadline::none();
        d.cancel();
        assert!(matches!(d.check(), Err(ReError::Canceled(_))));
    }
}
