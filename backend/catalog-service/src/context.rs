//! Per-call cancellation and deadline signal
//!
//! Every handler builds a [`CallContext`] from the inbound metadata. Long
//! running work polls [`CallContext::check`] or awaits
//! [`CallContext::cancelled`] and stops as soon as the caller has gone away
//! or the caller's deadline has passed.

use crate::error::{CatalogError, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tonic::metadata::MetadataMap;

const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

#[derive(Debug, Clone)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
}

impl Default for CallContext {
    fn default() -> Self {
        Self::new(None)
    }
}

impl CallContext {
    pub fn new(deadline: Option<Instant>) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            deadline,
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(Some(Instant::now() + timeout))
    }

    /// Context carrying the caller's `grpc-timeout`, if any
    pub fn from_metadata(metadata: &MetadataMap) -> Self {
        let timeout = metadata
            .get(GRPC_TIMEOUT_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_grpc_timeout);

        match timeout {
            Some(timeout) => Self::with_timeout(timeout),
            None => Self::default(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Mark the call as cancelled; visible to every clone
    pub fn cancel(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Fail fast if the call was cancelled or its deadline has passed
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(CatalogError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Resolve once the call is cancelled or the deadline passes
    ///
    /// Meant to be raced against other work in `tokio::select!`.
    pub async fn cancelled(&self) -> CatalogError {
        let mut rx = self.cancel_rx.clone();
        let flag = async move {
            if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                std::future::pending::<()>().await;
            }
        };

        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = flag => CatalogError::Cancelled,
                _ = sleep_until(deadline) => CatalogError::DeadlineExceeded,
            },
            None => {
                flag.await;
                CatalogError::Cancelled
            }
        }
    }
}

/// Parse a `grpc-timeout` header value: up to 8 digits followed by a unit
fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 || value.len() > 9 {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    let amount: u64 = digits.parse().ok()?;

    let timeout = match unit {
        "H" => Duration::from_secs(amount.checked_mul(3600)?),
        "M" => Duration::from_secs(amount.checked_mul(60)?),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(timeout)
}
