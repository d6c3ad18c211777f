//! # Operation Context
//!
//! Every repository call made by the services runs under an [`OpContext`]:
//! a deadline plus a cancellation token. A cancelled or timed-out call
//! returns [`RepositoryError::Unavailable`]. Repository writes are single
//! atomic units, so an abandoned call has either fully applied or not at
//! all.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::RepositoryError;

/// Default per-call deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline and cancellation for one logical operation.
#[derive(Debug, Clone)]
pub struct OpContext {
    timeout: Duration,
    cancel: CancellationToken,
}

impl OpContext {
    /// A context with its own, never-cancelled token.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            cancel: CancellationToken::new(),
        }
    }

    /// A context tied to an existing token.
    pub fn with_cancel(timeout: Duration, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }

    /// Per-call deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The cancellation token.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Whether the caller has gone away.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run a repository future under this context's deadline and token.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, RepositoryError>
    where
        F: Future<Output = Result<T, RepositoryError>>,
    {
        if self.cancel.is_cancelled() {
            return Err(RepositoryError::Unavailable("operation cancelled".into()));
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                Err(RepositoryError::Unavailable("operation cancelled".into()))
            }
            result = tokio::time::timeout(self.timeout, fut) => match result {
                Ok(inner) => inner,
                Err(_) => Err(RepositoryError::Unavailable(format!(
                    "timed out after {}ms",
                    self.timeout.as_millis()
                ))),
            },
        }
    }
}

impl Default for OpContext {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}
