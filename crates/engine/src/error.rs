//! Connection-level error taxonomy.

use thiserror::Error;
use triad_concurrency::{AmbientError, RetryError};
use triad_core::StoreError;

/// Errors surfaced by connection operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// The connection has been closed (explicitly, at store shutdown, or
    /// after retry exhaustion made it unusable).
    #[error("connection [{0}] is closed")]
    Closed(u64),

    /// The owning store has been shut down; no new connections.
    #[error("store has been shut down")]
    StoreClosed,

    /// Deadlock recovery replayed the command log the maximum number of
    /// times and deadlocked every time. The connection is unusable and will
    /// close itself on next use.
    #[error("deadlock retry exhausted after {attempts} replay attempts")]
    RetryExhausted {
        /// Replay attempts performed.
        attempts: usize,
    },

    /// The thread-binding switch primitive failed. Fatal; never retried.
    #[error(transparent)]
    AmbientSwitch(#[from] AmbientError),

    /// A store error outside the recoverable deadlock path.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ConnectionError {
    /// Whether the error means the connection can no longer be used.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ConnectionError::Closed(_)
                | ConnectionError::RetryExhausted { .. }
                | ConnectionError::AmbientSwitch(_)
        )
    }
}

impl From<RetryError> for ConnectionError {
    fn from(error: RetryError) -> Self {
        match error {
            RetryError::Exhausted { attempts } => ConnectionError::RetryExhausted { attempts },
            RetryError::Recovery(e) | RetryError::Store(e) => ConnectionError::Store(e),
        }
    }
}
