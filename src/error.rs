//! Unified public error type.
//!
//! Internal layers carry their own error enums; this module flattens them
//! into one stable surface so callers can `?` any Triad operation into a
//! single error type.

use thiserror::Error;
use triad_core::{ModelError, StoreError};
use triad_engine::ConnectionError;

/// All Triad errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The connection has been closed.
    #[error("connection [{0}] is closed")]
    ConnectionClosed(u64),

    /// The store has been shut down; no new connections.
    #[error("store has been shut down")]
    StoreClosed,

    /// Deadlock recovery gave up after the configured number of replays.
    /// The connection is unusable.
    #[error("deadlock retry exhausted after {attempts} replay attempts")]
    RetryExhausted {
        /// Replay attempts performed.
        attempts: usize,
    },

    /// The thread-binding switch primitive failed. Fatal.
    #[error("ambient transaction switch failed: {0}")]
    AmbientSwitch(String),

    /// A wildcard appeared where a concrete statement is required.
    #[error(transparent)]
    InvalidStatement(#[from] ModelError),

    /// Storage-level failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Whether the error means the connection can no longer be used.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConnectionClosed(_) | Error::RetryExhausted { .. } | Error::AmbientSwitch(_)
        )
    }

    /// Whether this is a closed-connection error.
    pub fn is_closed(&self) -> bool {
        matches!(self, Error::ConnectionClosed(_))
    }
}

impl From<ConnectionError> for Error {
    fn from(error: ConnectionError) -> Self {
        match error {
            ConnectionError::Closed(id) => Error::ConnectionClosed(id),
            ConnectionError::StoreClosed => Error::StoreClosed,
            ConnectionError::RetryExhausted { attempts } => Error::RetryExhausted { attempts },
            ConnectionError::AmbientSwitch(e) => Error::AmbientSwitch(e.to_string()),
            ConnectionError::Store(e) => Error::Storage(e.to_string()),
        }
    }
}

impl From<StoreError> for Error {
    fn from(error: StoreError) -> Self {
        Error::Storage(error.to_string())
    }
}

/// Result type for Triad operations.
pub type Result<T> = std::result::Result<T, Error>;
