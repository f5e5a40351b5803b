//! Error taxonomy for the store and model layers.

use crate::txn::TxnId;
use std::fmt;
use thiserror::Error;

/// Errors raised by a [`GraphStore`](crate::traits::GraphStore) or
/// [`TxnManager`](crate::traits::TxnManager).
///
/// [`StoreError::Deadlock`] is the one transient variant: the connection
/// layer recovers from it by rolling back and replaying its command log.
/// Everything else is surfaced to the caller as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Two concurrent transactions formed a lock-wait cycle and this one
    /// was chosen to abort.
    #[error("deadlock detected")]
    Deadlock,

    /// An operation required a thread-bound transaction and none was bound.
    #[error("no transaction is bound to the current thread")]
    NoCurrentTransaction,

    /// The transaction has already committed or rolled back.
    #[error("{0} is not active")]
    NotActive(TxnId),

    /// The transaction is bound to some other thread.
    #[error("{0} is already bound to another thread")]
    AlreadyBound(TxnId),

    /// The calling thread already has a bound transaction.
    #[error("current thread is already bound to {0}")]
    ThreadOccupied(TxnId),

    /// The manager has no record of this transaction.
    #[error("unknown transaction {0}")]
    UnknownTransaction(TxnId),

    /// Backend-specific failure.
    #[error("storage error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this is the transient deadlock signal.
    pub fn is_deadlock(&self) -> bool {
        matches!(self, StoreError::Deadlock)
    }
}

/// Position of a wildcard in a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternField {
    /// Subject position.
    Subject,
    /// Predicate position.
    Predicate,
    /// Object position.
    Object,
}

impl fmt::Display for PatternField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatternField::Subject => "subject",
            PatternField::Predicate => "predicate",
            PatternField::Object => "object",
        };
        f.write_str(name)
    }
}

/// Errors raised by model-level conversions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A wildcard appeared where a concrete term is required. Adds require
    /// every field concrete; only reads and removes accept wildcards.
    #[error("wildcard {0} where a concrete term is required")]
    Wildcard(PatternField),
}
