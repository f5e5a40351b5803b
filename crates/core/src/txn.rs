//! Transaction identity and lifecycle state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque transaction identifier, stable for the transaction's lifetime and
/// never reused by the issuing manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxnId(u64);

impl TxnId {
    /// Wrap a raw id. Only transaction managers should mint these.
    pub fn new(raw: u64) -> Self {
        TxnId(raw)
    }

    /// The raw id value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn[{}]", self.0)
    }
}

/// Lifecycle state of a transaction, tracked by its manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnStatus {
    /// Open and accepting writes.
    Active,
    /// Terminal: all pending writes applied.
    Committed,
    /// Terminal: all pending writes discarded.
    RolledBack,
}

impl TxnStatus {
    /// Whether the transaction has reached a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxnStatus::Committed | TxnStatus::RolledBack)
    }
}

/// A handle to one unit of work against the store.
///
/// Owned by exactly one connection at a time, never shared across
/// connections. The handle is a cheap copyable reference; lifecycle state
/// lives with the [`TxnManager`](crate::traits::TxnManager) that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxnHandle {
    id: TxnId,
}

impl TxnHandle {
    /// Wrap a transaction id in a handle.
    pub fn new(id: TxnId) -> Self {
        TxnHandle { id }
    }

    /// The transaction's id.
    pub fn id(&self) -> TxnId {
        self.id
    }
}

impl fmt::Display for TxnHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.id.fmt(f)
    }
}
