//! Narrow interfaces to the collaborators the connection layer consumes.
//!
//! The connection multiplexer never talks to a concrete store; it drives
//! these traits. [`GraphStore`] and [`TxnManager`] are usually implemented
//! by one object, but the connection layer deliberately takes them as two
//! capabilities so the transaction discipline stays separate from data
//! access.

use crate::command::Command;
use crate::error::StoreError;
use crate::statement::{Statement, StatementPattern};
use crate::term::Context;
use crate::txn::{TxnHandle, TxnId, TxnStatus};

/// Error type collaborator callbacks may return. Notification failures are
/// logged and swallowed by the caller; the primary transaction outcome is
/// authoritative.
pub type NotifyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Data access against the backing graph store.
///
/// Write calls operate within the transaction currently bound to the
/// calling thread and may raise [`StoreError::Deadlock`]. Adds and removes
/// are idempotent at this layer (set semantics) — the connection layer's
/// replay-based recovery depends on that precondition.
pub trait GraphStore: Send + Sync {
    /// Add one concrete statement.
    fn apply_add(&self, statement: &Statement) -> Result<(), StoreError>;

    /// Remove every statement matching the pattern.
    fn apply_remove(&self, pattern: &StatementPattern) -> Result<(), StoreError>;

    /// All statements matching the pattern, as seen by the transaction
    /// bound to the calling thread (committed state overlaid with its own
    /// pending writes). Results are materialized; the snapshot does not
    /// track later changes.
    fn matching(&self, pattern: &StatementPattern) -> Result<Vec<Statement>, StoreError>;

    /// Number of statements, optionally restricted to the given named
    /// graphs. An empty slice counts every graph.
    fn size(&self, contexts: &[Context]) -> Result<u64, StoreError>;
}

/// The store's transaction manager, including the per-thread binding slot.
///
/// At most one transaction is bound to a thread at any instant. The slot is
/// a shared, process-wide resource that connections borrow and return; the
/// borrowing discipline lives in the connection layer's ambient scope, and
/// nothing else may touch the slot.
pub trait TxnManager: Send + Sync {
    /// Begin a new transaction and bind it to the calling thread.
    ///
    /// Fails with [`StoreError::ThreadOccupied`] if the thread already has
    /// a bound transaction; suspend it first.
    fn begin(&self) -> Result<TxnHandle, StoreError>;

    /// The transaction currently bound to the calling thread, if any.
    fn current(&self) -> Option<TxnHandle>;

    /// Detach the calling thread's bound transaction and return it, or
    /// `None` if nothing was bound. The transaction stays active and can be
    /// resumed later, from any thread.
    fn suspend(&self) -> Result<Option<TxnHandle>, StoreError>;

    /// Bind a previously suspended transaction to the calling thread.
    fn resume(&self, handle: TxnHandle) -> Result<(), StoreError>;

    /// Commit the calling thread's bound transaction and clear the binding.
    fn commit(&self) -> Result<(), StoreError>;

    /// Roll back the calling thread's bound transaction and clear the
    /// binding.
    fn rollback(&self) -> Result<(), StoreError>;

    /// Lifecycle state of a transaction, if the manager still tracks it.
    fn status(&self, id: TxnId) -> Option<TxnStatus>;
}

/// External fulltext-index coordinator.
///
/// Told once per transaction boundary — commit, rollback, or batch-internal
/// commit — whether the transaction committed, so it can persist or discard
/// speculative index writes keyed by that transaction id. This side channel
/// is not transactional with the store.
pub trait FulltextObserver: Send + Sync {
    /// A transaction reached a terminal state.
    fn transaction_ended(&self, txn: TxnId, committed: bool) -> Result<(), NotifyError>;
}

/// Per-connection listener, notified on each successful mutating call.
pub trait ConnectionListener: Send + Sync {
    /// A statement was added through this connection.
    fn statement_added(&self, statement: &Statement) -> Result<(), NotifyError>;

    /// Statements matching the pattern were removed through this
    /// connection.
    fn statements_removed(&self, pattern: &StatementPattern) -> Result<(), NotifyError>;
}

/// What a committed window changed, for store-level listeners.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSummary {
    /// Statements added in the window, in order.
    pub added: Vec<Statement>,
    /// Remove patterns applied in the window, in order.
    pub removed: Vec<StatementPattern>,
}

impl ChangeSummary {
    /// Derive a summary from the commands of a committed window.
    pub fn from_commands(commands: &[Command]) -> Self {
        let mut summary = ChangeSummary::default();
        for command in commands {
            match command {
                Command::Add(st) => summary.added.push(st.clone()),
                Command::Remove(p) => summary.removed.push(p.clone()),
            }
        }
        summary
    }

    /// Whether the window changed anything.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Store-level change listener, notified after a commit (explicit or
/// batch-internal) with what the committed window changed. Never notified
/// on rollback.
pub trait StoreChangeListener: Send + Sync {
    /// A window of changes became durable.
    fn store_changed(&self, summary: &ChangeSummary) -> Result<(), NotifyError>;
}
