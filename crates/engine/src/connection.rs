//! The transactional connection.

use crate::config::StoreConfig;
use crate::error::ConnectionError;
use crate::metrics::{ConnectionCounters, ConnectionMetrics};
use crate::registry::ConnectionRegistry;
use crate::store::ChangeListeners;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};
use triad_concurrency::{
    apply_with_retry, AmbientScope, BatchCommitPolicy, CommandLog, RetryError,
};
use triad_core::{
    ChangeSummary, Command, ConnectionListener, Context, FulltextObserver, GraphStore, Statement,
    StatementPattern, StoreChangeListener, StoreError, TxnHandle, TxnId, TxnManager,
};

// Process-wide, never reused.
static CONNECTION_IDS: AtomicU64 = AtomicU64::new(0);

/// One logical unit of work against the shared store.
///
/// Every operation that touches the store first swaps the connection's own
/// transaction into the calling thread's binding slot and restores the
/// caller's prior binding before returning, success or failure — a caller's
/// own transaction on the same thread is never disturbed. Mutations are
/// recorded in a command log and replayed transparently if the store
/// reports a deadlock, up to a bounded number of attempts.
///
/// Writes are committed in internal batches of
/// [`StoreConfig::batch_size`] operations even when the caller never calls
/// [`commit`](Connection::commit): a bulk load interrupted mid-way may
/// leave earlier batches durable. See [`StoreConfig`] for the trade-off.
///
/// A connection may move between threads, but calls on one connection are
/// serialized internally; concurrent callers block, they do not interleave.
pub struct Connection {
    id: u64,
    graph: Arc<dyn GraphStore>,
    manager: Arc<dyn TxnManager>,
    fulltext: Option<Arc<dyn FulltextObserver>>,
    change_listeners: ChangeListeners,
    registry: Weak<ConnectionRegistry>,
    config: StoreConfig,
    counters: ConnectionCounters,
    listeners: Mutex<Vec<Arc<dyn ConnectionListener>>>,
    inner: Mutex<ConnectionInner>,
}

struct ConnectionInner {
    open: bool,
    poisoned: bool,
    txn: Option<TxnHandle>,
    log: CommandLog,
    policy: BatchCommitPolicy,
}

/// Collaborator notifications accumulated while the state lock is held and
/// delivered after it is released, so a listener calling back into the
/// connection cannot deadlock against it.
#[derive(Default)]
struct PendingNotices {
    txn_ends: Vec<(TxnId, bool)>,
    changes: Vec<ChangeSummary>,
}

impl Connection {
    pub(crate) fn open(
        graph: Arc<dyn GraphStore>,
        manager: Arc<dyn TxnManager>,
        fulltext: Option<Arc<dyn FulltextObserver>>,
        change_listeners: ChangeListeners,
        registry: Weak<ConnectionRegistry>,
        config: StoreConfig,
    ) -> Arc<Self> {
        let id = CONNECTION_IDS.fetch_add(1, Ordering::SeqCst) + 1;
        let connection = Arc::new(Connection {
            id,
            graph,
            manager,
            fulltext,
            change_listeners,
            registry,
            config,
            counters: ConnectionCounters::default(),
            listeners: Mutex::new(Vec::new()),
            inner: Mutex::new(ConnectionInner {
                open: true,
                poisoned: false,
                txn: None,
                log: CommandLog::new(),
                policy: BatchCommitPolicy::new(config.batch_size),
            }),
        });
        info!(connection = id, "connection created");
        connection
    }

    /// This connection's id: process-wide, monotonically increasing, never
    /// reused.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Whether the connection is usable.
    pub fn is_open(&self) -> bool {
        let inner = self.inner.lock();
        inner.open && !inner.poisoned
    }

    /// Snapshot of this connection's operation counters.
    pub fn metrics(&self) -> ConnectionMetrics {
        self.counters.snapshot()
    }

    /// Register a per-connection listener.
    pub fn add_listener(&self, listener: Arc<dyn ConnectionListener>) {
        self.listeners.lock().push(listener);
    }

    /// Remove a previously registered listener.
    pub fn remove_listener(&self, listener: &Arc<dyn ConnectionListener>) {
        self.listeners.lock().retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// Add one concrete statement.
    ///
    /// The add is applied within the connection's transaction, recorded for
    /// deadlock replay, and counted against the batch window. Listeners are
    /// notified on success only.
    pub fn add_statement(&self, statement: &Statement) -> Result<(), ConnectionError> {
        self.mutate(Command::Add(statement.clone()))?;
        self.counters.record_add();
        self.notify_added(statement);
        Ok(())
    }

    /// Remove every statement matching the pattern. Wildcard positions
    /// match any value.
    pub fn remove_statements(&self, pattern: &StatementPattern) -> Result<(), ConnectionError> {
        self.mutate(Command::Remove(pattern.clone()))?;
        self.counters.record_remove();
        self.notify_removed(pattern);
        Ok(())
    }

    /// Remove all statements, optionally restricted to the given named
    /// graphs.
    pub fn clear(&self, contexts: &[Context]) -> Result<(), ConnectionError> {
        if contexts.is_empty() {
            return self.remove_statements(&StatementPattern::any());
        }
        for context in contexts {
            self.remove_statements(&StatementPattern::any().in_context(context.clone()))?;
        }
        Ok(())
    }

    /// All statements matching the pattern, as this connection's
    /// transaction sees them (its own uncommitted writes included).
    ///
    /// Results are materialized inside the connection's transaction scope;
    /// the returned vector is a snapshot and does not track later changes.
    pub fn get_statements(
        &self,
        pattern: &StatementPattern,
    ) -> Result<Vec<Statement>, ConnectionError> {
        self.guarded(|conn, _inner, _handle, _notices| {
            conn.graph.matching(pattern).map_err(ConnectionError::from)
        })
    }

    /// Number of statements, optionally restricted to the given named
    /// graphs. An empty slice counts every graph.
    pub fn size(&self, contexts: &[Context]) -> Result<u64, ConnectionError> {
        self.guarded(|conn, _inner, _handle, _notices| {
            conn.graph.size(contexts).map_err(ConnectionError::from)
        })
    }

    /// Commit this connection's transaction.
    ///
    /// The fulltext collaborator is told the transaction committed, store
    /// change listeners receive the committed window, and the command log
    /// and batch counter are cleared. The next operation begins a fresh
    /// transaction.
    pub fn commit(&self) -> Result<(), ConnectionError> {
        self.guarded(|conn, inner, handle, notices| {
            conn.manager.commit().map_err(ConnectionError::from)?;
            inner.txn = None;
            notices.txn_ends.push((handle.id(), true));
            let summary = ChangeSummary::from_commands(inner.log.commands());
            if !summary.is_empty() {
                notices.changes.push(summary);
            }
            debug!(
                connection = conn.id,
                txn = %handle.id(),
                operations = inner.log.len(),
                "commit"
            );
            inner.log.clear();
            inner.policy.reset();
            Ok(())
        })?;
        self.counters.record_commit();
        Ok(())
    }

    /// Roll back this connection's transaction, discarding uncommitted
    /// work. Store change listeners are not notified.
    pub fn rollback(&self) -> Result<(), ConnectionError> {
        self.guarded(|conn, inner, handle, notices| {
            conn.manager.rollback().map_err(ConnectionError::from)?;
            inner.txn = None;
            notices.txn_ends.push((handle.id(), false));
            debug!(
                connection = conn.id,
                txn = %handle.id(),
                operations = inner.log.len(),
                "rollback"
            );
            inner.log.clear();
            inner.policy.reset();
            Ok(())
        })?;
        self.counters.record_rollback();
        Ok(())
    }

    /// Close the connection, rolling back any pending work and
    /// unregistering it from the owning store. Idempotent: closing a closed
    /// connection is a no-op.
    pub fn close(&self) -> Result<(), ConnectionError> {
        let mut notices = PendingNotices::default();
        let result = {
            let mut inner = self.inner.lock();
            if !inner.open {
                return Ok(());
            }
            self.close_locked(&mut inner, &mut notices)
        };
        self.dispatch(notices);
        result
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Run `f` with the state lock held and the connection's transaction
    /// bound to the calling thread; deliver accumulated notifications after
    /// both are released.
    fn guarded<T>(
        &self,
        f: impl FnOnce(
            &Connection,
            &mut ConnectionInner,
            TxnHandle,
            &mut PendingNotices,
        ) -> Result<T, ConnectionError>,
    ) -> Result<T, ConnectionError> {
        let mut notices = PendingNotices::default();
        let result = {
            let mut inner = self.inner.lock();
            match self.ensure_usable(&mut inner, &mut notices) {
                Ok(()) => self.with_ambient(&mut inner, |inner, handle| {
                    f(self, inner, handle, &mut notices)
                }),
                Err(e) => Err(e),
            }
        };
        self.dispatch(notices);
        result
    }

    /// Swap this connection's transaction into the thread's binding slot
    /// around `f`, beginning one lazily if needed. The prior binding is
    /// restored on every exit path; on the success path a restore failure
    /// is surfaced as [`ConnectionError::AmbientSwitch`].
    fn with_ambient<T>(
        &self,
        inner: &mut ConnectionInner,
        f: impl FnOnce(&mut ConnectionInner, TxnHandle) -> Result<T, ConnectionError>,
    ) -> Result<T, ConnectionError> {
        let (scope, handle) = AmbientScope::enter(self.manager.as_ref(), inner.txn)?;
        inner.txn = Some(handle);
        match f(inner, handle) {
            Ok(value) => {
                scope.exit()?;
                Ok(value)
            }
            Err(e) => {
                // scope drop restores the prior binding; the primary error
                // stays authoritative
                drop(scope);
                Err(e)
            }
        }
    }

    fn ensure_usable(
        &self,
        inner: &mut ConnectionInner,
        notices: &mut PendingNotices,
    ) -> Result<(), ConnectionError> {
        if inner.poisoned && inner.open {
            warn!(
                connection = self.id,
                "connection unusable after retry exhaustion; closing"
            );
            // best effort: the connection is already in an unknown state
            let _ = self.close_locked(inner, notices);
        }
        if !inner.open {
            return Err(ConnectionError::Closed(self.id));
        }
        Ok(())
    }

    /// Record a command, apply it with deadlock recovery, and honor the
    /// batch commit policy.
    fn mutate(&self, command: Command) -> Result<(), ConnectionError> {
        self.guarded(move |conn, inner, _handle, notices| {
            inner.log.record(command.clone());
            let inner = &mut *inner;
            let replays = apply_with_retry(
                conn.graph.as_ref(),
                conn.manager.as_ref(),
                &inner.log,
                &mut inner.txn,
                &command,
                conn.config.max_deadlock_retries,
                &mut |txn, committed| notices.txn_ends.push((txn, committed)),
            );
            let replays = match replays {
                Ok(n) => n,
                Err(error @ RetryError::Exhausted { .. }) => {
                    inner.poisoned = true;
                    return Err(error.into());
                }
                Err(error) => return Err(error.into()),
            };
            if replays > 0 {
                conn.counters.record_replays(replays as u64);
            }
            if inner.policy.record_write() {
                conn.batch_commit(inner, notices)?;
            }
            Ok(())
        })
    }

    /// Internal commit-and-begin once the batch window fills.
    fn batch_commit(
        &self,
        inner: &mut ConnectionInner,
        notices: &mut PendingNotices,
    ) -> Result<(), ConnectionError> {
        let handle = inner
            .txn
            .take()
            .ok_or(ConnectionError::Store(StoreError::NoCurrentTransaction))?;
        self.manager.commit().map_err(ConnectionError::from)?;
        notices.txn_ends.push((handle.id(), true));
        let summary = ChangeSummary::from_commands(inner.log.commands());
        if !summary.is_empty() {
            notices.changes.push(summary);
        }
        debug!(
            connection = self.id,
            txn = %handle.id(),
            operations = inner.log.len(),
            "batch window full, committed internally"
        );
        inner.log.clear();
        inner.policy.reset();
        let fresh = self.manager.begin().map_err(ConnectionError::from)?;
        inner.txn = Some(fresh);
        self.counters.record_batch_commit();
        Ok(())
    }

    /// Close with the state lock already held. Always completes the
    /// bookkeeping (mark closed, unregister); returns the rollback error if
    /// the pending transaction could not be rolled back.
    fn close_locked(
        &self,
        inner: &mut ConnectionInner,
        notices: &mut PendingNotices,
    ) -> Result<(), ConnectionError> {
        inner.open = false;
        if !inner.log.is_empty() {
            warn!(
                connection = self.id,
                pending = inner.log.len(),
                "uncommitted operations discarded on close"
            );
        }
        inner.log.clear();
        inner.policy.reset();

        let result = if inner.txn.is_some() {
            self.with_ambient(inner, |inner, handle| {
                self.manager.rollback().map_err(ConnectionError::from)?;
                inner.txn = None;
                Ok(handle.id())
            })
            .map(|txn| notices.txn_ends.push((txn, false)))
        } else {
            Ok(())
        };

        if let Some(registry) = self.registry.upgrade() {
            registry.unregister(self.id);
        }
        info!(connection = self.id, "connection closed");
        result
    }

    fn notify_added(&self, statement: &Statement) {
        let listeners: Vec<_> = self.listeners.lock().iter().cloned().collect();
        for listener in listeners {
            if let Err(error) = listener.statement_added(statement) {
                warn!(connection = self.id, %error, "connection listener failed; ignoring");
            }
        }
    }

    fn notify_removed(&self, pattern: &StatementPattern) {
        let listeners: Vec<_> = self.listeners.lock().iter().cloned().collect();
        for listener in listeners {
            if let Err(error) = listener.statements_removed(pattern) {
                warn!(connection = self.id, %error, "connection listener failed; ignoring");
            }
        }
    }

    /// Deliver deferred collaborator notifications. Failures are logged and
    /// swallowed: the transaction outcome already reached the store and is
    /// authoritative.
    fn dispatch(&self, notices: PendingNotices) {
        if let Some(fulltext) = &self.fulltext {
            for (txn, committed) in notices.txn_ends.iter().copied() {
                if let Err(error) = fulltext.transaction_ended(txn, committed) {
                    warn!(
                        connection = self.id,
                        %txn,
                        committed,
                        %error,
                        "fulltext observer failed; ignoring"
                    );
                }
            }
        }
        if notices.changes.is_empty() {
            return;
        }
        let listeners: Vec<_> = self.change_listeners.read().iter().cloned().collect();
        for summary in &notices.changes {
            for listener in &listeners {
                if let Err(error) = listener.store_changed(summary) {
                    warn!(connection = self.id, %error, "store change listener failed; ignoring");
                }
            }
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("open", &inner.open)
            .field("pending_ops", &inner.log.len())
            .finish()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        if inner.open {
            warn!(
                connection = self.id,
                "connection dropped while open; uncommitted work is lost"
            );
        }
    }
}
