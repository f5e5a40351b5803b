//! Bounded deadlock recovery by rollback and command-log replay.

use crate::log::CommandLog;
use thiserror::Error;
use triad_core::{Command, GraphStore, StoreError, TxnHandle, TxnId, TxnManager};

/// Number of replay attempts before a deadlock is escalated as fatal.
pub const DEFAULT_MAX_REPLAYS: usize = 5;

/// Deadlock recovery failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryError {
    /// Every replay attempt deadlocked again. The store's content relative
    /// to the command log is no longer guaranteed; the connection must be
    /// treated as unusable.
    #[error("deadlock retry exhausted after {attempts} replay attempts")]
    Exhausted {
        /// Replay attempts performed.
        attempts: usize,
    },

    /// The rollback or fresh begin between replays failed; recovery cannot
    /// continue.
    #[error("transaction recovery failed while handling a deadlock: {0}")]
    Recovery(#[source] StoreError),

    /// A non-deadlock store error, surfaced as-is.
    #[error(transparent)]
    Store(StoreError),
}

/// Apply one command against the store.
///
/// This is the single apply path: live calls and replays both go through
/// here, so recovery can never diverge from first execution.
pub fn apply_command(store: &dyn GraphStore, command: &Command) -> Result<(), StoreError> {
    match command {
        Command::Add(statement) => store.apply_add(statement),
        Command::Remove(pattern) => store.apply_remove(pattern),
    }
}

/// Apply a just-recorded command, recovering from deadlocks by replaying
/// the command log.
///
/// On a deadlock signal: roll back the connection's transaction, report the
/// aborted transaction id through `on_txn_end` (so the fulltext collaborator
/// can discard speculative writes keyed by it), begin a fresh transaction,
/// and replay the entire log — which already contains `command` — in
/// recorded order. Up to `max_replays` replay attempts are made; exhaustion
/// is fatal.
///
/// `own` is updated in place to the transaction handle that is bound when
/// the function returns, successfully or not. Returns the number of replay
/// attempts used (zero when the live apply succeeded).
pub fn apply_with_retry(
    store: &dyn GraphStore,
    manager: &dyn TxnManager,
    log: &CommandLog,
    own: &mut Option<TxnHandle>,
    command: &Command,
    max_replays: usize,
    on_txn_end: &mut dyn FnMut(TxnId, bool),
) -> Result<usize, RetryError> {
    match apply_command(store, command) {
        Ok(()) => return Ok(0),
        Err(StoreError::Deadlock) => {}
        Err(other) => return Err(RetryError::Store(other)),
    }

    for attempt in 1..=max_replays {
        tracing::debug!(attempt, max_replays, "deadlock detected, replaying command log");

        let aborted = own.take();
        manager.rollback().map_err(RetryError::Recovery)?;
        if let Some(handle) = aborted {
            on_txn_end(handle.id(), false);
        }
        let fresh = manager.begin().map_err(RetryError::Recovery)?;
        *own = Some(fresh);

        match log.replay(|c| apply_command(store, c)) {
            Ok(()) => return Ok(attempt),
            Err(StoreError::Deadlock) => continue,
            Err(other) => return Err(RetryError::Store(other)),
        }
    }

    Err(RetryError::Exhausted {
        attempts: max_replays,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use triad_core::{Literal, Resource, Statement, StatementPattern};
    use triad_storage::MemoryGraphStore;

    fn add(n: u32) -> Command {
        Command::Add(Statement::new(
            Resource::iri(format!("http://example.org/s{}", n)),
            Resource::iri("http://example.org/p"),
            Literal::plain(n.to_string()),
        ))
    }

    fn setup() -> (Arc<MemoryGraphStore>, CommandLog, Option<TxnHandle>) {
        let store = Arc::new(MemoryGraphStore::new());
        let handle = store.begin().unwrap();
        (store, CommandLog::new(), Some(handle))
    }

    #[test]
    fn clean_apply_uses_no_replays() {
        let (store, mut log, mut own) = setup();
        let command = add(1);
        log.record(command.clone());

        let mut ends = Vec::new();
        let replays = apply_with_retry(
            store.as_ref(),
            store.as_ref(),
            &log,
            &mut own,
            &command,
            DEFAULT_MAX_REPLAYS,
            &mut |id, committed| ends.push((id, committed)),
        )
        .unwrap();
        assert_eq!(replays, 0);
        assert!(ends.is_empty());
    }

    #[test]
    fn single_deadlock_recovers_by_replaying() {
        let (store, mut log, mut own) = setup();
        log.record(add(1));
        log.record(add(2));
        let command = add(2);

        store.inject_deadlocks(1);
        let mut ends = Vec::new();
        let replays = apply_with_retry(
            store.as_ref(),
            store.as_ref(),
            &log,
            &mut own,
            &command,
            DEFAULT_MAX_REPLAYS,
            &mut |id, committed| ends.push((id, committed)),
        )
        .unwrap();
        assert_eq!(replays, 1);
        assert_eq!(ends.len(), 1);
        assert!(!ends[0].1);

        // the fresh transaction holds the full replayed window
        store.commit().unwrap();
        assert_eq!(store.size(&[]).unwrap(), 2);
    }

    #[test]
    fn exhaustion_after_exactly_max_replays() {
        let (store, mut log, mut own) = setup();
        let command = add(1);
        log.record(command.clone());

        store.inject_deadlocks(usize::MAX);
        let mut rollbacks = 0;
        let result = apply_with_retry(
            store.as_ref(),
            store.as_ref(),
            &log,
            &mut own,
            &command,
            DEFAULT_MAX_REPLAYS,
            &mut |_, committed| {
                assert!(!committed);
                rollbacks += 1;
            },
        );
        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                attempts: DEFAULT_MAX_REPLAYS
            })
        );
        // one rollback notification per replay attempt
        assert_eq!(rollbacks, DEFAULT_MAX_REPLAYS);
        // a transaction is still bound so the caller can roll it back
        assert!(own.is_some());
    }

    #[test]
    fn non_deadlock_errors_are_not_retried() {
        let store = Arc::new(MemoryGraphStore::new());
        // no transaction begun: the apply fails with NoCurrentTransaction
        let mut own = None;
        let mut log = CommandLog::new();
        let command = Command::Remove(StatementPattern::any());
        log.record(command.clone());

        let result = apply_with_retry(
            store.as_ref(),
            store.as_ref(),
            &log,
            &mut own,
            &command,
            DEFAULT_MAX_REPLAYS,
            &mut |_, _| panic!("no transaction boundary expected"),
        );
        assert_eq!(
            result,
            Err(RetryError::Store(StoreError::NoCurrentTransaction))
        );
    }
}
