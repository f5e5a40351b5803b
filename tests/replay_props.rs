//! Replay determinism and idempotence properties.

mod common;

use common::{pattern, st};
use proptest::prelude::*;
use triad_concurrency::{apply_command, CommandLog};
use triaddb::{Command, GraphStore, MemoryGraphStore, Statement, StatementPattern, TxnManager};

/// Replay a log into a fresh transaction on `store`, commit, and return
/// the committed statements in a stable order.
fn apply_log(store: &MemoryGraphStore, log: &CommandLog) -> Vec<Statement> {
    store.begin().unwrap();
    log.replay(|c| apply_command(store, c)).unwrap();
    store.commit().unwrap();
    let mut all = store.matching(&StatementPattern::any()).unwrap();
    all.sort_by_key(|s| s.to_string());
    all
}

#[test]
fn add_remove_add_leaves_the_statement_present_exactly_once() {
    let mut log = CommandLog::new();
    log.record(Command::Add(st(1)));
    log.record(Command::Remove(pattern(1)));
    log.record(Command::Add(st(1)));

    let first = apply_log(&MemoryGraphStore::new(), &log);
    let second = apply_log(&MemoryGraphStore::new(), &log);

    assert_eq!(first, vec![st(1)]);
    assert_eq!(first, second);
}

fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        (0u32..4).prop_map(|n| Command::Add(st(n))),
        (0u32..4).prop_map(|n| Command::Remove(pattern(n))),
        Just(Command::Remove(StatementPattern::any())),
    ]
}

proptest! {
    /// Two independently begun empty transactions replaying the same log
    /// end in identical store states.
    #[test]
    fn replay_is_deterministic(commands in proptest::collection::vec(command_strategy(), 0..24)) {
        let mut log = CommandLog::new();
        for command in &commands {
            log.record(command.clone());
        }
        let first = apply_log(&MemoryGraphStore::new(), &log);
        let second = apply_log(&MemoryGraphStore::new(), &log);
        prop_assert_eq!(first, second);
    }

    /// Replaying the same log a second time against the resulting state
    /// changes nothing: adds and removes are idempotent at the store layer.
    #[test]
    fn replay_is_idempotent(commands in proptest::collection::vec(command_strategy(), 0..24)) {
        let store = MemoryGraphStore::new();
        let mut log = CommandLog::new();
        for command in &commands {
            log.record(command.clone());
        }
        let first = apply_log(&store, &log);
        let second = apply_log(&store, &log);
        prop_assert_eq!(first, second);
    }
}
