//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use triaddb::prelude::*;
use triaddb::{
    ChangeSummary, ConnectionListener, FulltextObserver, MemoryGraphStore, NotifyError,
    StoreChangeListener, TxnId,
};

/// A distinct statement in the default graph.
pub fn st(n: u32) -> Statement {
    Statement::new(
        Resource::iri(format!("http://example.org/s{}", n)),
        Resource::iri("http://example.org/p"),
        Literal::plain(n.to_string()),
    )
}

/// The pattern matching exactly `st(n)`.
pub fn pattern(n: u32) -> StatementPattern {
    StatementPattern::of_statement(&st(n))
}

/// Install a subscriber so failing tests print the connection log.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// A store over the reference backend, returning the backend too so tests
/// can inject deadlocks and inspect committed state directly.
pub fn open_with(builder: TriadBuilder) -> (Triad, Arc<MemoryGraphStore>) {
    init_tracing();
    let backend = Arc::new(MemoryGraphStore::new());
    let db = builder
        .backend(Arc::clone(&backend))
        .build()
        .expect("open store");
    (db, backend)
}

pub fn open() -> (Triad, Arc<MemoryGraphStore>) {
    open_with(Triad::builder())
}

/// Records every transaction-end notification.
#[derive(Default)]
pub struct RecordingObserver {
    pub ends: Mutex<Vec<(TxnId, bool)>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingObserver::default())
    }

    pub fn committed(&self) -> usize {
        self.ends.lock().unwrap().iter().filter(|(_, c)| *c).count()
    }

    pub fn not_committed(&self) -> usize {
        self.ends.lock().unwrap().iter().filter(|(_, c)| !*c).count()
    }

    pub fn total(&self) -> usize {
        self.ends.lock().unwrap().len()
    }
}

impl FulltextObserver for RecordingObserver {
    fn transaction_ended(&self, txn: TxnId, committed: bool) -> std::result::Result<(), NotifyError> {
        self.ends.lock().unwrap().push((txn, committed));
        Ok(())
    }
}

/// An observer that always fails; its failures must never surface.
pub struct FailingObserver;

impl FulltextObserver for FailingObserver {
    fn transaction_ended(&self, _txn: TxnId, _committed: bool) -> std::result::Result<(), NotifyError> {
        Err("fulltext index unavailable".into())
    }
}

/// Counts per-connection notifications.
#[derive(Default)]
pub struct CountingListener {
    pub added: AtomicUsize,
    pub removed: AtomicUsize,
}

impl CountingListener {
    pub fn new() -> Arc<Self> {
        Arc::new(CountingListener::default())
    }
}

impl ConnectionListener for CountingListener {
    fn statement_added(&self, _statement: &Statement) -> std::result::Result<(), NotifyError> {
        self.added.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn statements_removed(&self, _pattern: &StatementPattern) -> std::result::Result<(), NotifyError> {
        self.removed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Records every committed change window.
#[derive(Default)]
pub struct RecordingChanges {
    pub summaries: Mutex<Vec<ChangeSummary>>,
}

impl RecordingChanges {
    pub fn new() -> Arc<Self> {
        Arc::new(RecordingChanges::default())
    }

    pub fn windows(&self) -> usize {
        self.summaries.lock().unwrap().len()
    }
}

impl StoreChangeListener for RecordingChanges {
    fn store_changed(&self, summary: &ChangeSummary) -> std::result::Result<(), NotifyError> {
        self.summaries.lock().unwrap().push(summary.clone());
        Ok(())
    }
}
