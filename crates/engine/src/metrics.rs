//! Operation counters for connections and stores.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of one connection's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionMetrics {
    /// Statements added.
    pub adds: u64,
    /// Remove operations issued.
    pub removes: u64,
    /// Explicit commits.
    pub commits: u64,
    /// Explicit rollbacks.
    pub rollbacks: u64,
    /// Internal batch commits.
    pub batch_commits: u64,
    /// Command-log replays performed while recovering from deadlocks.
    pub deadlock_replays: u64,
}

/// Snapshot of a store's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreMetrics {
    /// Connections handed out over the store's lifetime.
    pub connections_opened: u64,
    /// Connections force-closed at shutdown because callers leaked them.
    pub connections_force_closed: u64,
    /// Connections currently registered.
    pub active_connections: u64,
}

#[derive(Debug, Default)]
pub(crate) struct ConnectionCounters {
    adds: AtomicU64,
    removes: AtomicU64,
    commits: AtomicU64,
    rollbacks: AtomicU64,
    batch_commits: AtomicU64,
    deadlock_replays: AtomicU64,
}

impl ConnectionCounters {
    pub(crate) fn record_add(&self) {
        self.adds.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_remove(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_commit(&self) {
        self.commits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rollback(&self) {
        self.rollbacks.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_batch_commit(&self) {
        self.batch_commits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_replays(&self, replays: u64) {
        self.deadlock_replays.fetch_add(replays, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> ConnectionMetrics {
        ConnectionMetrics {
            adds: self.adds.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            rollbacks: self.rollbacks.load(Ordering::Relaxed),
            batch_commits: self.batch_commits.load(Ordering::Relaxed),
            deadlock_replays: self.deadlock_replays.load(Ordering::Relaxed),
        }
    }
}
