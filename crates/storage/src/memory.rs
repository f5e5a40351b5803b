//! In-memory graph triple store with thread-bound transactions.

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::cell::RefCell;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread::{self, ThreadId};
use triad_core::{
    Command, Context, GraphStore, Statement, StatementPattern, StoreError, TxnHandle, TxnId,
    TxnManager, TxnStatus,
};

static STORE_IDS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    // Binding slot per (thread, store instance). Keyed by instance id so
    // independent stores in one process never share a slot.
    static BOUND: RefCell<FxHashMap<u64, TxnId>> = RefCell::new(FxHashMap::default());
}

#[derive(Debug)]
struct TxnRecord {
    status: TxnStatus,
    ops: Vec<Command>,
    bound_to: Option<ThreadId>,
}

impl TxnRecord {
    fn new(bound_to: ThreadId) -> Self {
        TxnRecord {
            status: TxnStatus::Active,
            ops: Vec::new(),
            bound_to: Some(bound_to),
        }
    }
}

/// Reference in-memory implementation of [`GraphStore`] and [`TxnManager`].
///
/// Statements live in a committed set; each active transaction buffers its
/// writes as an ordered op list that commit applies in order. Reads see the
/// committed state overlaid with the calling thread's bound transaction, so
/// a transaction reads its own writes.
///
/// # Deadlock signaling
///
/// A real engine raises the deadlock signal when lock-wait cycles form.
/// This store has no lock manager, so it raises [`StoreError::Deadlock`]
/// when a write touches a statement another active transaction already has
/// pending (first writer wins), and additionally on demand through
/// [`inject_deadlocks`](MemoryGraphStore::inject_deadlocks), which retry
/// tests use to script the signal deterministically.
#[derive(Debug)]
pub struct MemoryGraphStore {
    instance: u64,
    committed: Mutex<FxHashSet<Statement>>,
    txns: Mutex<FxHashMap<TxnId, TxnRecord>>,
    next_txn: AtomicU64,
    deadlock_faults: AtomicUsize,
}

impl MemoryGraphStore {
    /// Create an empty store.
    pub fn new() -> Self {
        MemoryGraphStore {
            instance: STORE_IDS.fetch_add(1, Ordering::Relaxed),
            committed: Mutex::new(FxHashSet::default()),
            txns: Mutex::new(FxHashMap::default()),
            next_txn: AtomicU64::new(0),
            deadlock_faults: AtomicUsize::new(0),
        }
    }

    /// Make the next `count` write calls raise the deadlock signal.
    ///
    /// Replaces any previously armed count. Testing hook.
    pub fn inject_deadlocks(&self, count: usize) {
        self.deadlock_faults.store(count, Ordering::SeqCst);
    }

    /// Number of committed statements, ignoring any bound transaction.
    pub fn committed_len(&self) -> usize {
        self.committed.lock().len()
    }

    fn take_fault(&self) -> bool {
        self.deadlock_faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn bound(&self) -> Option<TxnId> {
        BOUND.with(|slots| slots.borrow().get(&self.instance).copied())
    }

    fn bind(&self, txn: TxnId) {
        BOUND.with(|slots| {
            slots.borrow_mut().insert(self.instance, txn);
        });
    }

    fn unbind(&self) -> Option<TxnId> {
        BOUND.with(|slots| slots.borrow_mut().remove(&self.instance))
    }

    /// Committed state overlaid with the calling thread's bound
    /// transaction, if any.
    fn view(&self) -> FxHashSet<Statement> {
        let mut set = self.committed.lock().clone();
        if let Some(txn) = self.bound() {
            let txns = self.txns.lock();
            if let Some(rec) = txns.get(&txn) {
                for op in &rec.ops {
                    match op {
                        Command::Add(st) => {
                            set.insert(st.clone());
                        }
                        Command::Remove(p) => set.retain(|s| !p.matches(s)),
                    }
                }
            }
        }
        set
    }

    fn conflicts(txns: &FxHashMap<TxnId, TxnRecord>, me: TxnId, command: &Command) -> bool {
        txns.iter().any(|(id, rec)| {
            *id != me
                && rec.status == TxnStatus::Active
                && rec.ops.iter().any(|op| match (command, op) {
                    (Command::Add(st), Command::Add(other)) => st == other,
                    (Command::Add(st), Command::Remove(p)) => p.matches(st),
                    (Command::Remove(p), Command::Add(other)) => p.matches(other),
                    (Command::Remove(_), Command::Remove(_)) => false,
                })
        })
    }

    fn buffer_write(&self, command: Command) -> Result<(), StoreError> {
        if self.take_fault() {
            return Err(StoreError::Deadlock);
        }
        let txn = self.bound().ok_or(StoreError::NoCurrentTransaction)?;
        let mut txns = self.txns.lock();
        if Self::conflicts(&txns, txn, &command) {
            return Err(StoreError::Deadlock);
        }
        let rec = txns.get_mut(&txn).ok_or(StoreError::UnknownTransaction(txn))?;
        rec.ops.push(command);
        Ok(())
    }
}

impl Default for MemoryGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore for MemoryGraphStore {
    fn apply_add(&self, statement: &Statement) -> Result<(), StoreError> {
        self.buffer_write(Command::Add(statement.clone()))
    }

    fn apply_remove(&self, pattern: &StatementPattern) -> Result<(), StoreError> {
        self.buffer_write(Command::Remove(pattern.clone()))
    }

    fn matching(&self, pattern: &StatementPattern) -> Result<Vec<Statement>, StoreError> {
        Ok(self
            .view()
            .into_iter()
            .filter(|st| pattern.matches(st))
            .collect())
    }

    fn size(&self, contexts: &[Context]) -> Result<u64, StoreError> {
        let view = self.view();
        let count = if contexts.is_empty() {
            view.len()
        } else {
            view.iter()
                .filter(|st| {
                    st.context
                        .as_ref()
                        .map_or(false, |c| contexts.contains(c))
                })
                .count()
        };
        Ok(count as u64)
    }
}

impl TxnManager for MemoryGraphStore {
    fn begin(&self) -> Result<TxnHandle, StoreError> {
        if let Some(existing) = self.bound() {
            return Err(StoreError::ThreadOccupied(existing));
        }
        let id = TxnId::new(self.next_txn.fetch_add(1, Ordering::SeqCst) + 1);
        self.txns
            .lock()
            .insert(id, TxnRecord::new(thread::current().id()));
        self.bind(id);
        tracing::trace!(store = self.instance, %id, "transaction begun");
        Ok(TxnHandle::new(id))
    }

    fn current(&self) -> Option<TxnHandle> {
        self.bound().map(TxnHandle::new)
    }

    fn suspend(&self) -> Result<Option<TxnHandle>, StoreError> {
        let Some(id) = self.unbind() else {
            return Ok(None);
        };
        let mut txns = self.txns.lock();
        let rec = txns.get_mut(&id).ok_or(StoreError::UnknownTransaction(id))?;
        rec.bound_to = None;
        Ok(Some(TxnHandle::new(id)))
    }

    fn resume(&self, handle: TxnHandle) -> Result<(), StoreError> {
        if let Some(existing) = self.bound() {
            return Err(StoreError::ThreadOccupied(existing));
        }
        let id = handle.id();
        let mut txns = self.txns.lock();
        let rec = txns.get_mut(&id).ok_or(StoreError::UnknownTransaction(id))?;
        if rec.status != TxnStatus::Active {
            return Err(StoreError::NotActive(id));
        }
        if rec.bound_to.is_some() {
            return Err(StoreError::AlreadyBound(id));
        }
        rec.bound_to = Some(thread::current().id());
        drop(txns);
        self.bind(id);
        Ok(())
    }

    fn commit(&self) -> Result<(), StoreError> {
        let id = self.unbind().ok_or(StoreError::NoCurrentTransaction)?;
        let mut txns = self.txns.lock();
        let rec = txns.get_mut(&id).ok_or(StoreError::UnknownTransaction(id))?;
        if rec.status != TxnStatus::Active {
            return Err(StoreError::NotActive(id));
        }
        let ops = std::mem::take(&mut rec.ops);
        rec.status = TxnStatus::Committed;
        rec.bound_to = None;

        let mut committed = self.committed.lock();
        for op in ops {
            match op {
                Command::Add(st) => {
                    committed.insert(st);
                }
                Command::Remove(p) => committed.retain(|s| !p.matches(s)),
            }
        }
        tracing::trace!(store = self.instance, %id, "transaction committed");
        Ok(())
    }

    fn rollback(&self) -> Result<(), StoreError> {
        let id = self.unbind().ok_or(StoreError::NoCurrentTransaction)?;
        let mut txns = self.txns.lock();
        let rec = txns.get_mut(&id).ok_or(StoreError::UnknownTransaction(id))?;
        if rec.status != TxnStatus::Active {
            return Err(StoreError::NotActive(id));
        }
        rec.ops.clear();
        rec.status = TxnStatus::RolledBack;
        rec.bound_to = None;
        tracing::trace!(store = self.instance, %id, "transaction rolled back");
        Ok(())
    }

    fn status(&self, id: TxnId) -> Option<TxnStatus> {
        self.txns.lock().get(&id).map(|rec| rec.status)
    }
}
