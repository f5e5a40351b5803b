//! Main entry point: open a store, hand out connections.

use crate::error::{Error, Result};
use std::sync::Arc;
use triad_core::{FulltextObserver, GraphStore, StoreChangeListener, TxnManager};
use triad_engine::{Connection, StoreMetrics, TriadStore, TriadStoreBuilder};
use triad_storage::MemoryGraphStore;

/// The Triad database.
///
/// Create one with [`Triad::open_in_memory`] or [`Triad::builder`], open
/// [`Connection`]s with [`connect`](Triad::connect), and shut it down with
/// [`shutdown`](Triad::shutdown) — which force-closes any connection still
/// open, logging a warning per leaked connection.
///
/// # Example
///
/// ```ignore
/// use triaddb::prelude::*;
///
/// let db = Triad::open_in_memory()?;
/// let conn = db.connect()?;
/// // ... work ...
/// conn.close()?;
/// db.shutdown()?;
/// ```
pub struct Triad {
    store: TriadStore,
}

impl Triad {
    /// Open a store backed by the in-memory reference engine.
    pub fn open_in_memory() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a builder for store configuration.
    pub fn builder() -> TriadBuilder {
        TriadBuilder::new()
    }

    /// Open a new connection.
    pub fn connect(&self) -> Result<Arc<Connection>> {
        self.store.connect().map_err(Error::from)
    }

    /// Shut the store down. Idempotent; leaked connections are
    /// force-closed with a warning each.
    pub fn shutdown(&self) -> Result<()> {
        self.store.shutdown().map_err(Error::from)
    }

    /// Whether the store still accepts connections.
    pub fn is_open(&self) -> bool {
        self.store.is_open()
    }

    /// Register a store-level change listener.
    pub fn add_change_listener(&self, listener: Arc<dyn StoreChangeListener>) {
        self.store.add_change_listener(listener);
    }

    /// Remove a previously registered change listener.
    pub fn remove_change_listener(&self, listener: &Arc<dyn StoreChangeListener>) {
        self.store.remove_change_listener(listener);
    }

    /// Snapshot of the store's counters.
    pub fn metrics(&self) -> StoreMetrics {
        self.store.metrics()
    }

    /// The underlying store, for callers that need the full engine
    /// surface.
    pub fn store(&self) -> &TriadStore {
        &self.store
    }
}

/// Builder for [`Triad`].
///
/// Defaults to the in-memory reference backend when no backend is
/// configured.
pub struct TriadBuilder {
    inner: TriadStoreBuilder,
    has_backend: bool,
}

impl TriadBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        TriadBuilder {
            inner: TriadStore::builder(),
            has_backend: false,
        }
    }

    /// Writes per internal transaction batch.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.inner = self.inner.batch_size(batch_size);
        self
    }

    /// Replay attempts after a deadlock before giving up.
    pub fn max_deadlock_retries(mut self, retries: usize) -> Self {
        self.inner = self.inner.max_deadlock_retries(retries);
        self
    }

    /// Attach the fulltext-index coordinator.
    pub fn fulltext_observer(mut self, observer: Arc<dyn FulltextObserver>) -> Self {
        self.inner = self.inner.fulltext_observer(observer);
        self
    }

    /// Use one object as both data store and transaction manager.
    pub fn backend<B>(mut self, backend: Arc<B>) -> Self
    where
        B: GraphStore + TxnManager + 'static,
    {
        self.inner = self.inner.backend(backend);
        self.has_backend = true;
        self
    }

    /// Use separate data-store and transaction-manager objects.
    pub fn backend_parts(
        mut self,
        graph: Arc<dyn GraphStore>,
        manager: Arc<dyn TxnManager>,
    ) -> Self {
        self.inner = self.inner.backend_parts(graph, manager);
        self.has_backend = true;
        self
    }

    /// Build the store.
    pub fn build(self) -> Result<Triad> {
        let builder = if self.has_backend {
            self.inner
        } else {
            self.inner.backend(Arc::new(MemoryGraphStore::new()))
        };
        let store = builder.build().map_err(Error::from)?;
        Ok(Triad { store })
    }
}

impl Default for TriadBuilder {
    fn default() -> Self {
        Self::new()
    }
}
