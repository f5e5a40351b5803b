//! The store factory: owns the backend, registry, listeners and config.

use crate::config::StoreConfig;
use crate::connection::Connection;
use crate::error::ConnectionError;
use crate::metrics::StoreMetrics;
use crate::registry::ConnectionRegistry;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use triad_core::{FulltextObserver, GraphStore, StoreChangeListener, StoreError, TxnManager};

pub(crate) type ChangeListeners = Arc<RwLock<Vec<Arc<dyn StoreChangeListener>>>>;

/// Factory and owner of everything connections share.
///
/// A store hands out [`Connection`]s against one backing graph store and
/// tracks them in a registry; [`shutdown`](TriadStore::shutdown) closes the
/// store and force-closes any connection a caller leaked, with a warning
/// per leaked connection.
pub struct TriadStore {
    graph: Arc<dyn GraphStore>,
    manager: Arc<dyn TxnManager>,
    fulltext: Option<Arc<dyn FulltextObserver>>,
    change_listeners: ChangeListeners,
    registry: Arc<ConnectionRegistry>,
    config: StoreConfig,
    open: AtomicBool,
    opened_total: AtomicU64,
    force_closed_total: AtomicU64,
}

impl TriadStore {
    /// Start configuring a store.
    pub fn builder() -> TriadStoreBuilder {
        TriadStoreBuilder::new()
    }

    /// Open a new connection.
    pub fn connect(&self) -> Result<Arc<Connection>, ConnectionError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(ConnectionError::StoreClosed);
        }
        let connection = Connection::open(
            Arc::clone(&self.graph),
            Arc::clone(&self.manager),
            self.fulltext.clone(),
            Arc::clone(&self.change_listeners),
            Arc::downgrade(&self.registry),
            self.config,
        );
        self.registry.register(Arc::clone(&connection));
        self.opened_total.fetch_add(1, Ordering::Relaxed);
        Ok(connection)
    }

    /// Shut the store down, force-closing leaked connections. Idempotent.
    pub fn shutdown(&self) -> Result<(), ConnectionError> {
        if !self.open.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        for connection in self.registry.drain() {
            if !connection.is_open() {
                continue;
            }
            warn!(
                connection = connection.id(),
                "connection still open when shutting down store; closing"
            );
            if let Err(error) = connection.close() {
                warn!(connection = connection.id(), %error, "forced close failed");
            }
            self.force_closed_total.fetch_add(1, Ordering::Relaxed);
        }
        info!("store shut down");
        Ok(())
    }

    /// Whether the store still accepts connections.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Register a store-level change listener, notified after each commit
    /// with the committed window.
    pub fn add_change_listener(&self, listener: Arc<dyn StoreChangeListener>) {
        self.change_listeners.write().push(listener);
    }

    /// Remove a previously registered change listener.
    pub fn remove_change_listener(&self, listener: &Arc<dyn StoreChangeListener>) {
        self.change_listeners
            .write()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// The configuration connections inherit.
    pub fn config(&self) -> StoreConfig {
        self.config
    }

    /// Snapshot of the store's counters.
    pub fn metrics(&self) -> StoreMetrics {
        StoreMetrics {
            connections_opened: self.opened_total.load(Ordering::Relaxed),
            connections_force_closed: self.force_closed_total.load(Ordering::Relaxed),
            active_connections: self.registry.active() as u64,
        }
    }
}

/// Builder for [`TriadStore`].
pub struct TriadStoreBuilder {
    config: StoreConfig,
    fulltext: Option<Arc<dyn FulltextObserver>>,
    graph: Option<Arc<dyn GraphStore>>,
    manager: Option<Arc<dyn TxnManager>>,
}

impl TriadStoreBuilder {
    /// Create a builder with default configuration and no backend.
    pub fn new() -> Self {
        TriadStoreBuilder {
            config: StoreConfig::default(),
            fulltext: None,
            graph: None,
            manager: None,
        }
    }

    /// Writes per internal transaction batch.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Replay attempts after a deadlock before giving up.
    pub fn max_deadlock_retries(mut self, retries: usize) -> Self {
        self.config.max_deadlock_retries = retries;
        self
    }

    /// Attach the fulltext-index coordinator.
    pub fn fulltext_observer(mut self, observer: Arc<dyn FulltextObserver>) -> Self {
        self.fulltext = Some(observer);
        self
    }

    /// Use one object as both data store and transaction manager (the
    /// common case).
    pub fn backend<B>(self, backend: Arc<B>) -> Self
    where
        B: GraphStore + TxnManager + 'static,
    {
        let graph: Arc<dyn GraphStore> = backend.clone();
        let manager: Arc<dyn TxnManager> = backend;
        self.backend_parts(graph, manager)
    }

    /// Use separate data-store and transaction-manager objects.
    pub fn backend_parts(
        mut self,
        graph: Arc<dyn GraphStore>,
        manager: Arc<dyn TxnManager>,
    ) -> Self {
        self.graph = Some(graph);
        self.manager = Some(manager);
        self
    }

    /// Build the store.
    pub fn build(self) -> Result<TriadStore, ConnectionError> {
        let (graph, manager) = match (self.graph, self.manager) {
            (Some(graph), Some(manager)) => (graph, manager),
            _ => {
                return Err(ConnectionError::Store(StoreError::Backend(
                    "no storage backend configured".to_string(),
                )))
            }
        };
        Ok(TriadStore {
            graph,
            manager,
            fulltext: self.fulltext,
            change_listeners: Arc::new(RwLock::new(Vec::new())),
            registry: Arc::new(ConnectionRegistry::new()),
            config: self.config,
            open: AtomicBool::new(true),
            opened_total: AtomicU64::new(0),
            force_closed_total: AtomicU64::new(0),
        })
    }
}

impl Default for TriadStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triad_storage::MemoryGraphStore;

    #[test]
    fn build_without_backend_fails() {
        let result = TriadStore::builder().build();
        assert!(matches!(result, Err(ConnectionError::Store(_))));
    }

    #[test]
    fn connect_registers_until_close() {
        let store = TriadStore::builder()
            .backend(Arc::new(MemoryGraphStore::new()))
            .build()
            .unwrap();

        let conn = store.connect().unwrap();
        assert_eq!(store.metrics().active_connections, 1);
        assert_eq!(store.metrics().connections_opened, 1);

        conn.close().unwrap();
        assert_eq!(store.metrics().active_connections, 0);
    }

    #[test]
    fn config_reaches_connections() {
        let store = TriadStore::builder()
            .backend(Arc::new(MemoryGraphStore::new()))
            .batch_size(7)
            .max_deadlock_retries(2)
            .build()
            .unwrap();
        assert_eq!(store.config().batch_size, 7);
        assert_eq!(store.config().max_deadlock_retries, 2);
    }
}
