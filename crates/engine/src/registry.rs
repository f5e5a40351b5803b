//! Tracking of open connections for shutdown cleanup.

use crate::connection::Connection;
use dashmap::DashMap;
use std::sync::Arc;

/// All open connections of one store, keyed by connection id.
///
/// Connections register themselves at open and unregister at close; the
/// store drains the registry at shutdown to force-close whatever callers
/// leaked.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<u64, Arc<Connection>>,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        ConnectionRegistry::default()
    }

    /// Register an open connection.
    pub fn register(&self, connection: Arc<Connection>) {
        self.connections.insert(connection.id(), connection);
    }

    /// Remove a connection by id.
    pub fn unregister(&self, id: u64) -> Option<Arc<Connection>> {
        self.connections.remove(&id).map(|(_, c)| c)
    }

    /// Whether a connection is registered.
    pub fn contains(&self, id: u64) -> bool {
        self.connections.contains_key(&id)
    }

    /// Number of registered connections.
    pub fn active(&self) -> usize {
        self.connections.len()
    }

    /// Remove and return every registered connection.
    pub fn drain(&self) -> Vec<Arc<Connection>> {
        let all: Vec<Arc<Connection>> = self
            .connections
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        self.connections.clear();
        all
    }
}
