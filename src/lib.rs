//! # Triad
//!
//! Transactional graph-backed RDF triple store with thread-cooperative
//! connections.
//!
//! Triad exposes a mutable triple store through independently opened
//! connections that share one backing store whose active transaction is
//! bound to the calling thread. Connections batch writes into bounded
//! transactions, recover from store deadlocks by replaying a command log,
//! and never disturb a transaction the calling thread already had bound.
//!
//! ## Quick start
//!
//! ```ignore
//! use triaddb::prelude::*;
//!
//! // Open an in-memory store
//! let db = Triad::open_in_memory()?;
//!
//! // Connections are independent units of work
//! let conn = db.connect()?;
//! conn.add_statement(&Statement::new(
//!     Resource::iri("http://example.org/alice"),
//!     Resource::iri("http://xmlns.com/foaf/0.1/name"),
//!     Literal::plain("Alice"),
//! ))?;
//! conn.commit()?;
//!
//! // Wildcards read and remove; adds are always concrete
//! let all = conn.get_statements(&StatementPattern::any())?;
//! assert_eq!(all.len(), 1);
//!
//! conn.close()?;
//! db.shutdown()?;
//! ```

#![warn(missing_docs)]

mod database;
mod error;

pub mod prelude;

// Re-export main entry points
pub use database::{Triad, TriadBuilder};
pub use error::{Error, Result};

// Re-export the connection surface
pub use triad_engine::{
    Connection, ConnectionError, ConnectionMetrics, StoreConfig, StoreMetrics, TriadStore,
    TriadStoreBuilder,
};

// Re-export the model and collaborator traits
pub use triad_core::{
    ChangeSummary, Command, ConnectionListener, Context, ContextMatch, FulltextObserver,
    GraphStore, Literal, ModelError, NotifyError, Resource, Statement, StatementPattern,
    StoreChangeListener, StoreError, Term, TxnHandle, TxnId, TxnManager, TxnStatus,
};

// Re-export the reference backend
pub use triad_storage::MemoryGraphStore;
