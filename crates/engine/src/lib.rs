//! Connection engine for Triad
//!
//! This crate composes the transactional core into the public connection
//! surface:
//! - [`Connection`]: one logical unit of work against the shared store,
//!   with batched commits, deadlock replay and ambient-binding discipline
//! - [`TriadStore`]: the factory that owns the backing store, the
//!   connection registry, listeners and configuration
//! - [`ConnectionRegistry`]: tracks open connections so shutdown can
//!   force-close the ones callers leaked

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod connection;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod store;

pub use config::StoreConfig;
pub use connection::Connection;
pub use error::ConnectionError;
pub use metrics::{ConnectionMetrics, StoreMetrics};
pub use registry::ConnectionRegistry;
pub use store::{TriadStore, TriadStoreBuilder};
