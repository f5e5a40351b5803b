//! Convenience re-exports for the common case.
//!
//! ```ignore
//! use triaddb::prelude::*;
//! ```

pub use crate::error::{Error, Result};
pub use crate::{Triad, TriadBuilder};
pub use triad_core::{
    Context, ContextMatch, Literal, Resource, Statement, StatementPattern, Term,
};
pub use triad_engine::{Connection, ConnectionMetrics, StoreConfig, StoreMetrics};
