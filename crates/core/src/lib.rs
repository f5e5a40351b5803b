//! Core types for Triad
//!
//! This crate defines the fundamental types shared by every layer:
//! - RDF terms ([`Resource`], [`Literal`], [`Term`]) and [`Statement`]s
//! - Wildcard read/remove patterns ([`StatementPattern`], [`ContextMatch`])
//! - Transaction identity ([`TxnId`], [`TxnHandle`], [`TxnStatus`])
//! - The recorded mutation intents ([`Command`])
//! - The narrow collaborator traits consumed by the connection layer
//! - The error taxonomy ([`StoreError`], [`ModelError`])
//!
//! No I/O and no locking lives here.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod command;
pub mod error;
pub mod statement;
pub mod term;
pub mod traits;
pub mod txn;

pub use command::Command;
pub use error::{ModelError, PatternField, StoreError};
pub use statement::{ContextMatch, Statement, StatementPattern};
pub use term::{Context, Literal, Resource, Term};
pub use traits::{
    ChangeSummary, ConnectionListener, FulltextObserver, GraphStore, NotifyError,
    StoreChangeListener, TxnManager,
};
pub use txn::{TxnHandle, TxnId, TxnStatus};
