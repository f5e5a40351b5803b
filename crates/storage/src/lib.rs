//! Storage layer for Triad
//!
//! This crate provides the reference in-memory graph triple store:
//! - [`MemoryGraphStore`]: committed statement set with per-transaction
//!   write sets, thread-bound transaction slots, and write-conflict
//!   deadlock signaling
//!
//! Production deployments back the connection layer with an external graph
//! engine; this store exists so the transactional machinery has an honest,
//! fully in-process collaborator to run and test against.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod memory;

pub use memory::MemoryGraphStore;
