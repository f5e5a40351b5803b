//! Transactional connection core for Triad
//!
//! This crate implements the pieces a connection composes to share one
//! store whose active transaction is bound to the calling thread:
//! - [`AmbientScope`]: borrows the thread's transaction-binding slot and
//!   guarantees the caller's prior binding is restored on exit
//! - [`CommandLog`]: append-only record of mutation intents since the last
//!   commit or rollback, replayed after a forced rollback
//! - [`BatchCommitPolicy`]: bounds transaction size by triggering internal
//!   commits after a configured number of writes
//! - [`apply_with_retry`]: bounded deadlock recovery by rollback + replay

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ambient;
pub mod batch;
pub mod log;
pub mod retry;

pub use ambient::{AmbientError, AmbientScope};
pub use batch::{BatchCommitPolicy, DEFAULT_BATCH_SIZE};
pub use log::CommandLog;
pub use retry::{apply_command, apply_with_retry, RetryError, DEFAULT_MAX_REPLAYS};
