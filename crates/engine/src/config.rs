//! Store-level configuration.

use triad_concurrency::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_REPLAYS};

/// Configuration shared by every connection a store hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Writes per internal transaction batch.
    ///
    /// Once a connection has issued this many adds/removes without an
    /// explicit commit, it commits internally and begins a fresh
    /// transaction. This bounds the store's pending-change tracking during
    /// bulk loads at the cost of making part of the load durable before the
    /// caller commits — a caller that needs strict caller-controlled
    /// atomicity should raise this above its largest expected write count.
    pub batch_size: usize,

    /// Replay attempts after a deadlock before giving up.
    pub max_deadlock_retries: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            batch_size: DEFAULT_BATCH_SIZE,
            max_deadlock_retries: DEFAULT_MAX_REPLAYS,
        }
    }
}
