//! Write counting and batch-commit triggering.

/// Default number of writes per internal transaction batch.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Counts write operations and signals when an internal commit should fire.
///
/// An unbounded transaction across a bulk load of millions of statements
/// costs the store proportional memory for pending-change tracking; batching
/// trades strict all-or-nothing atomicity of the load for bounded resource
/// use. The trade is caller-invisible: a caller who never commits explicitly
/// may still observe partial, already-durable results if a failure lands
/// mid-load. Callers that cannot accept that set a batch size large enough
/// to never trigger.
#[derive(Debug)]
pub struct BatchCommitPolicy {
    write_ops: usize,
    batch_size: usize,
}

impl BatchCommitPolicy {
    /// Create a policy that triggers every `batch_size` writes.
    pub fn new(batch_size: usize) -> Self {
        BatchCommitPolicy {
            write_ops: 0,
            batch_size: batch_size.max(1),
        }
    }

    /// Count one write. Returns `true` iff the batch is full and the caller
    /// must commit, begin a fresh transaction, and [`reset`](Self::reset).
    pub fn record_write(&mut self) -> bool {
        self.write_ops += 1;
        self.write_ops >= self.batch_size
    }

    /// Reset the counter. Called on every commit or rollback, internal or
    /// explicit.
    pub fn reset(&mut self) {
        self.write_ops = 0;
    }

    /// Writes counted since the last reset.
    pub fn write_ops(&self) -> usize {
        self.write_ops
    }

    /// The configured batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

impl Default for BatchCommitPolicy {
    fn default() -> Self {
        BatchCommitPolicy::new(DEFAULT_BATCH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triggers_exactly_at_batch_size() {
        let mut policy = BatchCommitPolicy::new(3);
        assert!(!policy.record_write());
        assert!(!policy.record_write());
        assert!(policy.record_write());
        assert_eq!(policy.write_ops(), 3);
    }

    #[test]
    fn reset_starts_a_new_window() {
        let mut policy = BatchCommitPolicy::new(2);
        policy.record_write();
        assert!(policy.record_write());
        policy.reset();
        assert_eq!(policy.write_ops(), 0);
        assert!(!policy.record_write());
        assert!(policy.record_write());
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        let mut policy = BatchCommitPolicy::new(0);
        assert_eq!(policy.batch_size(), 1);
        assert!(policy.record_write());
    }
}
