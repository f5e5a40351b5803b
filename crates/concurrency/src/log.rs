//! Append-only command log, replayed after a forced rollback.

use triad_core::{Command, StoreError};

/// Ordered record of the mutation intents issued since the last successful
/// commit or rollback.
///
/// Insertion order is replay order. The log must be cleared exactly once
/// per commit or rollback: a missed clear makes every later replay reapply
/// writes from already-terminated transactions, which is the primary
/// correctness hazard this type exists to contain.
#[derive(Debug, Default)]
pub struct CommandLog {
    commands: Vec<Command>,
}

impl CommandLog {
    /// Create an empty log.
    pub fn new() -> Self {
        CommandLog::default()
    }

    /// Append a command. No deduplication; size is bounded indirectly by
    /// the batch commit policy flushing the window.
    pub fn record(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Invoke `apply` for each recorded command in insertion order.
    ///
    /// Does not mutate the log; the caller clears it separately once the
    /// replayed transaction reaches a terminal state. Stops at the first
    /// error.
    pub fn replay<F>(&self, mut apply: F) -> Result<(), StoreError>
    where
        F: FnMut(&Command) -> Result<(), StoreError>,
    {
        for command in &self.commands {
            apply(command)?;
        }
        Ok(())
    }

    /// The recorded commands, in insertion order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Empty the log.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triad_core::{Literal, Resource, Statement, StatementPattern};

    fn add(n: u32) -> Command {
        Command::Add(Statement::new(
            Resource::iri(format!("http://example.org/s{}", n)),
            Resource::iri("http://example.org/p"),
            Literal::plain(n.to_string()),
        ))
    }

    #[test]
    fn replay_preserves_insertion_order() {
        let mut log = CommandLog::new();
        log.record(add(1));
        log.record(Command::Remove(StatementPattern::any()));
        log.record(add(2));

        let mut seen = Vec::new();
        log.replay(|c| {
            seen.push(c.is_add());
            Ok(())
        })
        .unwrap();
        assert_eq!(seen, vec![true, false, true]);
    }

    #[test]
    fn replay_does_not_mutate_the_log() {
        let mut log = CommandLog::new();
        log.record(add(1));
        log.record(add(2));

        log.replay(|_| Ok(())).unwrap();
        log.replay(|_| Ok(())).unwrap();
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn replay_stops_at_first_error() {
        let mut log = CommandLog::new();
        log.record(add(1));
        log.record(add(2));
        log.record(add(3));

        let mut applied = 0;
        let result = log.replay(|_| {
            applied += 1;
            if applied == 2 {
                Err(StoreError::Deadlock)
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err(StoreError::Deadlock));
        assert_eq!(applied, 2);
    }

    #[test]
    fn clear_empties_and_double_clear_is_harmless() {
        let mut log = CommandLog::new();
        log.record(add(1));
        log.clear();
        assert!(log.is_empty());
        log.clear();
        assert!(log.is_empty());
    }
}
