//! Recorded mutation intents.

use crate::statement::{Statement, StatementPattern};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One recorded mutation intent.
///
/// Commands are appended to a connection's command log as operations are
/// issued and replayed, in insertion order, after a forced rollback. Replay
/// order matters: a later remove may depend on an earlier add having been
/// visible within the same batch window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Add one concrete statement.
    Add(Statement),
    /// Remove every statement matching the pattern.
    Remove(StatementPattern),
}

impl Command {
    /// Whether this is an add.
    pub fn is_add(&self) -> bool {
        matches!(self, Command::Add(_))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Add(st) => write!(f, "ADD {}", st),
            Command::Remove(p) => write!(f, "REMOVE {:?}", p),
        }
    }
}
