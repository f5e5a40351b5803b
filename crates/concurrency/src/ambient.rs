//! Borrowing and restoring the thread's transaction-binding slot.

use thiserror::Error;
use triad_core::{StoreError, TxnHandle, TxnManager};

/// The ambient switch primitive itself failed.
///
/// Escalated immediately as fatal and never retried: after a failed suspend
/// or resume the thread-binding state is inconsistent and unsafe to
/// continue from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("ambient transaction switch failed: {source}")]
pub struct AmbientError {
    #[from]
    source: StoreError,
}

impl AmbientError {
    /// The underlying manager error.
    pub fn source_error(&self) -> &StoreError {
        &self.source
    }
}

/// Scope guard over the thread's transaction-binding slot.
///
/// `enter` suspends whatever transaction the calling thread had bound (the
/// caller's ambient transaction), binds the connection's own transaction —
/// beginning one if the connection has none yet — and remembers what to
/// restore. Dropping the scope unconditionally rebinds the prior
/// transaction, so the restore happens on success, error and panic paths
/// alike; [`exit`](AmbientScope::exit) is the success-path variant that
/// surfaces restore failures instead of logging them.
///
/// If the thread's bound transaction is already the connection's own, the
/// scope is a sentinel: nothing is suspended and nothing is restored, so a
/// connection re-entered on the same thread never deadlocks against itself.
#[must_use = "dropping the scope immediately would restore the prior binding before any work runs"]
pub struct AmbientScope<'a> {
    manager: &'a dyn TxnManager,
    prior: Option<TxnHandle>,
    reentrant: bool,
    done: bool,
}

impl<'a> AmbientScope<'a> {
    /// Swap the connection's transaction in, returning the scope and the
    /// handle now bound to the thread (the connection's existing handle, or
    /// a freshly begun one if `own` was `None`).
    pub fn enter(
        manager: &'a dyn TxnManager,
        own: Option<TxnHandle>,
    ) -> Result<(Self, TxnHandle), AmbientError> {
        let current = manager.current();
        if let (Some(cur), Some(mine)) = (current, own) {
            if cur == mine {
                let scope = AmbientScope {
                    manager,
                    prior: None,
                    reentrant: true,
                    done: false,
                };
                return Ok((scope, mine));
            }
        }

        let prior = if current.is_some() {
            manager.suspend()?
        } else {
            None
        };
        let bound = match own {
            Some(mine) => {
                manager.resume(mine)?;
                mine
            }
            None => manager.begin()?,
        };
        let scope = AmbientScope {
            manager,
            prior,
            reentrant: false,
            done: false,
        };
        Ok((scope, bound))
    }

    /// Whether this scope took the reentrant sentinel path.
    pub fn is_reentrant(&self) -> bool {
        self.reentrant
    }

    /// Restore the prior binding, surfacing any switch failure.
    ///
    /// The connection's transaction may already be unbound when this runs —
    /// a commit or rollback inside the scope clears the thread's binding —
    /// in which case only the prior binding is re-established.
    pub fn exit(mut self) -> Result<(), AmbientError> {
        self.done = true;
        self.restore()
    }

    fn restore(&mut self) -> Result<(), AmbientError> {
        if self.reentrant {
            return Ok(());
        }
        if self.manager.current().is_some() {
            self.manager.suspend()?;
        }
        if let Some(prior) = self.prior.take() {
            self.manager.resume(prior)?;
        }
        Ok(())
    }
}

impl Drop for AmbientScope<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        if let Err(error) = self.restore() {
            tracing::error!(%error, "failed to restore ambient transaction binding");
        }
    }
}
