//! Per-call request context
//!
//! Carries the authenticated caller and a cooperative cancellation signal.
//! The store forwards the signal to every storage call, so a cancelled
//! operation stops at the next I/O boundary.

use crate::model::UserSpec;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct Context {
    caller: UserSpec,
    cancel: CancellationToken,
}

impl Context {
    /// Context for an authenticated caller
    pub fn new(caller: UserSpec) -> Self {
        Self {
            caller,
            cancel: CancellationToken::new(),
        }
    }

    /// Context with no authenticated user (id 0)
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Attach an existing cancellation token
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn caller(&self) -> &UserSpec {
        &self.caller
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Same cancellation signal, different caller
    pub fn as_user(&self, caller: UserSpec) -> Self {
        Self {
            caller,
            cancel: self.cancel.clone(),
        }
    }
}
