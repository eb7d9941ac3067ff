use serde::{Deserialize, Serialize};

/// Errors returned by backend ledger operations.
///
/// `NotImplemented` is the critical variant for stub-first development —
/// every method starts as a stub returning this, then gets replaced with a
/// real canister call.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum ActorError {
    #[error("not implemented: {method}")]
    NotImplemented { method: String },

    #[error("unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("rejected: {message}")]
    Rejected { message: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl ActorError {
    /// Returns `true` for transient errors that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Convenience constructor for `NotImplemented`.
    pub fn not_implemented(method: impl Into<String>) -> Self {
        Self::NotImplemented { method: method.into() }
    }
}
