/// Errors surfaced to calling flows.
///
/// Trust failures never appear here: a message that fails signature or
/// identity validation is dropped and logged, and callers observe nothing.
/// These variants cover the correlation and transport side, where the UI is
/// expected to show a toast and offer a retry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum BridgeError {
    #[error("timeout: {operation}")]
    Timeout { operation: String },

    #[error("request rejected: {message}")]
    Rejected { message: String, code: Option<String> },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("not connected")]
    Disconnected,

    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
}

impl BridgeError {
    /// Returns `true` for errors worth retrying at the UI layer.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Transport { .. } | Self::Disconnected)
    }

    pub fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout { operation: operation.into() }
    }

    pub fn rejected(message: impl Into<String>, code: Option<String>) -> Self {
        Self::Rejected { message: message.into(), code }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest { message: message.into() }
    }
}
