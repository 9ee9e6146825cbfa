use thiserror::Error;

/// Errors from persistence gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// No caller identity. Raised before any effect.
    #[error("unauthorized")]
    Unauthorized,

    /// The conversation does not exist or is not owned by the caller.
    #[error("conversation not found")]
    NotFound,

    /// Replace-messages deleted the old transcript but failed to insert the new one.
    #[error("partial failure: {0}")]
    PartialFailure(String),

    /// Store or network failure; the next natural trigger re-attempts.
    #[error("transient failure: {0}")]
    Transient(String),
}

/// Errors from a message stream adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("stream transport error: {0}")]
    Transport(String),

    #[error("stream cancelled")]
    Cancelled,
}

/// Errors surfaced by the sync coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("message id '{0}' already exists in the transcript")]
    DuplicateMessage(String),

    #[error("no active conversation")]
    NoActiveConversation,

    #[error("no message stream adapter configured")]
    NoStreamAdapter,
}
