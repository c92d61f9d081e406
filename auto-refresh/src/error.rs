//! Error types for the auto-refresh crate.

/// Errors raised by the refresh controller itself.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// Invalid configuration provided
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// `start` was called outside a tokio runtime
    #[error("No tokio runtime available to drive the refresh timer")]
    NoRuntime,

    /// The timer task or worker did not shut down cleanly
    #[error("Shutdown error: {0}")]
    Shutdown(String),

    /// The blocking worker thread or its runtime could not be created
    #[error("Failed to spawn refresh worker: {0}")]
    WorkerSpawn(String),
}

/// Errors returned by a fetch operation.
///
/// The controller never inspects these beyond reporting them; they exist so
/// fetch operations have a common error type to return.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The target no longer exists upstream
    #[error("Target not found: {0}")]
    NotFound(String),

    /// The fetch failed for any other reason
    #[error("Fetch failed: {0}")]
    Failed(String),

    /// An error from the caller's own stack
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl FetchError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Convenience type alias for Results using RefreshError.
pub type Result<T> = std::result::Result<T, RefreshError>;
