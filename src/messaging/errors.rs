//! Error types for queue transport operations

use thiserror::Error;

/// Errors that can occur in transport operations
#[derive(Debug, Error)]
pub enum MessagingError {
    /// Queue does not exist at the transport
    #[error("Queue not found: {queue_url}")]
    QueueNotFound { queue_url: String },

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Receive/delete/publish call failed at the backend
    #[error("Transport error: {0}")]
    Transport(String),

    /// Generic error for compatibility
    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

impl MessagingError {
    /// Create a queue-not-found error
    pub fn queue_not_found<S: Into<String>>(queue_url: S) -> Self {
        Self::QueueNotFound {
            queue_url: queue_url.into(),
        }
    }

    /// Create a transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport(message.into())
    }
}

impl From<String> for MessagingError {
    fn from(msg: String) -> Self {
        Self::Transport(msg)
    }
}

impl From<&str> for MessagingError {
    fn from(msg: &str) -> Self {
        Self::Transport(msg.to_string())
    }
}
