//! Error types for relay-consumer-rs
//!
//! The taxonomy mirrors how failures are recovered: transport errors back off
//! and re-poll, poison messages are deleted, missing handlers are skipped,
//! and handler failures leave their message for redelivery. None of these
//! terminate the consumer.

use thiserror::Error;

use crate::messaging::MessagingError;

/// Result type for consumer operations
pub type Result<T> = std::result::Result<T, ConsumerError>;

/// Errors surfaced by the consumer loop
#[derive(Debug, Error)]
pub enum ConsumerError {
    /// Receive/delete/publish call failed; recovered via sleep-backoff
    #[error("Transport error: {0}")]
    Transport(#[from] MessagingError),

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Handler registration failed
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A handler's own logic failed; its message is left for redelivery
    #[error("Handler for event '{event_name}' failed: {source}")]
    Handler {
        event_name: String,
        #[source]
        source: HandlerError,
    },

    /// One or more handlers in a concurrent batch failed
    ///
    /// Sibling successes keep their deletions; the loop applies the error
    /// backoff as a courtesy delay before the next poll.
    #[error("Batch dispatch: {failed} of {total} handlers failed")]
    PartialDispatch { failed: usize, total: usize },
}

impl ConsumerError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Errors returned by event handlers
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Domain logic failed
    #[error("Handler failed: {0}")]
    Failed(String),

    /// Acknowledgement (delete) failed after the handler's work completed
    #[error("Acknowledge error: {0}")]
    Messaging(#[from] MessagingError),

    /// Application error from the embedding crate
    #[error("Handler error: {0}")]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    /// Create a failure with a reason
    pub fn failed<S: Into<String>>(reason: S) -> Self {
        Self::Failed(reason.into())
    }
}

/// Errors that can occur during handler registration
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Event name is empty
    #[error("Event name cannot be empty")]
    EmptyEventName,

    /// A handler is already registered for this event name
    #[error("Duplicate handler registration for event '{event_name}'")]
    DuplicateHandler { event_name: String },
}

/// Errors that classify a message body as poison
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Body (or wrapped inner message) is not valid JSON
    #[error("Body is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required envelope field is absent or null
    #[error("Envelope is missing required field '{field}'")]
    MissingField { field: &'static str },

    /// A required envelope field is present but unusable
    #[error("Envelope field '{field}' is invalid: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },
}
