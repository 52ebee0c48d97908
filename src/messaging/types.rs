//! # Messaging Types
//!
//! Core types for the provider-agnostic queue transport abstraction.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Unique identifier for a queued message
///
/// The format is provider-specific:
/// - SQS: the `MessageId` attribute
/// - PGMQ: i64 message ID as string
/// - InMemory: UUID as string
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(pub String);

impl MessageId {
    /// Create a new message ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for MessageId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Handle for deleting a received message
///
/// Opaque to the framework; only the transport that issued it can interpret
/// it. The format is provider-specific:
/// - SQS: receipt handle string
/// - PGMQ: message_id as string
/// - InMemory: internal UUID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReceiptHandle(pub String);

impl ReceiptHandle {
    /// Create a new receipt handle
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ReceiptHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ReceiptHandle {
    fn from(handle: String) -> Self {
        Self(handle)
    }
}

impl From<&str> for ReceiptHandle {
    fn from(handle: &str) -> Self {
        Self(handle.to_string())
    }
}

/// A message received from a queue, with transport metadata
///
/// Owned transiently by the consumer for a single poll cycle. The `body` is
/// an opaque string until envelope decoding classifies it.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Provider-assigned message ID
    pub message_id: MessageId,

    /// Handle for deleting this message
    pub receipt_handle: ReceiptHandle,

    /// Raw message body
    pub body: String,

    /// Number of times this message has been received
    ///
    /// Increments each time the message becomes visible again after a
    /// visibility timeout expires.
    pub receive_count: u32,

    /// When the message was originally enqueued
    pub enqueued_at: DateTime<Utc>,
}

impl RawMessage {
    /// Create a new raw message
    pub fn new(
        message_id: MessageId,
        receipt_handle: ReceiptHandle,
        body: impl Into<String>,
    ) -> Self {
        Self {
            message_id,
            receipt_handle,
            body: body.into(),
            receive_count: 1,
            enqueued_at: Utc::now(),
        }
    }
}

/// Options for a single receive call
#[derive(Debug, Clone)]
pub struct ReceiveOptions {
    /// Maximum number of messages to receive
    pub max_messages: usize,

    /// How long received messages stay invisible to other consumers
    pub visibility_timeout: Duration,

    /// Message-attribute selectors forwarded to the transport ("All" selects everything)
    pub message_attribute_names: Vec<String>,

    /// System-attribute selectors forwarded to the transport
    pub attribute_names: Vec<String>,
}

impl Default for ReceiveOptions {
    fn default() -> Self {
        Self {
            max_messages: 10,
            visibility_timeout: Duration::from_secs(15),
            message_attribute_names: vec!["All".to_string()],
            attribute_names: vec!["All".to_string()],
        }
    }
}

impl ReceiveOptions {
    /// Set the maximum number of messages per receive
    pub fn with_max_messages(mut self, max: usize) -> Self {
        self.max_messages = max;
        self
    }

    /// Set the visibility timeout
    pub fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_handle_conversions() {
        let handle = ReceiptHandle::from("abc-123");
        assert_eq!(handle.as_str(), "abc-123");
        assert_eq!(handle.to_string(), "abc-123");

        let from_string = ReceiptHandle::from("xyz".to_string());
        assert_eq!(from_string, ReceiptHandle::new("xyz"));
    }

    #[test]
    fn test_receive_options_defaults() {
        let opts = ReceiveOptions::default();
        assert_eq!(opts.max_messages, 10);
        assert_eq!(opts.visibility_timeout, Duration::from_secs(15));
        assert_eq!(opts.message_attribute_names, vec!["All".to_string()]);
    }

    #[test]
    fn test_receive_options_builder() {
        let opts = ReceiveOptions::default()
            .with_max_messages(1)
            .with_visibility_timeout(Duration::from_secs(30));
        assert_eq!(opts.max_messages, 1);
        assert_eq!(opts.visibility_timeout, Duration::from_secs(30));
    }
}
