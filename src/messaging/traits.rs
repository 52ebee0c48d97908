//! # Queue Transport Trait
//!
//! Core trait definition for provider-agnostic queue consumption.

use async_trait::async_trait;

use super::errors::MessagingError;
use super::types::{MessageId, RawMessage, ReceiptHandle, ReceiveOptions};

/// Provider-agnostic queue transport
///
/// Implementations of this trait provide the actual queue backend (SQS, PGMQ,
/// InMemory). The trait is designed to be implementable by any message queue
/// system that supports:
///
/// - Message receive with visibility timeout (at-least-once delivery)
/// - Message deletion by receipt handle (idempotent)
/// - Message publish
///
/// Retry semantics of the underlying network calls are the provider's
/// responsibility; the consumer treats a returned error as a failed call and
/// applies its own backoff.
#[async_trait]
pub trait QueueTransport: Send + Sync + 'static {
    /// Receive up to `options.max_messages` messages from a queue
    ///
    /// Received messages become invisible to other consumers for
    /// `options.visibility_timeout`. If not deleted before the timeout
    /// expires, they become visible again and are eligible for redelivery.
    ///
    /// An empty vector is a normal outcome (queue idle), not an error.
    async fn receive_messages(
        &self,
        queue_url: &str,
        options: &ReceiveOptions,
    ) -> Result<Vec<RawMessage>, MessagingError>;

    /// Delete (acknowledge) a message by its receipt handle
    ///
    /// Must be idempotent: deleting an already-deleted message succeeds
    /// silently.
    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &ReceiptHandle,
    ) -> Result<(), MessagingError>;

    /// Publish a message body to a queue
    ///
    /// Returns the message ID assigned by the provider.
    async fn publish_message(
        &self,
        queue_url: &str,
        body: &str,
    ) -> Result<MessageId, MessagingError>;

    /// Provider name for logging
    fn provider_name(&self) -> &'static str;
}
