//! # In-Memory Queue Transport
//!
//! Thread-safe in-memory transport implementation for testing and development.
//!
//! ## Features
//!
//! - **Visibility Timeout**: Messages become invisible after receive, re-visible after timeout
//! - **Thread-Safe**: Uses `tokio::sync::RwLock` for concurrent access
//! - **Full QueueTransport Implementation**: Complete API compatibility with remote backends

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::errors::MessagingError;
use super::traits::QueueTransport;
use super::types::{MessageId, RawMessage, ReceiptHandle, ReceiveOptions};

/// In-memory message with visibility tracking
#[derive(Debug, Clone)]
struct StoredMessage {
    /// Unique message ID (UUID string)
    id: String,
    /// Raw message body
    body: String,
    /// When the message was enqueued
    enqueued_at: DateTime<Utc>,
    /// When the message becomes visible again (None = visible now)
    visible_at: Option<DateTime<Utc>>,
    /// Number of times this message has been received
    receive_count: u32,
}

/// In-memory queue with message storage
#[derive(Debug, Default)]
struct InMemoryQueue {
    /// Messages in the queue (FIFO order)
    messages: VecDeque<StoredMessage>,
    /// Total messages published to this queue
    total_published: AtomicU64,
    /// Total messages received from this queue
    total_received: AtomicU64,
    /// Total messages deleted
    total_deleted: AtomicU64,
}

/// In-memory queue transport for testing
///
/// Provides a complete [`QueueTransport`] implementation using in-memory data
/// structures. Messages are stored in a `VecDeque` per queue with visibility
/// timeout simulation, so redelivery behavior can be exercised without a
/// remote backend.
///
/// # Example
///
/// ```rust
/// use relay_consumer::messaging::{InMemoryTransport, QueueTransport, ReceiveOptions};
///
/// # tokio_test::block_on(async {
/// let transport = InMemoryTransport::with_queues(&["events"]);
///
/// transport.publish_message("events", r#"{"eventName":"x","origin":"o","data":{}}"#)
///     .await
///     .unwrap();
///
/// let messages = transport
///     .receive_messages("events", &ReceiveOptions::default())
///     .await
///     .unwrap();
/// assert_eq!(messages.len(), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryTransport {
    /// Queue storage (queue_url -> queue)
    queues: RwLock<HashMap<String, InMemoryQueue>>,
}

impl InMemoryTransport {
    /// Create a new in-memory transport with no queues
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-initialized queues
    pub fn with_queues(queue_urls: &[&str]) -> Self {
        let mut queues = HashMap::new();
        for url in queue_urls {
            queues.insert((*url).to_string(), InMemoryQueue::default());
        }
        Self {
            queues: RwLock::new(queues),
        }
    }

    /// Create a queue if it doesn't exist (idempotent)
    pub async fn ensure_queue(&self, queue_url: &str) {
        let mut queues = self.queues.write().await;
        queues.entry(queue_url.to_string()).or_default();
    }

    /// Number of messages currently stored in a queue (visible or not)
    pub async fn queue_depth(&self, queue_url: &str) -> usize {
        let queues = self.queues.read().await;
        queues.get(queue_url).map_or(0, |q| q.messages.len())
    }

    /// Total messages deleted from a queue over its lifetime
    pub async fn deleted_count(&self, queue_url: &str) -> u64 {
        let queues = self.queues.read().await;
        queues
            .get(queue_url)
            .map_or(0, |q| q.total_deleted.load(Ordering::Relaxed))
    }

    /// Total receive deliveries for a queue over its lifetime
    pub async fn received_count(&self, queue_url: &str) -> u64 {
        let queues = self.queues.read().await;
        queues
            .get(queue_url)
            .map_or(0, |q| q.total_received.load(Ordering::Relaxed))
    }

    /// Drain all stored messages from a queue (test helper)
    pub async fn drain_queue(&self, queue_url: &str) -> Vec<String> {
        let mut queues = self.queues.write().await;
        queues
            .get_mut(queue_url)
            .map(|q| q.messages.drain(..).map(|m| m.body).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QueueTransport for InMemoryTransport {
    async fn receive_messages(
        &self,
        queue_url: &str,
        options: &ReceiveOptions,
    ) -> Result<Vec<RawMessage>, MessagingError> {
        let mut queues = self.queues.write().await;
        let queue = queues
            .get_mut(queue_url)
            .ok_or_else(|| MessagingError::queue_not_found(queue_url))?;

        let now = Utc::now();
        let visibility = chrono::Duration::from_std(options.visibility_timeout)
            .map_err(|e| MessagingError::transport(format!("invalid visibility timeout: {e}")))?;

        let mut received = Vec::new();
        for stored in queue.messages.iter_mut() {
            if received.len() >= options.max_messages {
                break;
            }

            let visible = stored.visible_at.is_none_or(|at| at <= now);
            if !visible {
                continue;
            }

            stored.visible_at = Some(now + visibility);
            stored.receive_count += 1;
            queue.total_received.fetch_add(1, Ordering::Relaxed);

            received.push(RawMessage {
                message_id: MessageId::new(stored.id.clone()),
                // Receipt handle == message id for the in-memory provider
                receipt_handle: ReceiptHandle::new(stored.id.clone()),
                body: stored.body.clone(),
                receive_count: stored.receive_count,
                enqueued_at: stored.enqueued_at,
            });
        }

        Ok(received)
    }

    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &ReceiptHandle,
    ) -> Result<(), MessagingError> {
        let mut queues = self.queues.write().await;
        let queue = queues
            .get_mut(queue_url)
            .ok_or_else(|| MessagingError::queue_not_found(queue_url))?;

        let before = queue.messages.len();
        queue.messages.retain(|m| m.id != receipt_handle.as_str());

        // Idempotent: deleting an unknown handle is not an error
        if queue.messages.len() < before {
            queue.total_deleted.fetch_add(1, Ordering::Relaxed);
        }

        Ok(())
    }

    async fn publish_message(
        &self,
        queue_url: &str,
        body: &str,
    ) -> Result<MessageId, MessagingError> {
        let mut queues = self.queues.write().await;
        let queue = queues
            .get_mut(queue_url)
            .ok_or_else(|| MessagingError::queue_not_found(queue_url))?;

        let id = Uuid::new_v4().to_string();
        queue.messages.push_back(StoredMessage {
            id: id.clone(),
            body: body.to_string(),
            enqueued_at: Utc::now(),
            visible_at: None,
            receive_count: 0,
        });
        queue.total_published.fetch_add(1, Ordering::Relaxed);

        Ok(MessageId::new(id))
    }

    fn provider_name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn options(max: usize, visibility_secs: u64) -> ReceiveOptions {
        ReceiveOptions::default()
            .with_max_messages(max)
            .with_visibility_timeout(Duration::from_secs(visibility_secs))
    }

    #[tokio::test]
    async fn test_publish_receive_delete() {
        let transport = InMemoryTransport::with_queues(&["q"]);

        transport.publish_message("q", "body-1").await.unwrap();
        transport.publish_message("q", "body-2").await.unwrap();

        let messages = transport.receive_messages("q", &options(10, 15)).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].body, "body-1");
        assert_eq!(messages[0].receive_count, 1);

        for message in &messages {
            transport
                .delete_message("q", &message.receipt_handle)
                .await
                .unwrap();
        }

        assert_eq!(transport.queue_depth("q").await, 0);
        assert_eq!(transport.deleted_count("q").await, 2);
    }

    #[tokio::test]
    async fn test_received_messages_are_invisible() {
        let transport = InMemoryTransport::with_queues(&["q"]);
        transport.publish_message("q", "body").await.unwrap();

        let first = transport.receive_messages("q", &options(10, 30)).await.unwrap();
        assert_eq!(first.len(), 1);

        // Still within the visibility timeout: nothing to receive
        let second = transport.receive_messages("q", &options(10, 30)).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(transport.queue_depth("q").await, 1);
    }

    #[tokio::test]
    async fn test_visibility_timeout_redelivery() {
        let transport = InMemoryTransport::with_queues(&["q"]);
        transport.publish_message("q", "body").await.unwrap();

        let first = transport
            .receive_messages("q", &options(10, 0))
            .await
            .unwrap();
        assert_eq!(first[0].receive_count, 1);

        // Zero visibility timeout: immediately eligible for redelivery
        let second = transport
            .receive_messages("q", &options(10, 0))
            .await
            .unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].receive_count, 2);
        assert_eq!(second[0].receipt_handle, first[0].receipt_handle);
    }

    #[tokio::test]
    async fn test_max_messages_respected() {
        let transport = InMemoryTransport::with_queues(&["q"]);
        for i in 0..5 {
            transport
                .publish_message("q", &format!("body-{i}"))
                .await
                .unwrap();
        }

        let messages = transport.receive_messages("q", &options(1, 15)).await.unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let transport = InMemoryTransport::with_queues(&["q"]);
        transport.publish_message("q", "body").await.unwrap();

        let messages = transport.receive_messages("q", &options(10, 15)).await.unwrap();
        let receipt = &messages[0].receipt_handle;

        transport.delete_message("q", receipt).await.unwrap();
        transport.delete_message("q", receipt).await.unwrap();
        assert_eq!(transport.deleted_count("q").await, 1);
    }

    #[tokio::test]
    async fn test_unknown_queue_is_an_error() {
        let transport = InMemoryTransport::new();
        let result = transport.receive_messages("missing", &options(10, 15)).await;
        assert!(matches!(
            result,
            Err(MessagingError::QueueNotFound { .. })
        ));
    }
}
