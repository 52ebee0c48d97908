//! # Handler Contract
//!
//! The unit of business logic. A handler implements [`EventHandler::handle`]
//! for its domain work; the provided [`EventHandler::execute`] runs the work
//! and then deletes the message identified by the event's receipt handle.
//!
//! Deletion is part of the handler's own contract, not something the
//! framework does on its behalf: a handler that wants its message redelivered
//! after the visibility timeout fails from `handle` (or overrides `execute`)
//! and the message stays on the queue.

use std::sync::Arc;

use async_trait::async_trait;

use crate::envelope::DispatchableEvent;
use crate::error::HandlerError;
use crate::messaging::{MessagingError, QueueTransport, ReceiptHandle};

/// Shared acknowledgement context handed to handler execution
///
/// Wraps the transport client and target queue identifier, both shared
/// read-only across the consumer's lifetime.
#[derive(Clone)]
pub struct HandlerContext {
    transport: Arc<dyn QueueTransport>,
    queue_url: String,
}

impl HandlerContext {
    /// Create a context for a queue
    pub fn new(transport: Arc<dyn QueueTransport>, queue_url: impl Into<String>) -> Self {
        Self {
            transport,
            queue_url: queue_url.into(),
        }
    }

    /// The queue this context acknowledges against
    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    /// Delete (acknowledge) a message by receipt handle
    pub async fn ack(&self, receipt_handle: &ReceiptHandle) -> Result<(), MessagingError> {
        self.transport
            .delete_message(&self.queue_url, receipt_handle)
            .await
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("queue_url", &self.queue_url)
            .field("provider", &self.transport.provider_name())
            .finish()
    }
}

/// Business-logic contract for a registered event
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use relay_consumer::{DispatchableEvent, EventHandler, HandlerError};
///
/// struct OrderCreatedHandler;
///
/// #[async_trait]
/// impl EventHandler for OrderCreatedHandler {
///     async fn handle(&self, event: &DispatchableEvent) -> Result<(), HandlerError> {
///         let order_id = event.data.get("id").ok_or_else(|| {
///             HandlerError::failed("order.created payload has no id")
///         })?;
///         println!("processing order {order_id}");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Perform the domain work for a decoded event
    async fn handle(&self, event: &DispatchableEvent) -> Result<(), HandlerError>;

    /// Run `handle`, then delete the message on success
    ///
    /// If `handle` fails the message is left undeleted and becomes eligible
    /// for redelivery once the queue's visibility timeout elapses.
    async fn execute(
        &self,
        event: DispatchableEvent,
        ctx: &HandlerContext,
    ) -> Result<(), HandlerError> {
        self.handle(&event).await?;
        ctx.ack(&event.receipt_handle).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;
    use crate::envelope::Envelope;
    use crate::messaging::{InMemoryTransport, ReceiveOptions};

    struct CountingHandler {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _event: &DispatchableEvent) -> Result<(), HandlerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(HandlerError::failed("boom"))
            } else {
                Ok(())
            }
        }
    }

    async fn received_event(transport: &InMemoryTransport) -> DispatchableEvent {
        transport
            .publish_message("q", r#"{"eventName":"x","origin":"o","data":{}}"#)
            .await
            .unwrap();
        let message = transport
            .receive_messages("q", &ReceiveOptions::default())
            .await
            .unwrap()
            .remove(0);
        DispatchableEvent::new(
            Envelope {
                event_name: "x".to_string(),
                origin: "o".to_string(),
                data: json!({}),
            },
            message.receipt_handle,
        )
    }

    #[tokio::test]
    async fn test_execute_deletes_on_success() {
        let transport = Arc::new(InMemoryTransport::with_queues(&["q"]));
        let event = received_event(&transport).await;
        let ctx = HandlerContext::new(transport.clone(), "q");

        let handler = CountingHandler {
            calls: AtomicUsize::new(0),
            fail: false,
        };
        handler.execute(event, &ctx).await.unwrap();

        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
        assert_eq!(transport.queue_depth("q").await, 0);
    }

    #[tokio::test]
    async fn test_failed_handle_leaves_message_undeleted() {
        let transport = Arc::new(InMemoryTransport::with_queues(&["q"]));
        let event = received_event(&transport).await;
        let ctx = HandlerContext::new(transport.clone(), "q");

        let handler = CountingHandler {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let result = handler.execute(event, &ctx).await;

        assert!(result.is_err());
        assert_eq!(transport.queue_depth("q").await, 1);
        assert_eq!(transport.deleted_count("q").await, 0);
    }
}
