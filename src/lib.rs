//! # relay-consumer-rs
//!
//! Queue-consumer framework: polls a message queue, decodes an event
//! envelope, routes the event to a registered handler by event name, and
//! acknowledges (deletes) the message once processing completes.
//!
//! ## Features
//!
//! - **Provider-Agnostic Transport**: the queue backend sits behind the
//!   [`QueueTransport`] trait; an in-memory provider ships for tests and
//!   development
//! - **Dual Consumption Strategies**: one-at-a-time ordering or batched
//!   fan-out/fan-in throughput, selected per consumer
//! - **At-Least-Once Delivery**: handlers delete their own message on
//!   success; failures leave it for redelivery after the visibility timeout
//! - **Poison-Message Handling**: bodies that cannot be validated into an
//!   envelope are logged and deleted, never retried
//! - **Resilient Loop**: transport errors and handler failures back off and
//!   re-poll; nothing terminates the consumer
//!
//! ## Architecture
//!
//! 1. **Envelope**: the logical event `{eventName, origin, data}`, accepted
//!    directly or nested string-encoded in a notification wrapper
//! 2. **Handler Registry**: immutable event-name → handler map, built once at
//!    startup and injected into the consumer
//! 3. **Queue Consumer**: the polling loop with idle/error backoff and the
//!    two dispatch strategies
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use relay_consumer::{
//!     ConsumerConfig, DispatchableEvent, EventHandler, HandlerError,
//!     HandlerRegistry, QueueConsumer, messaging::InMemoryTransport,
//! };
//!
//! struct OrderCreated;
//!
//! #[async_trait]
//! impl EventHandler for OrderCreated {
//!     async fn handle(&self, event: &DispatchableEvent) -> Result<(), HandlerError> {
//!         println!("order payload: {}", event.data);
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! relay_consumer::logging::init_structured_logging();
//!
//! let transport = Arc::new(InMemoryTransport::with_queues(&["orders"]));
//!
//! let registry = HandlerRegistry::builder()
//!     .register("order.created", Arc::new(OrderCreated))?
//!     .build();
//!
//! let consumer = Arc::new(QueueConsumer::new(
//!     transport,
//!     registry,
//!     ConsumerConfig::new("orders"),
//! )?);
//!
//! let loop_handle = consumer.clone().start();
//! // ... until shutdown
//! consumer.stop();
//! loop_handle.await?;
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod consumer;
pub mod envelope;
pub mod error;
pub mod handler;
pub mod logging;
pub mod messaging;
pub mod notify;
pub mod registry;

// Re-export main types
pub use batch::EventBatch;
pub use config::{BatchMode, ConsumerConfig};
pub use consumer::{ConsumerStats, QueueConsumer};
pub use envelope::{decode_envelope, DispatchableEvent, Envelope};
pub use error::{ConsumerError, EnvelopeError, HandlerError, RegistryError, Result};
pub use handler::{EventHandler, HandlerContext};
pub use messaging::{
    InMemoryTransport, MessagingError, QueueTransport, RawMessage, ReceiptHandle,
};
pub use notify::{LogEventData, LogLevel, LogNotifier, LOG_CREATED_EVENT};
pub use registry::{HandlerRegistry, HandlerRegistryBuilder};
