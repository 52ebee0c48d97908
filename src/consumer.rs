//! # Queue Consumer
//!
//! Polling-based consumer: receives raw messages, decodes and validates each
//! body into an event envelope, dispatches events to registered handlers, and
//! applies a sleep-backoff when polling fails or returns nothing.
//!
//! ## Architecture
//!
//! - **Polling Loop**: one logical loop; cycle N+1's receive never starts
//!   before cycle N's dispatch fully settles
//! - **Dual Strategies**: one-at-a-time (`BatchMode::Single`) or
//!   batched fan-out/fan-in (`BatchMode::Concurrent`, the default)
//! - **Poison Handling**: malformed bodies are logged and deleted, never retried
//! - **Error Handling**: transport and handler failures back off and re-poll;
//!   nothing terminates the loop
//! - **Observability**: atomic counters exposed via [`ConsumerStats`]
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use relay_consumer::{
//!     ConsumerConfig, HandlerRegistry, QueueConsumer,
//!     messaging::InMemoryTransport,
//! };
//!
//! # async fn example(registry: HandlerRegistry) -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(InMemoryTransport::with_queues(&["events"]));
//! let config = ConsumerConfig::new("events");
//!
//! let consumer = Arc::new(QueueConsumer::new(transport, registry, config)?);
//! let loop_handle = consumer.clone().start();
//!
//! // ... until shutdown
//! consumer.stop();
//! loop_handle.await?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

use crate::batch::EventBatch;
use crate::config::{BatchMode, ConsumerConfig};
use crate::envelope::{decode_envelope, DispatchableEvent};
use crate::error::{ConsumerError, Result};
use crate::handler::HandlerContext;
use crate::messaging::{QueueTransport, RawMessage, ReceiveOptions};
use crate::registry::HandlerRegistry;

/// Statistics for consumer observability
#[derive(Debug, Default)]
pub struct ConsumerStats {
    /// Total number of polling cycles executed
    pub polling_cycles: AtomicU64,
    /// Total number of events successfully processed
    pub events_processed: AtomicU64,
    /// Total number of events whose handler failed
    pub events_failed: AtomicU64,
    /// Total number of poison messages deleted
    pub poison_messages: AtomicU64,
    /// Total number of events with no registered handler
    pub handlers_missing: AtomicU64,
}

impl ConsumerStats {
    pub fn get_polling_cycles(&self) -> u64 {
        self.polling_cycles.load(Ordering::Relaxed)
    }

    pub fn get_events_processed(&self) -> u64 {
        self.events_processed.load(Ordering::Relaxed)
    }

    pub fn get_events_failed(&self) -> u64 {
        self.events_failed.load(Ordering::Relaxed)
    }

    pub fn get_poison_messages(&self) -> u64 {
        self.poison_messages.load(Ordering::Relaxed)
    }

    pub fn get_handlers_missing(&self) -> u64 {
        self.handlers_missing.load(Ordering::Relaxed)
    }
}

/// Queue consumer that polls a queue and dispatches envelope events
///
/// The transport client and target queue identifier are shared read-only for
/// the consumer's lifetime; the registry is immutable and injected at
/// construction.
///
/// No timeout is imposed on individual handler execution: a hanging handler
/// stalls its batch and therefore the next poll cycle. Handlers that talk to
/// slow collaborators should bound their own work.
pub struct QueueConsumer {
    transport: Arc<dyn QueueTransport>,
    registry: HandlerRegistry,
    config: ConsumerConfig,
    receive_options: ReceiveOptions,
    ctx: HandlerContext,
    running: Arc<AtomicBool>,
    shutdown: broadcast::Sender<()>,
    stats: Arc<ConsumerStats>,
}

impl QueueConsumer {
    /// Create a new consumer
    ///
    /// Validates the configuration; the registry is frozen from here on.
    pub fn new(
        transport: Arc<dyn QueueTransport>,
        registry: HandlerRegistry,
        config: ConsumerConfig,
    ) -> Result<Self> {
        config.validate()?;

        let receive_options = config.receive_options();
        let ctx = HandlerContext::new(transport.clone(), config.queue_url.clone());
        let (shutdown, _) = broadcast::channel(1);

        Ok(Self {
            transport,
            registry,
            config,
            receive_options,
            ctx,
            running: Arc::new(AtomicBool::new(false)),
            shutdown,
            stats: Arc::new(ConsumerStats::default()),
        })
    }

    /// Start the polling loop on the current runtime
    ///
    /// Returns the loop's join handle; the loop runs until [`stop`](Self::stop)
    /// is called. Receive calls, backoff sleeps, and the batch join are all
    /// cancellation points.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        info!(
            queue = %self.config.queue_url,
            mode = ?self.config.batch_mode,
            provider = self.transport.provider_name(),
            handlers = self.registry.len(),
            "Queue consumer started"
        );

        self.running.store(true, Ordering::SeqCst);

        let consumer = self.clone();
        tokio::spawn(async move { consumer.polling_loop().await })
    }

    /// Stop the polling loop
    ///
    /// Flips the running flag and fires the shutdown signal so any in-flight
    /// receive, sleep, or batch join is cancelled.
    pub fn stop(&self) {
        info!(queue = %self.config.queue_url, "Stopping queue consumer");
        self.running.store(false, Ordering::SeqCst);
        let _ = self.shutdown.send(());
    }

    /// Whether the polling loop is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Consumer statistics
    pub fn stats(&self) -> Arc<ConsumerStats> {
        self.stats.clone()
    }

    /// Main polling loop: POLLING → {DISPATCHING, IDLE_BACKOFF, ERROR_BACKOFF} → POLLING
    async fn polling_loop(self: Arc<Self>) {
        let mut shutdown = self.shutdown.subscribe();

        while self.running.load(Ordering::SeqCst) {
            tokio::select! {
                _ = shutdown.recv() => break,
                result = self.poll_once() => {
                    if let Err(e) = result {
                        error!(
                            queue = %self.config.queue_url,
                            error = %e,
                            "Poll cycle failed; backing off"
                        );
                        tokio::select! {
                            _ = shutdown.recv() => break,
                            _ = tokio::time::sleep(self.config.poll_backoff) => {}
                        }
                    }
                }
            }
        }

        info!(queue = %self.config.queue_url, "Queue consumer stopped");
    }

    /// Execute a single poll cycle: receive, dispatch, idle-backoff if empty
    ///
    /// Public as the deterministic seam for drivers and tests; the loop is
    /// just this in a cancellation-aware retry envelope.
    #[instrument(skip(self), fields(queue = %self.config.queue_url))]
    pub async fn poll_once(&self) -> Result<()> {
        self.stats.polling_cycles.fetch_add(1, Ordering::Relaxed);

        let messages = self
            .transport
            .receive_messages(&self.config.queue_url, &self.receive_options)
            .await?;

        if messages.is_empty() {
            debug!("No messages received; idle backoff");
            tokio::time::sleep(self.config.poll_backoff).await;
            return Ok(());
        }

        debug!(count = messages.len(), "Dispatching received messages");

        match self.config.batch_mode {
            BatchMode::Single => self.consume_sequential(messages).await,
            BatchMode::Concurrent => self.consume_concurrent(messages).await,
        }
    }

    /// One-at-a-time strategy: decode and dispatch each message in order
    ///
    /// A handler failure propagates immediately; with a batch size of one
    /// there is nothing else in the cycle to block.
    async fn consume_sequential(&self, messages: Vec<RawMessage>) -> Result<()> {
        for message in messages {
            let Some(event) = self.classify(message).await? else {
                continue;
            };

            let Some(handler) = self.registry.get(&event.event_name) else {
                self.on_handler_missing(&event);
                continue;
            };

            let event_name = event.event_name.clone();
            match handler.execute(event, &self.ctx).await {
                Ok(()) => {
                    self.stats.events_processed.fetch_add(1, Ordering::Relaxed);
                }
                Err(source) => {
                    self.stats.events_failed.fetch_add(1, Ordering::Relaxed);
                    return Err(ConsumerError::Handler { event_name, source });
                }
            }
        }

        Ok(())
    }

    /// Batched strategy: classify every message, then dispatch the whole
    /// batch as a fan-out/fan-in join
    ///
    /// Poison messages are deleted during classification and excluded from
    /// the batch; the remainder of the batch still proceeds.
    async fn consume_concurrent(&self, messages: Vec<RawMessage>) -> Result<()> {
        // Rebuilt fresh each cycle; never shared across cycles
        let mut batch = EventBatch::new();

        for message in messages {
            if let Some(event) = self.classify(message).await? {
                batch.add(event);
            }
        }

        self.dispatch_batch(batch.drain()).await
    }

    /// Fan-out/fan-in dispatch of one cycle's batch
    ///
    /// All matched handlers start together and the cycle waits for every one
    /// of them. Individual outcomes are collected rather than failing the
    /// join on first error: a failed handler leaves its own message for
    /// redelivery while sibling successes keep their deletions. A cycle with
    /// any failure reports [`ConsumerError::PartialDispatch`] so the loop
    /// applies the courtesy backoff; nothing is rolled back.
    async fn dispatch_batch(&self, events: Vec<DispatchableEvent>) -> Result<()> {
        let mut executions = Vec::with_capacity(events.len());

        for event in events {
            let Some(handler) = self.registry.get(&event.event_name) else {
                self.on_handler_missing(&event);
                continue;
            };

            let handler = handler.clone();
            let ctx = self.ctx.clone();
            executions.push(async move {
                let event_name = event.event_name.clone();
                handler
                    .execute(event, &ctx)
                    .await
                    .map_err(|error| (event_name, error))
            });
        }

        let total = executions.len();
        let results = join_all(executions).await;

        let mut failed = 0;
        for result in results {
            match result {
                Ok(()) => {
                    self.stats.events_processed.fetch_add(1, Ordering::Relaxed);
                }
                Err((event_name, error)) => {
                    failed += 1;
                    self.stats.events_failed.fetch_add(1, Ordering::Relaxed);
                    error!(
                        event_name = %event_name,
                        error = %error,
                        "Handler execution failed; message left for redelivery"
                    );
                }
            }
        }

        if failed > 0 {
            Err(ConsumerError::PartialDispatch { failed, total })
        } else {
            Ok(())
        }
    }

    /// Decode and validate one raw message
    ///
    /// Returns the dispatchable event, or `None` for a poison message, which
    /// is logged (with the raw body, for diagnosis) and deleted; retrying
    /// cannot fix a structurally invalid payload. A delete failure is a
    /// transport error and propagates.
    async fn classify(&self, message: RawMessage) -> Result<Option<DispatchableEvent>> {
        match decode_envelope(&message.body) {
            Ok(envelope) => Ok(Some(DispatchableEvent::new(envelope, message.receipt_handle))),
            Err(e) => {
                self.stats.poison_messages.fetch_add(1, Ordering::Relaxed);
                error!(
                    error = %e,
                    body = %message.body,
                    message_id = %message.message_id,
                    "Poison message; deleting without dispatch"
                );
                self.transport
                    .delete_message(&self.config.queue_url, &message.receipt_handle)
                    .await?;
                Ok(None)
            }
        }
    }

    fn on_handler_missing(&self, event: &DispatchableEvent) {
        self.stats.handlers_missing.fetch_add(1, Ordering::Relaxed);
        // Left undeleted: redelivered after the visibility timeout, or
        // inspected manually
        warn!(
            event_name = %event.event_name,
            origin = %event.origin,
            "Handler not found"
        );
    }
}

impl std::fmt::Debug for QueueConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueConsumer")
            .field("queue_url", &self.config.queue_url)
            .field("batch_mode", &self.config.batch_mode)
            .field("provider", &self.transport.provider_name())
            .field("running", &self.is_running())
            .finish()
    }
}
