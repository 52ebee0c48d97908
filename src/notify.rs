//! # Log-Event Notification
//!
//! Leveled log calls that are emitted through `tracing` and, when a sink is
//! configured, also published to a notification queue as a `logCreated`
//! envelope, the shape consumed by downstream log aggregators:
//!
//! ```json
//! {"eventName": "logCreated", "origin": "<origin>",
//!  "data": {"message": "...", "applicationId": "...", "level": "ERROR"}}
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::envelope::Envelope;
use crate::messaging::{MessagingError, QueueTransport};

/// Event name carried by published log notifications
pub const LOG_CREATED_EVENT: &str = "logCreated";

/// Severity of a log notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    Error,
    Debug,
    Warning,
    Info,
}

/// Payload of a `logCreated` envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEventData {
    /// The log message
    pub message: String,
    /// Identifier of the emitting application, if configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,
    /// Severity level
    pub level: LogLevel,
}

/// Publisher for significant log calls
///
/// Always emits through `tracing`; when a sink queue is configured, also
/// publishes the `logCreated` envelope so remote aggregators receive the
/// same event. Publish failures surface to the caller; the transport's
/// retry semantics are its own.
#[derive(Clone, Default)]
pub struct LogNotifier {
    application_id: Option<String>,
    sink: Option<(Arc<dyn QueueTransport>, String)>,
}

impl LogNotifier {
    /// Create a notifier that only emits through `tracing`
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the application identifier included in published payloads
    pub fn with_application_id(mut self, application_id: impl Into<String>) -> Self {
        self.application_id = Some(application_id.into());
        self
    }

    /// Attach a notification sink queue
    pub fn with_sink(
        mut self,
        transport: Arc<dyn QueueTransport>,
        queue_url: impl Into<String>,
    ) -> Self {
        self.sink = Some((transport, queue_url.into()));
        self
    }

    /// Log at ERROR level
    pub async fn error(&self, message: &str, origin: &str) -> Result<(), MessagingError> {
        self.handle_log(LogLevel::Error, message, origin).await
    }

    /// Log at WARNING level
    pub async fn warning(&self, message: &str, origin: &str) -> Result<(), MessagingError> {
        self.handle_log(LogLevel::Warning, message, origin).await
    }

    /// Log at INFO level
    pub async fn info(&self, message: &str, origin: &str) -> Result<(), MessagingError> {
        self.handle_log(LogLevel::Info, message, origin).await
    }

    /// Log at DEBUG level
    pub async fn debug(&self, message: &str, origin: &str) -> Result<(), MessagingError> {
        self.handle_log(LogLevel::Debug, message, origin).await
    }

    async fn handle_log(
        &self,
        level: LogLevel,
        message: &str,
        origin: &str,
    ) -> Result<(), MessagingError> {
        match level {
            LogLevel::Error => error!(origin = origin, "{message}"),
            LogLevel::Warning => warn!(origin = origin, "{message}"),
            LogLevel::Info => info!(origin = origin, "{message}"),
            LogLevel::Debug => debug!(origin = origin, "{message}"),
        }

        let Some((transport, queue_url)) = &self.sink else {
            return Ok(());
        };

        let envelope = Envelope {
            event_name: LOG_CREATED_EVENT.to_string(),
            origin: origin.to_string(),
            data: serde_json::to_value(LogEventData {
                message: message.to_string(),
                application_id: self.application_id.clone(),
                level,
            })?,
        };
        let body = serde_json::to_string(&envelope)?;

        transport.publish_message(queue_url, &body).await?;
        Ok(())
    }
}

impl std::fmt::Debug for LogNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogNotifier")
            .field("application_id", &self.application_id)
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::envelope::decode_envelope;
    use crate::messaging::InMemoryTransport;

    #[test]
    fn test_level_wire_format() {
        assert_eq!(serde_json::to_value(LogLevel::Error).unwrap(), json!("ERROR"));
        assert_eq!(serde_json::to_value(LogLevel::Warning).unwrap(), json!("WARNING"));
        assert_eq!(serde_json::to_value(LogLevel::Debug).unwrap(), json!("DEBUG"));
        assert_eq!(serde_json::to_value(LogLevel::Info).unwrap(), json!("INFO"));
    }

    #[tokio::test]
    async fn test_without_sink_only_traces() {
        let notifier = LogNotifier::new();
        notifier.error("boom", "tests").await.unwrap();
    }

    #[tokio::test]
    async fn test_publishes_log_created_envelope() {
        let transport = Arc::new(InMemoryTransport::with_queues(&["logs"]));
        let notifier = LogNotifier::new()
            .with_application_id("app-1")
            .with_sink(transport.clone(), "logs");

        notifier.error("something failed", "orders").await.unwrap();

        let bodies = transport.drain_queue("logs").await;
        assert_eq!(bodies.len(), 1);

        let envelope = decode_envelope(&bodies[0]).unwrap();
        assert_eq!(envelope.event_name, LOG_CREATED_EVENT);
        assert_eq!(envelope.origin, "orders");
        assert_eq!(
            envelope.data,
            json!({"message": "something failed", "applicationId": "app-1", "level": "ERROR"})
        );
    }

    #[tokio::test]
    async fn test_application_id_absent_when_unset() {
        let transport = Arc::new(InMemoryTransport::with_queues(&["logs"]));
        let notifier = LogNotifier::new().with_sink(transport.clone(), "logs");

        notifier.info("hello", "tests").await.unwrap();

        let bodies = transport.drain_queue("logs").await;
        let envelope = decode_envelope(&bodies[0]).unwrap();
        assert!(envelope.data.get("applicationId").is_none());
        assert_eq!(envelope.data["level"], json!("INFO"));
    }
}
