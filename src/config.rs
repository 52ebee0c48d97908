//! # Consumer Configuration
//!
//! Constructor-time configuration for [`QueueConsumer`](crate::QueueConsumer);
//! immutable once the consumer is built. Defaults follow the queue-side
//! conventions: 15s visibility timeout, 2s poll backoff, all attributes
//! selected, concurrent batches of 10.

use std::time::Duration;

use crate::error::{ConsumerError, Result};
use crate::messaging::ReceiveOptions;

/// Default visibility timeout in seconds
pub const DEFAULT_VISIBILITY_TIMEOUT_SECS: u64 = 15;
/// Default backoff between polls that return nothing or fail, in seconds
pub const DEFAULT_POLL_BACKOFF_SECS: u64 = 2;
/// Batch size used in concurrent mode
pub const CONCURRENT_BATCH_SIZE: usize = 10;

/// Consumption strategy for a poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchMode {
    /// Receive up to ten messages and dispatch them as a fan-out/fan-in join
    #[default]
    Concurrent,
    /// Receive one message per cycle and dispatch it sequentially
    Single,
}

impl BatchMode {
    /// Maximum messages requested per receive call in this mode
    pub fn max_messages(self) -> usize {
        match self {
            Self::Concurrent => CONCURRENT_BATCH_SIZE,
            Self::Single => 1,
        }
    }
}

impl std::str::FromStr for BatchMode {
    type Err = ConsumerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "concurrent" => Ok(Self::Concurrent),
            "single" => Ok(Self::Single),
            other => Err(ConsumerError::config(format!(
                "Invalid batch mode '{other}' (expected 'concurrent' or 'single')"
            ))),
        }
    }
}

/// Configuration for the queue consumer
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// URL (or provider-specific identifier) of the queue to consume
    pub queue_url: String,
    /// Consumption strategy
    pub batch_mode: BatchMode,
    /// How long received messages stay invisible to other consumers
    pub visibility_timeout: Duration,
    /// Sleep applied when a poll fails or returns nothing
    pub poll_backoff: Duration,
    /// Message-attribute selectors forwarded to the transport
    pub message_attribute_names: Vec<String>,
    /// System-attribute selectors forwarded to the transport
    pub attribute_names: Vec<String>,
}

impl ConsumerConfig {
    /// Create a configuration with defaults for everything but the queue URL
    pub fn new(queue_url: impl Into<String>) -> Self {
        Self {
            queue_url: queue_url.into(),
            batch_mode: BatchMode::default(),
            visibility_timeout: Duration::from_secs(DEFAULT_VISIBILITY_TIMEOUT_SECS),
            poll_backoff: Duration::from_secs(DEFAULT_POLL_BACKOFF_SECS),
            message_attribute_names: vec!["All".to_string()],
            attribute_names: vec!["All".to_string()],
        }
    }

    /// Set the consumption strategy
    pub fn with_batch_mode(mut self, mode: BatchMode) -> Self {
        self.batch_mode = mode;
        self
    }

    /// Set the visibility timeout
    pub fn with_visibility_timeout(mut self, timeout: Duration) -> Self {
        self.visibility_timeout = timeout;
        self
    }

    /// Set the poll backoff
    pub fn with_poll_backoff(mut self, backoff: Duration) -> Self {
        self.poll_backoff = backoff;
        self
    }

    /// Load configuration from `RELAY_*` environment variables
    ///
    /// `RELAY_QUEUE_URL` is required; `RELAY_BATCH_MODE`,
    /// `RELAY_VISIBILITY_TIMEOUT_SECS`, and `RELAY_POLL_BACKOFF_SECS`
    /// override their defaults.
    pub fn from_env() -> Result<Self> {
        let queue_url = std::env::var("RELAY_QUEUE_URL")
            .map_err(|_| ConsumerError::config("RELAY_QUEUE_URL must be set"))?;

        let mut config = Self::new(queue_url);

        if let Ok(mode) = std::env::var("RELAY_BATCH_MODE") {
            config.batch_mode = mode.parse()?;
        }

        if let Ok(secs) = std::env::var("RELAY_VISIBILITY_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|e| {
                ConsumerError::config(format!("Invalid RELAY_VISIBILITY_TIMEOUT_SECS: {e}"))
            })?;
            config.visibility_timeout = Duration::from_secs(secs);
        }

        if let Ok(secs) = std::env::var("RELAY_POLL_BACKOFF_SECS") {
            let secs: u64 = secs.parse().map_err(|e| {
                ConsumerError::config(format!("Invalid RELAY_POLL_BACKOFF_SECS: {e}"))
            })?;
            config.poll_backoff = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.queue_url.is_empty() {
            return Err(ConsumerError::config("queue_url cannot be empty"));
        }

        if self.visibility_timeout.is_zero() {
            return Err(ConsumerError::config("visibility_timeout must be non-zero"));
        }

        if self.poll_backoff.is_zero() {
            return Err(ConsumerError::config("poll_backoff must be non-zero"));
        }

        Ok(())
    }

    /// Receive options derived from this configuration
    pub fn receive_options(&self) -> ReceiveOptions {
        ReceiveOptions {
            max_messages: self.batch_mode.max_messages(),
            visibility_timeout: self.visibility_timeout,
            message_attribute_names: self.message_attribute_names.clone(),
            attribute_names: self.attribute_names.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConsumerConfig::new("https://queue.example/events");
        assert_eq!(config.batch_mode, BatchMode::Concurrent);
        assert_eq!(config.visibility_timeout, Duration::from_secs(15));
        assert_eq!(config.poll_backoff, Duration::from_secs(2));
        assert_eq!(config.message_attribute_names, vec!["All".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_batch_mode_sizes() {
        assert_eq!(BatchMode::Concurrent.max_messages(), 10);
        assert_eq!(BatchMode::Single.max_messages(), 1);
    }

    #[test]
    fn test_batch_mode_parsing() {
        assert_eq!("concurrent".parse::<BatchMode>().unwrap(), BatchMode::Concurrent);
        assert_eq!("Single".parse::<BatchMode>().unwrap(), BatchMode::Single);
        assert!("both".parse::<BatchMode>().is_err());
    }

    #[test]
    fn test_validation_rejects_empty_queue_url() {
        let config = ConsumerConfig::new("");
        assert!(matches!(
            config.validate(),
            Err(ConsumerError::Configuration { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_zero_durations() {
        let config =
            ConsumerConfig::new("q").with_visibility_timeout(Duration::ZERO);
        assert!(config.validate().is_err());

        let config = ConsumerConfig::new("q").with_poll_backoff(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_receive_options_follow_batch_mode() {
        let config = ConsumerConfig::new("q").with_batch_mode(BatchMode::Single);
        let opts = config.receive_options();
        assert_eq!(opts.max_messages, 1);
        assert_eq!(opts.visibility_timeout, config.visibility_timeout);
    }
}
