//! # Structured Logging Module
//!
//! Environment-aware `tracing` bootstrap for consumer processes. Plain
//! console output in development, JSON in production so log pipelines get
//! structured fields.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
///
/// Safe to call more than once; only the first call installs a subscriber.
/// `RUST_LOG` overrides the environment-derived default level.
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_log_level(&environment)));

        let json_output = environment == "production";

        let subscriber = tracing_subscriber::registry().with(if json_output {
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        });

        // try_init: the embedding application may have installed its own
        // subscriber already
        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        }

        tracing::info!(
            environment = %environment,
            json = json_output,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("RELAY_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Default log level for an environment
fn default_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_levels() {
        assert_eq!(default_log_level("production"), "info");
        assert_eq!(default_log_level("development"), "debug");
        assert_eq!(default_log_level("test"), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
    }
}
