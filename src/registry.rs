//! # Handler Registry
//!
//! Maps an event-name string to its registered handler. The registry is
//! constructed once at startup through a validating builder and is immutable
//! afterward; the consumer receives it by injection rather than through any
//! process-wide state.
//!
//! Unknown event names are not an error at the registry level: absence is a
//! valid, expected outcome, since queues routinely carry event types a given
//! deployment does not yet handle.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use relay_consumer::{DispatchableEvent, EventHandler, HandlerError, HandlerRegistry};
//!
//! struct OrderCreated;
//!
//! #[async_trait]
//! impl EventHandler for OrderCreated {
//!     async fn handle(&self, _event: &DispatchableEvent) -> Result<(), HandlerError> {
//!         Ok(())
//!     }
//! }
//!
//! let registry = HandlerRegistry::builder()
//!     .register("order.created", Arc::new(OrderCreated))
//!     .unwrap()
//!     .build();
//!
//! assert!(registry.get("order.created").is_some());
//! assert!(registry.get("order.deleted").is_none());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::error::RegistryError;
use crate::handler::EventHandler;

/// Immutable event-name → handler map
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl HandlerRegistry {
    /// Start building a registry
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// Look up the handler for an event name
    ///
    /// Pure lookup, no side effects. `None` means no handler is registered
    /// for this event name.
    pub fn get(&self, event_name: &str) -> Option<&Arc<dyn EventHandler>> {
        self.handlers.get(event_name)
    }

    /// Whether a handler is registered for an event name
    pub fn contains(&self, event_name: &str) -> bool {
        self.handlers.contains_key(event_name)
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered event names, for startup diagnostics
    pub fn event_names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("event_names", &self.event_names())
            .finish()
    }
}

/// Builder that validates registrations before freezing the registry
///
/// Rejecting duplicates at registration time keeps typos from silently
/// shadowing a handler until runtime.
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    handlers: HashMap<String, Arc<dyn EventHandler>>,
}

impl HandlerRegistryBuilder {
    /// Register a handler for an event name
    pub fn register(
        mut self,
        event_name: impl Into<String>,
        handler: Arc<dyn EventHandler>,
    ) -> Result<Self, RegistryError> {
        let event_name = event_name.into();

        if event_name.is_empty() {
            return Err(RegistryError::EmptyEventName);
        }
        if self.handlers.contains_key(&event_name) {
            return Err(RegistryError::DuplicateHandler { event_name });
        }

        self.handlers.insert(event_name, handler);
        Ok(self)
    }

    /// Freeze into an immutable registry
    pub fn build(self) -> HandlerRegistry {
        info!(
            handler_count = self.handlers.len(),
            "Handler registry built"
        );
        HandlerRegistry {
            handlers: self.handlers,
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::envelope::DispatchableEvent;
    use crate::error::HandlerError;

    struct NoopHandler;

    #[async_trait]
    impl EventHandler for NoopHandler {
        async fn handle(&self, _event: &DispatchableEvent) -> Result<(), HandlerError> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = HandlerRegistry::builder()
            .register("order.created", Arc::new(NoopHandler))
            .unwrap()
            .register("order.shipped", Arc::new(NoopHandler))
            .unwrap()
            .build();

        assert_eq!(registry.len(), 2);
        assert!(registry.get("order.created").is_some());
        assert!(registry.get("order.cancelled").is_none());
    }

    #[test]
    fn test_absence_is_not_an_error() {
        let registry = HandlerRegistry::builder().build();
        assert!(registry.is_empty());
        assert!(registry.get("anything").is_none());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let result = HandlerRegistry::builder()
            .register("order.created", Arc::new(NoopHandler))
            .unwrap()
            .register("order.created", Arc::new(NoopHandler));

        assert!(matches!(
            result,
            Err(RegistryError::DuplicateHandler { .. })
        ));
    }

    #[test]
    fn test_empty_event_name_rejected() {
        let result = HandlerRegistry::builder().register("", Arc::new(NoopHandler));
        assert!(matches!(result, Err(RegistryError::EmptyEventName)));
    }
}
