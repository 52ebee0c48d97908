//! # Event Batch
//!
//! Accumulator for the decoded events of one poll cycle in concurrent mode.
//! Rebuilt fresh each cycle, never shared across cycles.

use crate::envelope::DispatchableEvent;

/// Ordered accumulator of pending decoded events
#[derive(Debug, Default)]
pub struct EventBatch {
    events: Vec<DispatchableEvent>,
}

impl EventBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to the batch
    pub fn add(&mut self, event: DispatchableEvent) {
        self.events.push(event);
    }

    /// Clear the batch
    pub fn reset(&mut self) {
        self.events.clear();
    }

    /// Take all accumulated events, leaving the batch empty
    pub fn drain(&mut self) -> Vec<DispatchableEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the batch has no pending events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::messaging::ReceiptHandle;

    fn event(name: &str) -> DispatchableEvent {
        DispatchableEvent {
            receipt_handle: ReceiptHandle::new(name),
            event_name: name.to_string(),
            origin: "test".to_string(),
            data: json!({}),
        }
    }

    #[test]
    fn test_add_preserves_order() {
        let mut batch = EventBatch::new();
        batch.add(event("a"));
        batch.add(event("b"));
        batch.add(event("c"));

        let drained = batch.drain();
        let names: Vec<_> = drained.iter().map(|e| e.event_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_reset_clears_pending_events() {
        let mut batch = EventBatch::new();
        batch.add(event("a"));
        assert_eq!(batch.len(), 1);

        batch.reset();
        assert!(batch.is_empty());
        assert!(batch.drain().is_empty());
    }
}
