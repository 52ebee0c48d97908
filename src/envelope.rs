//! # Event Envelope
//!
//! Decoding and validation of the logical event structure carried in queue
//! message bodies. Two wire shapes are accepted:
//!
//! - Direct: `{"data": <any>, "eventName": "<string>", "origin": "<string>"}`
//! - Wrapped: `{"message": "<json-string of the direct form>"}`, the shape
//!   produced when a notification service relays the envelope as a
//!   string-encoded payload (double decode).
//!
//! A body that fails to parse, or parses without the required fields, is a
//! poison message: the consumer deletes it without dispatch, since retrying
//! cannot fix a structurally invalid payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EnvelopeError;
use crate::messaging::ReceiptHandle;

/// The logical event structure `{eventName, origin, data}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Event name used for handler lookup
    pub event_name: String,
    /// Originating system or service
    pub origin: String,
    /// Arbitrary structured payload
    pub data: Value,
}

/// An [`Envelope`] paired with the receipt handle of its originating message
///
/// Created per message at decode time, handed to exactly one handler, never
/// mutated afterward.
#[derive(Debug, Clone)]
pub struct DispatchableEvent {
    /// Handle the owning handler uses to delete its message
    pub receipt_handle: ReceiptHandle,
    /// Event name used for handler lookup
    pub event_name: String,
    /// Originating system or service
    pub origin: String,
    /// Arbitrary structured payload
    pub data: Value,
}

impl DispatchableEvent {
    /// Pair a decoded envelope with its message's receipt handle
    pub fn new(envelope: Envelope, receipt_handle: ReceiptHandle) -> Self {
        Self {
            receipt_handle,
            event_name: envelope.event_name,
            origin: envelope.origin,
            data: envelope.data,
        }
    }
}

/// Decode and validate a message body into an [`Envelope`]
///
/// Pure function of the input: decoding the same body twice yields the same
/// outcome. The wrapper key is `message`; the capitalized `Message` emitted
/// by upstream notification relays is accepted as well.
pub fn decode_envelope(body: &str) -> Result<Envelope, EnvelopeError> {
    let parsed: Value = serde_json::from_str(body)?;

    // Notification-wrapper case: the envelope is string-encoded one level down
    let envelope_value = match wrapped_payload(&parsed) {
        Some(inner) => serde_json::from_str(inner)?,
        None => parsed,
    };

    validate(envelope_value)
}

fn wrapped_payload(value: &Value) -> Option<&str> {
    value
        .get("message")
        .or_else(|| value.get("Message"))
        .and_then(Value::as_str)
}

fn validate(value: Value) -> Result<Envelope, EnvelopeError> {
    let event_name = required_string(&value, "eventName")?;
    let origin = required_string(&value, "origin")?;

    let data = match value.get("data") {
        None | Some(Value::Null) => return Err(EnvelopeError::MissingField { field: "data" }),
        Some(data) => data.clone(),
    };

    Ok(Envelope {
        event_name,
        origin,
        data,
    })
}

fn required_string(value: &Value, field: &'static str) -> Result<String, EnvelopeError> {
    match value.get(field) {
        None | Some(Value::Null) => Err(EnvelopeError::MissingField { field }),
        Some(Value::String(s)) if s.is_empty() => Err(EnvelopeError::InvalidField {
            field,
            reason: "cannot be empty".to_string(),
        }),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(EnvelopeError::InvalidField {
            field,
            reason: format!("expected a string, got {other}"),
        }),
    }
}
