//! Booking record and draft input.

use super::event::EventId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type BookingId = Uuid;

/// Persisted seat reservation for an event.
///
/// `event_id` resolved to an existing event when the booking was committed.
/// Nothing keeps it resolvable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub event_id: EventId,
    /// Trimmed and lowercased.
    pub email: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Caller-supplied booking fields, prior to validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    pub event_id: EventId,
    #[serde(default)]
    pub email: Option<String>,
}

impl BookingDraft {
    pub fn new(event_id: EventId, email: impl Into<String>) -> Self {
        Self {
            event_id,
            email: Some(email.into()),
        }
    }
}
