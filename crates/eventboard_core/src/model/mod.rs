//! Event and booking domain model.
//!
//! # Responsibility
//! - Define the persisted record shapes and the caller-facing draft inputs.
//!
//! # Invariants
//! - Every record is identified by a stable UUID assigned at creation.
//! - `created_at`/`updated_at` are epoch milliseconds assigned by the store,
//!   never by callers.
//! - A booking references an event by id only; it does not own the event.

pub mod booking;
pub mod event;

use chrono::Utc;

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}
