//! Pre-commit validation and normalization pipelines.
//!
//! # Responsibility
//! - Normalize caller-supplied drafts into the exact shape that is persisted.
//! - Reject drafts that violate record invariants before any write happens.
//!
//! # Invariants
//! - Validators are pure apart from the event lookup issued for bookings.
//! - The first violation aborts the pipeline; no partial result escapes.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod booking;
pub mod event;
pub mod normalize;

/// Caller-fixable violation detected before commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required string field is absent or blank after trimming.
    MissingField(&'static str),
    /// List field is absent, not a list of strings, or empty after filtering.
    EmptyCollection(&'static str),
    /// Input could not be parsed as a calendar date.
    InvalidDate(String),
    /// Input is not `H:MM`/`HH:MM` within 00:00..=23:59.
    InvalidTime(String),
    /// Email does not have a `local@domain.tld` shape.
    InvalidEmail,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "field `{field}` is required"),
            Self::EmptyCollection(field) => {
                write!(f, "field `{field}` must be a non-empty list of non-empty strings")
            }
            Self::InvalidDate(value) => write!(f, "invalid event date `{value}`"),
            Self::InvalidTime(value) => {
                write!(f, "invalid event time `{value}`; expected HH:MM 24-hour format")
            }
            Self::InvalidEmail => write!(f, "a valid email address is required"),
        }
    }
}

impl Error for ValidationError {}
