//! Booking pre-commit pipeline.
//!
//! # Invariants
//! - Email is checked before the referenced event is looked up.
//! - The lookup is a plain read; callers that need the check and the insert
//!   to be atomic must run both inside one transaction.

use super::ValidationError;
use crate::model::booking::BookingDraft;
use crate::model::event::EventId;
use crate::repo::event_repo::EventRepository;
use crate::repo::{RepoError, RepoResult};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Booking fields in their persisted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedBooking {
    pub event_id: EventId,
    pub email: String,
}

/// Trims, checks and lowercases an email address.
///
/// # Errors
/// - `MissingField("email")` when absent or blank.
/// - `InvalidEmail` when not shaped like `local@domain.tld`.
pub fn normalize_email(input: Option<&str>) -> Result<String, ValidationError> {
    let trimmed = input
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ValidationError::MissingField("email"))?;

    if !EMAIL_RE.is_match(trimmed) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(trimmed.to_lowercase())
}

/// Validates a booking draft against the event store.
///
/// # Errors
/// - `RepoError::Validation` for email problems.
/// - `RepoError::DanglingReference` when the event does not exist.
/// - Storage errors from the lookup, unchanged.
pub fn validate_booking<R>(draft: &BookingDraft, events: &R) -> RepoResult<NormalizedBooking>
where
    R: EventRepository + ?Sized,
{
    let email = normalize_email(draft.email.as_deref())?;

    if !events.event_exists(draft.event_id)? {
        return Err(RepoError::DanglingReference(draft.event_id));
    }

    Ok(NormalizedBooking {
        event_id: draft.event_id,
        email,
    })
}

#[cfg(test)]
mod tests {
    use super::normalize_email;
    use crate::validate::ValidationError;

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(
            normalize_email(Some("  Ada.Lovelace@Example.COM ")).unwrap(),
            "ada.lovelace@example.com"
        );
    }

    #[test]
    fn blank_email_is_missing() {
        assert_eq!(
            normalize_email(None),
            Err(ValidationError::MissingField("email"))
        );
        assert_eq!(
            normalize_email(Some("   ")),
            Err(ValidationError::MissingField("email"))
        );
    }

    #[test]
    fn malformed_email_is_rejected() {
        for input in [
            "ada",
            "ada@",
            "@example.com",
            "ada@example",
            "ada lovelace@example.com",
            "a@b@c.d",
        ] {
            assert_eq!(
                normalize_email(Some(input)),
                Err(ValidationError::InvalidEmail),
                "`{input}` should be rejected"
            );
        }
    }
}
