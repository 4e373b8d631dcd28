//! Repository layer abstractions and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for events and bookings.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Repository writes run the matching validator before any SQL mutation.
//! - Unique-index violations surface as `RepoError::DuplicateKey`, never as a
//!   silent overwrite.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::{ConnectionError, DbError};
use crate::validate::ValidationError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod booking_repo;
pub mod event_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for every storage-facing operation.
#[derive(Debug)]
pub enum RepoError {
    /// Shared connection could not be established.
    Connection(ConnectionError),
    /// Draft violates a record invariant; nothing was written.
    Validation(ValidationError),
    /// Booking references an event that does not exist.
    DanglingReference(Uuid),
    /// Unique index rejected the write.
    DuplicateKey { field: &'static str, value: String },
    NotFound(Uuid),
    Db(DbError),
    InvalidData(String),
}

impl RepoError {
    /// Stable machine-readable code for callers such as HTTP handlers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connection(_) => "CONNECTION_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::DanglingReference(_) => "DANGLING_REFERENCE",
            Self::DuplicateKey { .. } => "DUPLICATE_KEY",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Db(_) => "STORAGE_ERROR",
            Self::InvalidData(_) => "INVALID_DATA",
        }
    }

    /// Whether the caller can fix the request and try again.
    pub fn is_caller_fixable(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::DanglingReference(_)
                | Self::DuplicateKey { .. }
                | Self::NotFound(_)
        )
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(err) => write!(f, "{err}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::DanglingReference(event_id) => {
                write!(f, "cannot create booking: event {event_id} does not exist")
            }
            Self::DuplicateKey { field, value } => {
                write!(f, "duplicate value `{value}` for unique field `{field}`")
            }
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connection(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::DanglingReference(_)
            | Self::DuplicateKey { .. }
            | Self::NotFound(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ConnectionError> for RepoError {
    fn from(value: ConnectionError) -> Self {
        Self::Connection(value)
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

pub(crate) fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}
