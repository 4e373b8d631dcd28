//! Core storage layer for the event listing application.
//! This crate is the single source of truth for event and booking invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod validate;

pub use config::{AppConfig, ConfigError};
pub use db::{ConnectionError, ConnectionManager, ConnectionState, Connector, DbHandle};
pub use logging::{default_log_level, init_logging, logging_status, LogTarget};
pub use model::booking::{Booking, BookingDraft, BookingId};
pub use model::event::{Event, EventDraft, EventId};
pub use repo::booking_repo::{BookingRepository, SqliteBookingRepository};
pub use repo::event_repo::{EventListQuery, EventRepository, SqliteEventRepository};
pub use repo::{RepoError, RepoResult};
pub use service::listing_service::ListingService;
pub use validate::normalize::{derive_slug, normalize_date, normalize_time};
pub use validate::ValidationError;

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
