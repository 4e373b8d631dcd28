//! Event listing use-case service.
//!
//! # Responsibility
//! - Provide the repository-style entry points used by outer layers
//!   (HTTP handlers, CLI).
//! - Obtain the shared connection from `ConnectionManager` for every call.
//!
//! # Invariants
//! - Service APIs never bypass repository validation.
//! - A booking's event lookup and its insert run in one `IMMEDIATE`
//!   transaction, so an event delete cannot land between them.
//! - Log lines carry ids and error codes only, never emails or free text.

use crate::db::ConnectionManager;
use crate::model::booking::{Booking, BookingDraft, BookingId};
use crate::model::event::{Event, EventDraft, EventId};
use crate::repo::booking_repo::{BookingRepository, SqliteBookingRepository};
use crate::repo::event_repo::{EventListQuery, EventRepository, SqliteEventRepository};
use crate::repo::RepoResult;
use log::{info, warn};
use rusqlite::{Connection, TransactionBehavior};
use std::sync::Arc;

/// Facade over the event and booking repositories.
#[derive(Debug, Clone)]
pub struct ListingService {
    manager: Arc<ConnectionManager>,
}

impl ListingService {
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Validates and stores a new event.
    ///
    /// # Errors
    /// - `Validation` when the draft is rejected.
    /// - `DuplicateKey` when another event already owns the derived slug.
    pub fn create_event(&self, draft: &EventDraft) -> RepoResult<Event> {
        let result = self.with_conn(|conn| SqliteEventRepository::new(conn).create_event(draft));
        match &result {
            Ok(event) => info!(
                "event=event_create module=service status=ok event_id={}",
                event.id
            ),
            Err(err) => warn!(
                "event=event_create module=service status=error error_code={}",
                err.error_code()
            ),
        }
        result
    }

    /// Re-validates a full draft against the stored event and saves it.
    ///
    /// The slug changes only when the title does.
    pub fn update_event(&self, id: EventId, draft: &EventDraft) -> RepoResult<Event> {
        let result = self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let event = SqliteEventRepository::new(&tx).update_event(id, draft)?;
            tx.commit()?;
            Ok(event)
        });
        if let Err(err) = &result {
            warn!(
                "event=event_update module=service status=error event_id={} error_code={}",
                id,
                err.error_code()
            );
        }
        result
    }

    pub fn get_event(&self, id: EventId) -> RepoResult<Option<Event>> {
        self.with_conn(|conn| SqliteEventRepository::new(conn).get_event(id))
    }

    pub fn get_event_by_slug(&self, slug: &str) -> RepoResult<Option<Event>> {
        self.with_conn(|conn| SqliteEventRepository::new(conn).get_event_by_slug(slug))
    }

    pub fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<Event>> {
        self.with_conn(|conn| SqliteEventRepository::new(conn).list_events(query))
    }

    /// Deletes an event. Its bookings are left in place and may dangle.
    pub fn delete_event(&self, id: EventId) -> RepoResult<()> {
        self.with_conn(|conn| SqliteEventRepository::new(conn).delete_event(id))?;
        info!("event=event_delete module=service status=ok event_id={id}");
        Ok(())
    }

    /// Validates and stores a booking for an existing event.
    ///
    /// # Errors
    /// - `Validation` for a missing or malformed email.
    /// - `DanglingReference` when `event_id` does not resolve.
    pub fn create_booking(&self, event_id: EventId, email: &str) -> RepoResult<Booking> {
        let draft = BookingDraft::new(event_id, email);
        let result = self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let booking = SqliteBookingRepository::new(&tx).create_booking(&draft)?;
            tx.commit()?;
            Ok(booking)
        });
        match &result {
            Ok(booking) => info!(
                "event=booking_create module=service status=ok booking_id={} event_id={}",
                booking.id, booking.event_id
            ),
            Err(err) => warn!(
                "event=booking_create module=service status=error event_id={} error_code={}",
                event_id,
                err.error_code()
            ),
        }
        result
    }

    pub fn get_booking(&self, id: BookingId) -> RepoResult<Option<Booking>> {
        self.with_conn(|conn| SqliteBookingRepository::new(conn).get_booking(id))
    }

    pub fn list_bookings_for_event(&self, event_id: EventId) -> RepoResult<Vec<Booking>> {
        self.with_conn(|conn| SqliteBookingRepository::new(conn).list_bookings_for_event(event_id))
    }

    fn with_conn<T>(&self, f: impl FnOnce(&mut Connection) -> RepoResult<T>) -> RepoResult<T> {
        let handle = self.manager.get_connection()?;
        handle.with_conn(f)
    }
}
