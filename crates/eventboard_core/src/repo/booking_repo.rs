//! Booking repository contract and SQLite implementation.
//!
//! # Invariants
//! - `create_booking` runs `validate_booking` (email + event existence)
//!   before inserting.
//! - The existence check and the insert are two statements. Run them on a
//!   transaction when they must not interleave with an event delete; see
//!   `ListingService::create_booking`.

use super::event_repo::SqliteEventRepository;
use super::{parse_uuid, RepoResult};
use crate::model::booking::{Booking, BookingDraft, BookingId};
use crate::model::event::EventId;
use crate::model::now_epoch_ms;
use crate::validate::booking::validate_booking;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const BOOKING_SELECT_SQL: &str = "SELECT
    id,
    event_id,
    email,
    created_at,
    updated_at
FROM bookings";

/// Repository interface for booking persistence.
pub trait BookingRepository {
    fn create_booking(&self, draft: &BookingDraft) -> RepoResult<Booking>;
    fn get_booking(&self, id: BookingId) -> RepoResult<Option<Booking>>;
    fn list_bookings_for_event(&self, event_id: EventId) -> RepoResult<Vec<Booking>>;
}

/// SQLite-backed booking repository.
pub struct SqliteBookingRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookingRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl BookingRepository for SqliteBookingRepository<'_> {
    fn create_booking(&self, draft: &BookingDraft) -> RepoResult<Booking> {
        let normalized = validate_booking(draft, &SqliteEventRepository::new(self.conn))?;
        let now = now_epoch_ms();
        let booking = Booking {
            id: Uuid::new_v4(),
            event_id: normalized.event_id,
            email: normalized.email,
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            "INSERT INTO bookings (id, event_id, email, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                booking.id.to_string(),
                booking.event_id.to_string(),
                booking.email,
                booking.created_at,
                booking.updated_at,
            ],
        )?;

        Ok(booking)
    }

    fn get_booking(&self, id: BookingId) -> RepoResult<Option<Booking>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{BOOKING_SELECT_SQL} WHERE id = ?1;"))?;
        let row = stmt
            .query_row([id.to_string()], |row| Ok(parse_booking_row(row)))
            .optional()?;
        row.transpose()
    }

    fn list_bookings_for_event(&self, event_id: EventId) -> RepoResult<Vec<Booking>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BOOKING_SELECT_SQL}
             WHERE event_id = ?1
             ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([event_id.to_string()])?;
        let mut bookings = Vec::new();

        while let Some(row) = rows.next()? {
            bookings.push(parse_booking_row(row)?);
        }

        Ok(bookings)
    }
}

fn parse_booking_row(row: &Row<'_>) -> RepoResult<Booking> {
    let id_text: String = row.get("id")?;
    let event_id_text: String = row.get("event_id")?;

    Ok(Booking {
        id: parse_uuid(&id_text, "bookings.id")?,
        event_id: parse_uuid(&event_id_text, "bookings.event_id")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
