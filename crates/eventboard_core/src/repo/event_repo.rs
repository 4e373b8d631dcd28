//! Event repository contract and SQLite implementation.
//!
//! # Invariants
//! - Create/update paths run `validate_event` before SQL mutations.
//! - `slug` uniqueness is enforced by `idx_events_slug`.
//! - `updated_at` never moves backwards for a record.

use super::{is_unique_violation, parse_uuid, RepoError, RepoResult};
use crate::model::event::{Event, EventDraft, EventId};
use crate::model::now_epoch_ms;
use crate::validate::event::{validate_event, NormalizedEvent};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use uuid::Uuid;

const EVENT_SELECT_SQL: &str = "SELECT
    id,
    title,
    slug,
    description,
    overview,
    image,
    venue,
    location,
    date,
    time,
    mode,
    audience,
    agenda,
    organizer,
    tags,
    created_at,
    updated_at
FROM events";

/// Query options for listing events.
#[derive(Debug, Clone, Default)]
pub struct EventListQuery {
    /// Only events carrying this exact tag.
    pub tag: Option<String>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for event persistence.
pub trait EventRepository {
    fn create_event(&self, draft: &EventDraft) -> RepoResult<Event>;
    fn update_event(&self, id: EventId, draft: &EventDraft) -> RepoResult<Event>;
    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>>;
    fn get_event_by_slug(&self, slug: &str) -> RepoResult<Option<Event>>;
    fn event_exists(&self, id: EventId) -> RepoResult<bool>;
    fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<Event>>;
    fn delete_event(&self, id: EventId) -> RepoResult<()>;
}

/// SQLite-backed event repository.
pub struct SqliteEventRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEventRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EventRepository for SqliteEventRepository<'_> {
    fn create_event(&self, draft: &EventDraft) -> RepoResult<Event> {
        let normalized = validate_event(draft, None)?;
        let now = now_epoch_ms();
        let event = assemble_event(Uuid::new_v4(), normalized, now, now);

        self.conn
            .execute(
                "INSERT INTO events (
                    id, title, slug, description, overview, image, venue, location,
                    date, time, mode, audience, agenda, organizer, tags,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17);",
                params![
                    event.id.to_string(),
                    event.title,
                    event.slug,
                    event.description,
                    event.overview,
                    event.image,
                    event.venue,
                    event.location,
                    event.date,
                    event.time,
                    event.mode,
                    event.audience,
                    encode_list(&event.agenda)?,
                    event.organizer,
                    encode_list(&event.tags)?,
                    event.created_at,
                    event.updated_at,
                ],
            )
            .map_err(|err| slug_conflict(err, &event.slug))?;

        Ok(event)
    }

    fn update_event(&self, id: EventId, draft: &EventDraft) -> RepoResult<Event> {
        let current = self.get_event(id)?.ok_or(RepoError::NotFound(id))?;
        let normalized = validate_event(draft, Some(&current))?;
        let updated_at = now_epoch_ms().max(current.updated_at);
        let event = assemble_event(id, normalized, current.created_at, updated_at);

        let changed = self
            .conn
            .execute(
                "UPDATE events
                 SET
                    title = ?1,
                    slug = ?2,
                    description = ?3,
                    overview = ?4,
                    image = ?5,
                    venue = ?6,
                    location = ?7,
                    date = ?8,
                    time = ?9,
                    mode = ?10,
                    audience = ?11,
                    agenda = ?12,
                    organizer = ?13,
                    tags = ?14,
                    updated_at = ?15
                 WHERE id = ?16;",
                params![
                    event.title,
                    event.slug,
                    event.description,
                    event.overview,
                    event.image,
                    event.venue,
                    event.location,
                    event.date,
                    event.time,
                    event.mode,
                    event.audience,
                    encode_list(&event.agenda)?,
                    event.organizer,
                    encode_list(&event.tags)?,
                    event.updated_at,
                    id.to_string(),
                ],
            )
            .map_err(|err| slug_conflict(err, &event.slug))?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(event)
    }

    fn get_event(&self, id: EventId) -> RepoResult<Option<Event>> {
        self.find_one("id", &id.to_string())
    }

    fn get_event_by_slug(&self, slug: &str) -> RepoResult<Option<Event>> {
        self.find_one("slug", slug.trim())
    }

    fn event_exists(&self, id: EventId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM events WHERE id = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_events(&self, query: &EventListQuery) -> RepoResult<Vec<Event>> {
        let mut sql = format!("{EVENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(tag) = query.tag.as_deref().map(str::trim) {
            sql.push_str(" AND EXISTS (SELECT 1 FROM json_each(events.tags) WHERE value = ?)");
            bind_values.push(Value::Text(tag.to_string()));
        }

        sql.push_str(" ORDER BY date ASC, time ASC, slug ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut events = Vec::new();

        while let Some(row) = rows.next()? {
            events.push(parse_event_row(row)?);
        }

        Ok(events)
    }

    fn delete_event(&self, id: EventId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM events WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

impl SqliteEventRepository<'_> {
    fn find_one(&self, column: &'static str, value: &str) -> RepoResult<Option<Event>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EVENT_SELECT_SQL} WHERE {column} = ?1;"))?;
        let row = stmt
            .query_row([value], |row| Ok(parse_event_row(row)))
            .optional()?;
        row.transpose()
    }
}

fn assemble_event(id: EventId, fields: NormalizedEvent, created_at: i64, updated_at: i64) -> Event {
    Event {
        id,
        title: fields.title,
        slug: fields.slug,
        description: fields.description,
        overview: fields.overview,
        image: fields.image,
        venue: fields.venue,
        location: fields.location,
        date: fields.date,
        time: fields.time,
        mode: fields.mode,
        audience: fields.audience,
        agenda: fields.agenda,
        organizer: fields.organizer,
        tags: fields.tags,
        created_at,
        updated_at,
    }
}

fn slug_conflict(err: rusqlite::Error, slug: &str) -> RepoError {
    if is_unique_violation(&err) {
        return RepoError::DuplicateKey {
            field: "slug",
            value: slug.to_string(),
        };
    }
    err.into()
}

fn encode_list(values: &[String]) -> RepoResult<String> {
    serde_json::to_string(values)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode list value: {err}")))
}

fn decode_list(text: &str, column: &str) -> RepoResult<Vec<String>> {
    serde_json::from_str(text)
        .map_err(|err| RepoError::InvalidData(format!("invalid list value in {column}: {err}")))
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<Event> {
    let id_text: String = row.get("id")?;
    let agenda_text: String = row.get("agenda")?;
    let tags_text: String = row.get("tags")?;

    Ok(Event {
        id: parse_uuid(&id_text, "events.id")?,
        title: row.get("title")?,
        slug: row.get("slug")?,
        description: row.get("description")?,
        overview: row.get("overview")?,
        image: row.get("image")?,
        venue: row.get("venue")?,
        location: row.get("location")?,
        date: row.get("date")?,
        time: row.get("time")?,
        mode: row.get("mode")?,
        audience: row.get("audience")?,
        agenda: decode_list(&agenda_text, "events.agenda")?,
        organizer: row.get("organizer")?,
        tags: decode_list(&tags_text, "events.tags")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
