//! Event pre-commit pipeline.
//!
//! Steps run in a fixed order and the first failure wins:
//! 1. required strings are present and trimmed;
//! 2. `agenda`/`tags` entries are trimmed and empty entries dropped;
//! 3. the slug is (re)derived when the record is new or its title changed;
//! 4. `date`/`time` are normalized.
//!
//! Slug uniqueness is not checked here. The `events.slug` unique index
//! rejects collisions at write time.

use super::normalize::{derive_slug, normalize_date, normalize_time};
use super::ValidationError;
use crate::model::event::{Event, EventDraft};

/// Event fields in their persisted form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub overview: String,
    pub image: String,
    pub venue: String,
    pub location: String,
    pub date: String,
    pub time: String,
    pub mode: String,
    pub audience: String,
    pub agenda: Vec<String>,
    pub organizer: String,
    pub tags: Vec<String>,
}

/// Validates and normalizes an event draft.
///
/// `committed` is the currently stored version when the draft updates an
/// existing event, `None` for a new one. Its slug is kept unless the title
/// changed.
///
/// # Errors
/// - `MissingField` for a blank required field, or `"slug"` when the title
///   has no sluggable characters.
/// - `EmptyCollection` for an absent or effectively empty `agenda`/`tags`.
/// - `InvalidDate` / `InvalidTime` from normalization.
pub fn validate_event(
    draft: &EventDraft,
    committed: Option<&Event>,
) -> Result<NormalizedEvent, ValidationError> {
    let title = required("title", &draft.title)?;
    let description = required("description", &draft.description)?;
    let overview = required("overview", &draft.overview)?;
    let image = required("image", &draft.image)?;
    let venue = required("venue", &draft.venue)?;
    let location = required("location", &draft.location)?;
    let date = required("date", &draft.date)?;
    let time = required("time", &draft.time)?;
    let mode = required("mode", &draft.mode)?;
    let audience = required("audience", &draft.audience)?;
    let organizer = required("organizer", &draft.organizer)?;

    let agenda = non_empty_list("agenda", &draft.agenda)?;
    let tags = non_empty_list("tags", &draft.tags)?;

    let slug = match committed {
        Some(event) if event.title == title => event.slug.clone(),
        _ => derive_slug(&title),
    };
    if slug.is_empty() {
        return Err(ValidationError::MissingField("slug"));
    }

    let date = normalize_date(&date)?;
    let time = normalize_time(&time)?;

    Ok(NormalizedEvent {
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
    })
}

fn required(field: &'static str, value: &Option<String>) -> Result<String, ValidationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|trimmed| !trimmed.is_empty())
        .map(str::to_string)
        .ok_or(ValidationError::MissingField(field))
}

fn non_empty_list(
    field: &'static str,
    values: &Option<Vec<String>>,
) -> Result<Vec<String>, ValidationError> {
    let items: Vec<String> = values
        .iter()
        .flatten()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();

    if items.is_empty() {
        return Err(ValidationError::EmptyCollection(field));
    }
    Ok(items)
}
