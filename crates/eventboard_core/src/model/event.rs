//! Event record and draft input.
//!
//! # Invariants
//! - `slug` is unique across events and derived from `title`.
//! - Stored string fields are trimmed and non-empty.
//! - `agenda` and `tags` are non-empty lists of non-empty strings.
//! - `date` is `YYYY-MM-DD`; `time` is zero-padded `HH:MM`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub type EventId = Uuid;

/// Persisted event listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: EventId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub overview: String,
    /// Image URL or asset path.
    pub image: String,
    pub venue: String,
    pub location: String,
    pub date: String,
    pub time: String,
    /// Open enumeration; usually `online`, `offline` or `hybrid`.
    pub mode: String,
    pub audience: String,
    pub agenda: Vec<String>,
    pub organizer: String,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Caller-supplied event fields, prior to validation.
///
/// Every field is optional so that absence is reported by the validator with
/// the field name. When decoded from JSON, a non-string value counts as
/// absent, and so does an `agenda`/`tags` value that is not an array of
/// strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub overview: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub venue: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub audience: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub agenda: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub organizer: Option<String>,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub tags: Option<Vec<String>>,
}

impl EventDraft {
    /// Builds a draft carrying the fields of an existing event.
    ///
    /// Used as the starting point for partial edits.
    pub fn from_event(event: &Event) -> Self {
        Self {
            title: Some(event.title.clone()),
            description: Some(event.description.clone()),
            overview: Some(event.overview.clone()),
            image: Some(event.image.clone()),
            venue: Some(event.venue.clone()),
            location: Some(event.location.clone()),
            date: Some(event.date.clone()),
            time: Some(event.time.clone()),
            mode: Some(event.mode.clone()),
            audience: Some(event.audience.clone()),
            agenda: Some(event.agenda.clone()),
            organizer: Some(event.organizer.clone()),
            tags: Some(event.tags.clone()),
        }
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(value)) => Some(value),
        _ => None,
    })
}

fn lenient_string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| match item {
                Value::String(value) => Some(value),
                _ => None,
            })
            .collect(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::EventDraft;
    use serde_json::json;

    #[test]
    fn draft_decodes_camel_case_fields() {
        let draft: EventDraft = serde_json::from_value(json!({
            "title": "RustConf",
            "agenda": ["Keynote", "Workshops"],
            "tags": ["rust"]
        }))
        .unwrap();

        assert_eq!(draft.title.as_deref(), Some("RustConf"));
        assert_eq!(draft.agenda.as_deref().map(<[String]>::len), Some(2));
        assert!(draft.venue.is_none());
    }

    #[test]
    fn draft_treats_wrongly_typed_values_as_absent() {
        let draft: EventDraft = serde_json::from_value(json!({
            "title": 42,
            "agenda": "Keynote",
            "tags": ["rust", 7],
            "venue": null
        }))
        .unwrap();

        assert!(draft.title.is_none());
        assert!(draft.agenda.is_none());
        assert!(draft.tags.is_none());
        assert!(draft.venue.is_none());
    }
}
