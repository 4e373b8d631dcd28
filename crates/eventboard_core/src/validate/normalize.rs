//! Pure normalization helpers shared by the validators.
//!
//! # Invariants
//! - Every helper is deterministic and performs no I/O.
//! - Every helper is idempotent on its own successful output.

use super::ValidationError;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static SLUG_INVALID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid slug filter regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));
static HYPHEN_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid hyphen regex"));
static TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]{1,2}):([0-9]{2})$").expect("valid time regex"));

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%d %B %Y"];
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Derives the URL slug for an event title.
///
/// Lowercases, drops everything outside `[a-z0-9]`, whitespace and `-`, turns
/// whitespace runs into single hyphens, collapses hyphen runs and trims
/// hyphens at both ends. The result may be empty.
pub fn derive_slug(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let stripped = SLUG_INVALID_RE.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RE.replace_all(&stripped, "-");
    let collapsed = HYPHEN_RUN_RE.replace_all(&hyphenated, "-");
    collapsed.trim_matches('-').to_string()
}

/// Normalizes a calendar date to `YYYY-MM-DD`.
///
/// Time-of-day and zone offsets in the input are discarded, not applied: the
/// calendar date as written is kept.
///
/// # Errors
/// - `InvalidDate` when no supported date layout matches.
/// - `InvalidDate` when the year does not fit four digits (signed or
///   five-digit years would not sort as text).
pub fn normalize_date(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    parse_calendar_date(trimmed)
        .filter(|date| (0..=9999).contains(&date.year()))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| ValidationError::InvalidDate(trimmed.to_string()))
}

fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.date_naive());
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|parsed| parsed.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc2822(value)
                .ok()
                .map(|parsed| parsed.date_naive())
        })
}

/// Normalizes a 24-hour time to zero-padded `HH:MM`.
///
/// # Errors
/// - `InvalidTime` when the input is not `H:MM`/`HH:MM` or is out of range.
pub fn normalize_time(input: &str) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    let invalid = || ValidationError::InvalidTime(trimmed.to_string());

    let captures = TIME_RE.captures(trimmed).ok_or_else(invalid)?;
    let hours: u32 = captures[1].parse().map_err(|_| invalid())?;
    let minutes: u32 = captures[2].parse().map_err(|_| invalid())?;

    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    Ok(format!("{hours:02}:{minutes:02}"))
}

#[cfg(test)]
mod tests {
    use super::{derive_slug, normalize_date, normalize_time};
    use crate::validate::ValidationError;

    #[test]
    fn slug_strips_symbols_and_collapses_separators() {
        assert_eq!(derive_slug("  Rust & WebAssembly  Meetup!! "), "rust-webassembly-meetup");
        assert_eq!(derive_slug("--Hello---World--"), "hello-world");
        assert_eq!(derive_slug("Café Night 2025"), "caf-night-2025");
        assert_eq!(derive_slug("tabs\tand\nnewlines"), "tabs-and-newlines");
    }

    #[test]
    fn slug_can_be_empty_for_symbol_only_titles() {
        assert_eq!(derive_slug("!!! ??? ..."), "");
    }

    #[test]
    fn slug_is_idempotent_and_url_safe() {
        let titles = [
            "Next.js Conf 2025",
            " - leading and trailing - ",
            "ÜBER   cool -- event",
            "a  -  b",
            "日本 meetup",
        ];
        for title in titles {
            let slug = derive_slug(title);
            assert_eq!(derive_slug(&slug), slug, "not idempotent for `{title}`");
            assert!(slug
                .chars()
                .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-'));
            assert!(!slug.starts_with('-') && !slug.ends_with('-'));
            assert!(!slug.contains("--"));
        }
    }

    #[test]
    fn date_accepts_common_layouts() {
        assert_eq!(normalize_date("2025-01-31").unwrap(), "2025-01-31");
        assert_eq!(normalize_date(" 2025/1/5 ").unwrap(), "2025-01-05");
        assert_eq!(normalize_date("2025-03-09T18:30:00Z").unwrap(), "2025-03-09");
        assert_eq!(normalize_date("2025-03-09T23:30:00-05:00").unwrap(), "2025-03-09");
        assert_eq!(normalize_date("2025-03-09 08:15").unwrap(), "2025-03-09");
        assert_eq!(normalize_date("March 9, 2025").unwrap(), "2025-03-09");
        assert_eq!(normalize_date("Sun, 09 Mar 2025 10:00:00 +0000").unwrap(), "2025-03-09");
    }

    #[test]
    fn date_rejects_unparseable_and_impossible_dates() {
        let inputs = [
            "",
            "tomorrow",
            "2025-02-30",
            "2025-13-01",
            "31/01/2025",
            "+12345-01-01",
            "-0001-01-01",
            "12345-01-01",
        ];
        for input in inputs {
            assert!(
                matches!(normalize_date(input), Err(ValidationError::InvalidDate(_))),
                "`{input}` should be rejected"
            );
        }
    }

    #[test]
    fn date_is_idempotent() {
        for input in ["2024-02-29", "2025-12-31T23:59:59+14:00", "January 1, 2026"] {
            let once = normalize_date(input).unwrap();
            assert_eq!(normalize_date(&once).unwrap(), once);
            assert_eq!(once.len(), 10);
        }
    }

    #[test]
    fn time_pads_and_validates_bounds() {
        assert_eq!(normalize_time("09:05").unwrap(), "09:05");
        assert_eq!(normalize_time("9:05").unwrap(), "09:05");
        assert_eq!(normalize_time(" 23:59 ").unwrap(), "23:59");
        assert_eq!(normalize_time("0:00").unwrap(), "00:00");
    }

    #[test]
    fn time_rejects_bad_shapes_and_ranges() {
        for input in ["9:5", "24:00", "12:60", "123:00", "12-30", "noon", "", "١٢:٣٠"] {
            assert!(
                matches!(normalize_time(input), Err(ValidationError::InvalidTime(_))),
                "`{input}` should be rejected"
            );
        }
    }
}
