//! Best-effort normalization of the date strings feeds put in their entries.
//!
//! Feeds disagree wildly on date formats, so parsing never fails: anything
//! unrecognized resolves to "now". The resulting timestamp is only a sort and
//! filter key; the raw string is what ends up in the snapshot.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

/// ISO-8601 shapes carrying an explicit offset.
const ISO_OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M:%S%z",
];

/// ISO-8601 shapes without an offset, read as UTC.
const ISO_NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

const RFC822_FORMAT: &str = "%d %b %Y %H:%M:%S";
const PLAIN_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static TRAILING_OFFSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s[+-]\d{4}$").expect("valid offset regex"));

/// Parse a raw feed date, falling back to the current time.
pub fn parse_date(raw: Option<&str>) -> DateTime<Utc> {
    parse_date_at(raw, Utc::now())
}

/// Parse a raw feed date, falling back to `now` when nothing matches.
pub fn parse_date_at(raw: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return now;
    };

    parse_iso8601(raw)
        .or_else(|| parse_rfc822(raw))
        .or_else(|| parse_plain(raw))
        .unwrap_or(now)
}

fn parse_iso8601(raw: &str) -> Option<DateTime<Utc>> {
    // A trailing `Z` is just another way of writing +00:00
    let normalized = match raw.strip_suffix('Z').or_else(|| raw.strip_suffix('z')) {
        Some(head) => format!("{head}+00:00"),
        None => raw.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ISO_OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&normalized, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in ISO_NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, fmt) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// `Tue, 10 Jun 2025 14:30:00 +0200`. The numeric zone is stripped and never
/// applied, so the wall-clock time is read as if it were already UTC.
fn parse_rfc822(raw: &str) -> Option<DateTime<Utc>> {
    let without_zone = TRAILING_OFFSET.replace(raw, "");
    let (weekday, rest) = without_zone.split_once(", ")?;
    weekday.trim().parse::<Weekday>().ok()?;

    NaiveDateTime::parse_from_str(rest.trim(), RFC822_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// `2025-06-10 14:30:00` followed by anything.
fn parse_plain(raw: &str) -> Option<DateTime<Utc>> {
    let head = match raw.char_indices().nth(19) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    };

    NaiveDateTime::parse_from_str(head, PLAIN_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
