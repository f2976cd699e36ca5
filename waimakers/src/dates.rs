/*
Best-effort normalisation of feed dates to ISO-8601.

Feeds publish dates in RFC-822 (RSS) or RFC-3339 (Atom) flavours, with plenty of
variation in the wild. normalize_date never fails: anything it cannot read
becomes the current local time.
*/

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, SecondsFormat};
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

type DateParser = fn(&str) -> Option<String>;

/// Tried in order, first match wins.
const PARSERS: [DateParser; 5] = [
    parse_rfc822_numeric_offset,
    parse_rfc822_named_zone,
    parse_iso8601,
    parse_date_time,
    parse_date,
];

/// Normalises a raw feed date to an ISO-8601 string.
///
/// Offsets present in the source are kept as-is; named zones (`GMT`, `EST`) are dropped
/// and the wall time is reported without an offset.
pub fn normalize_date(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return now_iso();
    };
    let cleaned = WHITESPACE_RE.replace_all(raw.trim(), " ");
    if cleaned.is_empty() {
        return now_iso();
    }

    PARSERS
        .iter()
        .find_map(|parse| parse(&cleaned))
        .unwrap_or_else(now_iso)
}

/// Reads a normalised date back as a wall-clock instant. Any offset is discarded,
/// not converted.
pub fn naive_instant(iso: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(iso, NAIVE_FORMAT) {
        return Some(dt);
    }
    NaiveDate::parse_from_str(iso, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Current local time, microsecond precision, no offset.
pub fn now_iso() -> String {
    Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}

/// "Fri, 19 Dec 2025 ..." -> "19 Dec 2025 ...". The weekday is not cross-checked.
fn strip_weekday(s: &str) -> &str {
    match s.split_once(", ") {
        Some((day, rest)) if day.len() == 3 && day.chars().all(|c| c.is_ascii_alphabetic()) => rest,
        _ => s,
    }
}

fn parse_rfc822_numeric_offset(s: &str) -> Option<String> {
    DateTime::parse_from_str(strip_weekday(s), "%d %b %Y %H:%M:%S %z")
        .ok()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
}

fn parse_rfc822_named_zone(s: &str) -> Option<String> {
    let (rest, zone) = strip_weekday(s).rsplit_once(' ')?;
    if !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    NaiveDateTime::parse_from_str(rest, "%d %b %Y %H:%M:%S")
        .ok()
        .map(|dt| dt.format(NAIVE_FORMAT).to_string())
}

fn parse_iso8601(s: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
}

fn parse_date_time(s: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.format(NAIVE_FORMAT).to_string())
}

fn parse_date(s: &str) -> Option<String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.format(NAIVE_FORMAT).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_is_now(value: &str) {
        let parsed = naive_instant(value).expect("fallback is ISO-8601");
        let drift = (Local::now().naive_local() - parsed).num_seconds().abs();
        assert!(drift <= 1, "{} is not the current time", value);
    }

    #[test]
    fn test_rfc822_named_zone() {
        assert_eq!(
            normalize_date(Some("Fri, 19 Dec 2025 10:00:00 GMT")),
            "2025-12-19T10:00:00"
        );
    }

    #[test]
    fn test_rfc822_numeric_offset() {
        assert_eq!(
            normalize_date(Some("Fri, 19 Dec 2025 10:00:00 +0000")),
            "2025-12-19T10:00:00+00:00"
        );
        assert_eq!(
            normalize_date(Some("Fri, 19 Dec 2025 10:00:00 +0530")),
            "2025-12-19T10:00:00+05:30"
        );
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        assert_eq!(
            normalize_date(Some("  Fri,  19 Dec 2025\n 10:00:00   GMT ")),
            "2025-12-19T10:00:00"
        );
    }

    #[test]
    fn test_iso8601_variants() {
        assert_eq!(
            normalize_date(Some("2025-12-19T10:00:00Z")),
            "2025-12-19T10:00:00+00:00"
        );
        assert_eq!(
            normalize_date(Some("2025-12-19T10:00:00-05:00")),
            "2025-12-19T10:00:00-05:00"
        );
        assert_eq!(
            normalize_date(Some("2025-12-19T10:00:00+0100")),
            "2025-12-19T10:00:00+01:00"
        );
    }

    #[test]
    fn test_bare_formats() {
        assert_eq!(normalize_date(Some("2025-12-19 10:30:00")), "2025-12-19T10:30:00");
        assert_eq!(normalize_date(Some("2025-12-19")), "2025-12-19T00:00:00");
    }

    #[test]
    fn test_unparseable_falls_back_to_now() {
        assert_is_now(&normalize_date(Some("garbage")));
        assert_is_now(&normalize_date(Some("")));
        assert_is_now(&normalize_date(None));
    }

    #[test]
    fn test_naive_instant_drops_offset() {
        let instant = naive_instant("2025-12-19T10:00:00+05:00").expect("parse");
        assert_eq!(instant.format("%H:%M").to_string(), "10:00");

        let naive = naive_instant("2025-12-19T08:15:00").expect("parse");
        assert_eq!(naive.format("%H:%M").to_string(), "08:15");

        assert!(naive_instant("yesterday").is_none());
    }
}
