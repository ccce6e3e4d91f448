//! Text → instant parsing.

use chrono::format::{Parsed, StrftimeItems, parse};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::culture::Culture;
use super::formatter::{FormatToken, TimeFormatter};

/// Layouts that carry their own offset.
const OFFSET_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f %z",
];

/// Wall-clock layouts, interpreted in the target zone.
const NAIVE_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M %p",
];

/// Date-only layouts; US month-first order for slashes with a trailing year.
const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Detect the layout of `input`. Slash dates ending in the year are read
/// month-first, as en-US writes them.
pub fn parse_auto(input: &str, zone: Tz) -> Option<DateTime<Tz>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&zone));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(input) {
        return Some(dt.with_timezone(&zone));
    }
    for layout in OFFSET_LAYOUTS {
        if let Ok(dt) = DateTime::parse_from_str(input, layout) {
            return Some(dt.with_timezone(&zone));
        }
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, layout) {
            return localize(zone, naive);
        }
    }
    for layout in DATE_LAYOUTS {
        if let Ok(date) = NaiveDate::parse_from_str(input, layout) {
            return localize(zone, date.and_time(NaiveTime::MIN));
        }
    }
    None
}

/// Parse `input` with a host pattern under `culture`.
///
/// An hour without minutes means minute zero, and a 12-hour field without
/// `A`/`a` is read as AM. Patterns with any time field never fall back to
/// date-only parsing.
pub fn parse_with_format(
    input: &str,
    format: &str,
    culture: Culture,
    zone: Tz,
) -> Option<DateTime<Tz>> {
    let tokens = TimeFormatter::compile(format);
    let pattern = TimeFormatter::parse_pattern(&tokens);
    let normalized = culture.normalize(input.trim());

    let mut parsed = Parsed::new();
    parse(&mut parsed, normalized.as_ref(), StrftimeItems::new(&pattern)).ok()?;

    let has = |pred: fn(&FormatToken) -> bool| tokens.iter().any(pred);
    if has(FormatToken::is_hour_12) && !has(|t| matches!(t, FormatToken::Meridiem { .. })) {
        let _ = parsed.set_ampm(false);
    }
    if has(FormatToken::is_hour) && !has(FormatToken::is_minute) {
        let _ = parsed.set_minute(0);
    }

    if let Ok(dt) = parsed.to_datetime() {
        return Some(dt.with_timezone(&zone));
    }
    if let Ok(naive) = parsed.to_naive_datetime_with_offset(0) {
        // A Unix timestamp names an instant, not a wall-clock time.
        if has(|t| *t == FormatToken::UnixSeconds) {
            return Some(Utc.from_utc_datetime(&naive).with_timezone(&zone));
        }
        return localize(zone, naive);
    }
    if has(FormatToken::is_time_field) {
        return None;
    }
    let date = parsed.to_naive_date().ok()?;
    localize(zone, date.and_time(NaiveTime::MIN))
}

/// Interpret a wall-clock time in `zone`.
///
/// Ambiguous times (clocks going back) resolve to the earlier instant;
/// times inside a gap (clocks going forward) move forward by one hour.
pub fn localize(zone: Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| zone.from_local_datetime(&(naive + Duration::hours(1))).earliest())
}
