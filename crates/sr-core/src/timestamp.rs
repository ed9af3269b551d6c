//! Normalization of heterogeneous request timestamps.
//!
//! Upstream exports mix several encodings: the vendor dashboard's
//! `Oct 15, 2025 @ 11:54:40.903`, plain ISO datetimes, bare dates and the
//! occasional RFC 3339 or epoch value. Everything is reduced to a naive civil
//! [`NaiveDateTime`]; the zone it is expressed in is carried alongside the
//! batch, never inside the value.
//!
//! The fallback chain is ordered: the vendor format must be tried before
//! generic inference, which would otherwise misread the `@` export.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;

/// Vendor export formats, tried after the ` @` separator is removed.
const VENDOR_FORMATS: [&str; 2] = ["%b %d, %Y %H:%M:%S%.f", "%b %d, %Y %H:%M:%S"];

/// ISO datetime formats, with and without fractional seconds.
const ISO_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Datetime layouts accepted by best-effort inference.
const INFERRED_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%b %d, %Y %H:%M:%S%.f",
    "%b %d, %Y %H:%M",
    "%B %d, %Y %H:%M:%S%.f",
    "%d %b %Y %H:%M:%S%.f",
];

/// Date-only layouts accepted by best-effort inference (read as midnight).
const INFERRED_DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%Y%m%d",
];

/// Unix epoch seconds, optionally with a fractional part.
static EPOCH_SECONDS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{9,10})(?:\.(\d{1,9}))?$").unwrap());

/// Unix epoch milliseconds.
static EPOCH_MILLIS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{12,13}$").unwrap());

/// Normalizes a raw timestamp string into a civil datetime.
///
/// Returns `None` when nothing in the fallback chain accepts the input. A
/// successful parse of a bare date yields midnight, so `Some(midnight)` and
/// `None` are always distinguishable.
pub fn normalize_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.contains('@') {
        let cleaned = trimmed.replace(" @", "");
        let cleaned = cleaned.trim();
        return parse_with(cleaned, &VENDOR_FORMATS).or_else(|| infer_timestamp(cleaned));
    }

    parse_with(trimmed, &ISO_DATETIME_FORMATS)
        .or_else(|| parse_date(trimmed, ISO_DATE_FORMAT))
        .or_else(|| infer_timestamp(trimmed))
}

fn parse_with(value: &str, formats: &[&str]) -> Option<NaiveDateTime> {
    formats
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

fn parse_date(value: &str, format: &str) -> Option<NaiveDateTime> {
    NaiveDate::parse_from_str(value, format)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Best-effort inference over the remaining common encodings.
///
/// Offset-carrying formats keep the civil clock as written; the offset is
/// dropped rather than applied.
fn infer_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.naive_local());
    }

    parse_with(value, INFERRED_DATETIME_FORMATS)
        .or_else(|| {
            INFERRED_DATE_FORMATS
                .iter()
                .find_map(|fmt| parse_date(value, fmt))
        })
        .or_else(|| parse_epoch(value))
}

fn parse_epoch(value: &str) -> Option<NaiveDateTime> {
    if let Some(caps) = EPOCH_SECONDS_RE.captures(value) {
        let secs: i64 = caps[1].parse().ok()?;
        let nanos = caps.get(2).map_or(Some(0), |frac| {
            // Right-pad to nanosecond precision: ".9" is 900ms, not 9ns.
            format!("{:0<9}", frac.as_str()).parse::<u32>().ok()
        })?;
        return DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc());
    }
    if EPOCH_MILLIS_RE.is_match(value) {
        let millis: i64 = value.parse().ok()?;
        return DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc());
    }
    None
}
