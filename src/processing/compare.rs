//! Type-dependent comparison of raw cell contents.
//!
//! Values are kept as text and parsed on demand according to the column's [`DataType`].
//! For every type except `String`, a value that fails to parse ranks after every value that
//! parses.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::types::DataType;

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

/// Parse a boolean literal (`true`/`false`, case-insensitive, surrounding whitespace ignored).
pub fn parse_bool(raw: &str) -> Option<bool> {
    let s = raw.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Parse a 32-bit integer for `Number` comparisons. Wider integers count as unparseable.
pub fn parse_number(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

/// Whether `raw` reads as a finite floating point number (used for type inference and sums).
pub fn parse_float(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a calendar date or date/time.
///
/// Accepts RFC 3339, ISO-like `YYYY-MM-DD[ HH:MM[:SS]]`, `MM/DD/YYYY[ HH:MM[:SS]]` and
/// `DD.MM.YYYY[ HH:MM[:SS]]`. Offsets are normalized to UTC.
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATE_TIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Compare two raw values under the column type.
///
/// When neither side parses the result is `Greater` ("not less-than"); filter relations rely on
/// this exact ranking.
pub fn compare_typed(data_type: DataType, a: &str, b: &str) -> Ordering {
    match data_type {
        DataType::String => a.cmp(b),
        DataType::Bool => compare_parsed(parse_bool(a), parse_bool(b)),
        DataType::Number => compare_parsed(parse_number(a), parse_number(b)),
        DataType::Date => compare_parsed(parse_date(a), parse_date(b)),
    }
}

fn compare_parsed<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, _) => Ordering::Greater,
    }
}

/// Total-order key used for sorting a column.
///
/// Agrees with [`compare_typed`] except that unparseable values all tie with each other, so a
/// stable sort keeps them in their original order after the parseable ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum SortKey<'a> {
    Bool(bool),
    Number(i32),
    Date(NaiveDateTime),
    Text(&'a str),
    Unparsed,
}

pub(crate) fn sort_key(data_type: DataType, raw: &str) -> SortKey<'_> {
    let parsed = match data_type {
        DataType::String => Some(SortKey::Text(raw)),
        DataType::Bool => parse_bool(raw).map(SortKey::Bool),
        DataType::Number => parse_number(raw).map(SortKey::Number),
        DataType::Date => parse_date(raw).map(SortKey::Date),
    };
    parsed.unwrap_or(SortKey::Unparsed)
}
