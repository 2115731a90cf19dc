//! Canonical byte forms for the supported scalar types.
//!
//! Each kind maps its values onto a deterministic text form that survives
//! the pad/encrypt/decrypt cycle: dates as `YYYY:MM:DD`, datetimes with
//! time and microseconds appended, numbers as plain decimal, floats as
//! fixed-point with 66 fractional digits (exponent notation would collide
//! with the length-free terminator scheme). `from_canonical(to_canonical(v))`
//! returns `v` for every representable value.

use crate::error::{FieldError, FieldResult};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Width of `i64::MIN` in decimal, sign included.
const INT_MAX_CANONICAL_LEN: usize = 20;

/// Widest fixed-point float form the storage column is sized for.
const FLOAT_MAX_CANONICAL_LEN: usize = 150;

/// The closed set of field types, with per-field configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    /// Bounded text; the bound is counted in characters and enforced on
    /// write before any cipher work.
    Char { max_length: usize },
    /// Unbounded text.
    Text,
    Date,
    DateTime,
    Int,
    /// Arbitrary-magnitude integer column; unbounded decimal text.
    Long,
    Float,
}

/// A typed scalar value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Int(i64),
    Long(i128),
    Float(f64),
}

impl FieldKind {
    /// Longest canonical form this kind can produce, or `None` for kinds
    /// stored in unbounded text columns.
    pub fn max_canonical_len(self) -> Option<usize> {
        match self {
            Self::Char { max_length } => Some(max_length),
            Self::Text | Self::Long => None,
            Self::Date => Some(10),
            Self::DateTime => Some(26),
            Self::Int => Some(INT_MAX_CANONICAL_LEN),
            Self::Float => Some(FLOAT_MAX_CANONICAL_LEN),
        }
    }

    fn type_name(self) -> &'static str {
        match self {
            Self::Char { .. } => "char",
            Self::Text => "text",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
        }
    }
}

impl FieldValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::Int(_) => "int",
            Self::Long(_) => "long",
            Self::Float(_) => "float",
        }
    }
}

fn mismatch(kind: FieldKind, value: &FieldValue) -> FieldError {
    FieldError::KindMismatch {
        expected: kind.type_name(),
        actual: value.type_name(),
    }
}

/// Converts a typed value into its canonical bytes.
///
/// The Char bound is checked here, before the bytes reach padding or the
/// cipher.
pub fn to_canonical(kind: FieldKind, value: &FieldValue) -> FieldResult<Vec<u8>> {
    match (kind, value) {
        (FieldKind::Char { max_length }, FieldValue::Text(text)) => {
            let chars = text.chars().count();
            if chars > max_length {
                return Err(FieldError::PlaintextTooLong {
                    actual: chars,
                    max: max_length,
                });
            }
            Ok(text.as_bytes().to_vec())
        }
        (FieldKind::Text, FieldValue::Text(text)) => Ok(text.as_bytes().to_vec()),
        (FieldKind::Date, FieldValue::Date(date)) => Ok(format_date(*date).into_bytes()),
        (FieldKind::DateTime, FieldValue::DateTime(datetime)) => {
            Ok(format_datetime(*datetime).into_bytes())
        }
        (FieldKind::Int, FieldValue::Int(number)) => Ok(number.to_string().into_bytes()),
        (FieldKind::Long, FieldValue::Long(number)) => Ok(number.to_string().into_bytes()),
        (FieldKind::Float, FieldValue::Float(number)) => {
            Ok(format!("{number:.66}").into_bytes())
        }
        (kind, value) => Err(mismatch(kind, value)),
    }
}

/// Converts canonical bytes back into the typed value for `kind`.
pub fn from_canonical(kind: FieldKind, canonical: &[u8]) -> FieldResult<FieldValue> {
    let text = String::from_utf8(canonical.to_vec())?;
    match kind {
        FieldKind::Char { .. } | FieldKind::Text => Ok(FieldValue::Text(text)),
        FieldKind::Date => parse_date(&text).map(FieldValue::Date),
        FieldKind::DateTime => parse_datetime(&text).map(FieldValue::DateTime),
        FieldKind::Int => text
            .parse::<i64>()
            .map(FieldValue::Int)
            .map_err(|_| FieldError::InvalidNumber(text)),
        FieldKind::Long => text
            .parse::<i128>()
            .map(FieldValue::Long)
            .map_err(|_| FieldError::InvalidNumber(text)),
        FieldKind::Float => text
            .parse::<f64>()
            .map(FieldValue::Float)
            .map_err(|_| FieldError::InvalidNumber(text)),
    }
}

fn format_date(date: NaiveDate) -> String {
    format!("{:04}:{:02}:{:02}", date.year(), date.month(), date.day())
}

fn format_datetime(datetime: NaiveDateTime) -> String {
    format!(
        "{:04}:{:02}:{:02}:{:02}:{:02}:{:02}:{:06}",
        datetime.year(),
        datetime.month(),
        datetime.day(),
        datetime.hour(),
        datetime.minute(),
        datetime.second(),
        datetime.nanosecond() / 1_000,
    )
}

/// Splits a `:`-separated canonical form into numeric components,
/// rejecting non-numeric ones.
fn split_numeric(text: &str) -> Option<Vec<i64>> {
    text.split(':')
        .map(|part| part.parse::<i64>().ok())
        .collect()
}

fn parse_date(text: &str) -> FieldResult<NaiveDate> {
    let invalid = || FieldError::InvalidDate(text.to_string());
    let parts = split_numeric(text).ok_or_else(invalid)?;
    let [year, month, day] = parts.as_slice() else {
        return Err(invalid());
    };
    date_from_parts(*year, *month, *day).ok_or_else(invalid)
}

fn parse_datetime(text: &str) -> FieldResult<NaiveDateTime> {
    let invalid = || FieldError::InvalidDate(text.to_string());
    let parts = split_numeric(text).ok_or_else(invalid)?;
    let [year, month, day, hour, minute, second, micro] = parts.as_slice() else {
        return Err(invalid());
    };
    let date = date_from_parts(*year, *month, *day).ok_or_else(invalid)?;
    let in_range =
        (0..=23).contains(hour) && (0..=59).contains(minute) && (0..=59).contains(second);
    if !in_range {
        return Err(invalid());
    }
    date.and_hms_micro_opt(*hour as u32, *minute as u32, *second as u32, *micro as u32)
        .ok_or_else(invalid)
}

fn date_from_parts(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month as u32, day as u32)
}
