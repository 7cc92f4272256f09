//! Caller-visible values for binds, out binds and row columns.

use super::{ColumnMetadata, LobLocator};
use crate::error::{Error, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fmt;

/// Calendar fields as supplied by a caller, before normalization.
///
/// Fields may be out of range: they are rolled forward the way a calendar
/// does, so day 30 of February 2016 becomes 1 March 2016 and hour 24 becomes
/// midnight of the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub year: i32,
    /// 1-based month; 13 is January of the next year.
    pub month: u32,
    /// 1-based day; 0 is the last day of the previous month.
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub nanosecond: u32,
}

impl DateParts {
    /// Midnight on the given (possibly out of range) calendar day.
    pub fn ymd(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0,
            nanosecond: 0,
        }
    }

    /// Set the time of day.
    pub fn and_hms(mut self, hour: u32, minute: u32, second: u32) -> Self {
        self.hour = hour;
        self.minute = minute;
        self.second = second;
        self
    }

    /// Set the fractional second.
    pub fn with_nanosecond(mut self, nanosecond: u32) -> Self {
        self.nanosecond = nanosecond;
        self
    }

    /// Normalize into a valid date and time, rolling overflowing fields forward.
    pub fn normalize(&self) -> Result<NaiveDateTime> {
        let months = self.year as i64 * 12 + self.month as i64 - 1;
        let year = i32::try_from(months.div_euclid(12))
            .map_err(|_| Error::invalid_temporal(format!("year out of range: {:?}", self)))?;
        let month = months.rem_euclid(12) as u32 + 1;

        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| Error::invalid_temporal(format!("year out of range: {:?}", self)))?
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| Error::invalid_temporal("invalid midnight"))?;

        let offset = Duration::days(self.day as i64 - 1)
            + Duration::hours(self.hour as i64)
            + Duration::minutes(self.minute as i64)
            + Duration::seconds(self.second as i64)
            + Duration::nanoseconds(self.nanosecond as i64);

        first
            .checked_add_signed(offset)
            .ok_or_else(|| Error::invalid_temporal(format!("date out of range: {:?}", self)))
    }
}

/// Server-side cursor returned by a REF CURSOR out bind or a cursor column.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorLocator {
    /// Cursor ID assigned by the server (0 is never a valid cursor).
    pub cursor_id: u32,
    /// Describe information for the cursor's columns.
    pub columns: Vec<ColumnMetadata>,
}

impl CursorLocator {
    pub fn new(cursor_id: u32, columns: Vec<ColumnMetadata>) -> Self {
        Self { cursor_id, columns }
    }
}

/// A single bind or column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL.
    Null,
    /// Integral number.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Decimal number as text (preserves precision beyond f64).
    Number(String),
    /// Character data.
    String(String),
    /// Binary data.
    Bytes(Vec<u8>),
    /// PL/SQL boolean.
    Boolean(bool),
    /// Date and time.
    Date(NaiveDateTime),
    /// Unnormalized calendar fields, rolled forward on bind.
    DateParts(DateParts),
    /// Large object locator.
    Lob(LobLocator),
    /// Server-side cursor.
    Cursor(CursorLocator),
    /// PL/SQL index-by table.
    Array(Vec<Value>),
    /// Name-keyed structure. Cannot be bound as a scalar.
    Object(Vec<(String, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Borrowed text of `String` and `Number` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Number(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::Number(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Number(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_lob(&self) -> Option<&LobLocator> {
        match self {
            Value::Lob(lob) => Some(lob),
            _ => None,
        }
    }

    pub fn as_cursor(&self) -> Option<&CursorLocator> {
        match self {
            Value::Cursor(cursor) => Some(cursor),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Length used for bind buffer sizing: characters for text, bytes for binary.
    pub fn bind_len(&self) -> usize {
        match self {
            Value::String(s) => s.chars().count(),
            Value::Bytes(b) => b.len(),
            _ => 0,
        }
    }

    /// Short name of the variant, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Boolean(_) => "boolean",
            Value::Date(_) | Value::DateParts(_) => "date",
            Value::Lob(_) => "lob",
            Value::Cursor(_) => "cursor",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Bytes(b) => write!(f, "<RAW: {} bytes>", b.len()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S%.f")),
            Value::DateParts(p) => write!(
                f,
                "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                p.year, p.month, p.day, p.hour, p.minute, p.second
            ),
            Value::Lob(lob) if lob.is_blob() => write!(f, "<BLOB: {} bytes>", lob.size),
            Value::Lob(lob) => write!(f, "<CLOB: {} chars>", lob.size),
            Value::Cursor(c) => write!(f, "<CURSOR: {}>", c.cursor_id),
            Value::Array(items) => write!(f, "<ARRAY: {} elements>", items.len()),
            Value::Object(fields) => write!(f, "<OBJECT: {} fields>", fields.len()),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::Date(v)
    }
}

impl From<DateParts> for Value {
    fn from(v: DateParts) -> Self {
        Value::DateParts(v)
    }
}

impl From<LobLocator> for Value {
    fn from(v: LobLocator) -> Self {
        Value::Lob(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_value_null() {
        let val = Value::Null;
        assert!(val.is_null());
        assert_eq!(val.as_str(), None);
        assert_eq!(format!("{}", val), "NULL");
        assert_eq!(Value::from(None::<i64>), Value::Null);
    }

    #[test]
    fn test_value_number() {
        let val = Value::Number("123.45".to_string());
        assert_eq!(val.as_str(), Some("123.45"));
        assert_eq!(val.to_i64(), None);
        assert_eq!(val.to_f64(), Some(123.45));

        let int_val = Value::Integer(42);
        assert_eq!(int_val.to_i64(), Some(42));
        assert_eq!(int_val.to_f64(), Some(42.0));
    }

    #[test]
    fn test_date_parts_rollover() {
        let dt = DateParts::ymd(2016, 2, 30).normalize().unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2016, 3, 1));

        let dt = DateParts::ymd(2015, 2, 29).normalize().unwrap();
        assert_eq!((dt.month(), dt.day()), (3, 1));

        let dt = DateParts::ymd(2020, 13, 1).normalize().unwrap();
        assert_eq!((dt.year(), dt.month()), (2021, 1));

        let dt = DateParts::ymd(2020, 3, 0).normalize().unwrap();
        assert_eq!((dt.month(), dt.day()), (2, 29));
    }

    #[test]
    fn test_date_parts_time_rollover() {
        let dt = DateParts::ymd(2016, 12, 31)
            .and_hms(24, 0, 0)
            .normalize()
            .unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day(), dt.hour()), (2017, 1, 1, 0));
    }

    #[test]
    fn test_bind_len_counts_chars() {
        assert_eq!(Value::from("añb").bind_len(), 3);
        assert_eq!(Value::from(vec![0u8; 4]).bind_len(), 4);
    }
}
