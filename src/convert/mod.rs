//! Type conversion table.
//!
//! Every [`DbType`] has one [`TypeConversion`] entry holding plain functions:
//! a shape predicate used by bind validation, an encoder from [`Value`] to
//! [`WireValue`] and a decoder back. All type-specific behavior routes
//! through [`conversion_for`]; nothing else matches on value shapes.
//!
//! Null rules:
//! - absent values and `Value::Null` encode to SQL NULL for every type;
//! - zero-length text and bytes encode to SQL NULL for text, raw and LOB types;
//! - SQL NULL decodes to `Value::Null` regardless of type.
//!
//! Temporal rules: DATE truncates to whole seconds, TIMESTAMP to the configured
//! scale, and out-of-range calendar fields roll forward.

mod date;
mod number;

pub use date::{
    decode_oracle_date, decode_oracle_timestamp, encode_oracle_date, encode_oracle_timestamp,
    truncate_fraction,
};
pub use number::{decode_oracle_number, encode_f64, encode_i64, encode_oracle_number, number_to_value};

use bytes::Bytes;
use chrono::NaiveDateTime;

use crate::config::ConvertConfig;
use crate::error::{Error, Result};
use crate::types::{CursorLocator, DbType, LobKind, LobLocator, Value};

/// A value in the form exchanged with the session.
#[derive(Debug, Clone, PartialEq)]
pub enum WireValue {
    /// SQL NULL.
    Null,
    /// Oracle NUMBER bytes.
    Number(Bytes),
    /// IEEE double.
    BinaryDouble(f64),
    /// IEEE single.
    BinaryFloat(f32),
    /// Character data.
    Text(String),
    /// Byte data.
    Raw(Bytes),
    /// DATE (7 bytes) or TIMESTAMP (11 bytes).
    Date(Bytes),
    /// PL/SQL boolean.
    Boolean(bool),
    /// LOB locator.
    Lob(LobLocator),
    /// Cursor locator.
    Cursor(CursorLocator),
    /// PL/SQL index-by table elements.
    Array(Vec<WireValue>),
}

impl WireValue {
    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::Null)
    }

    /// Length the session reports against an OUT buffer: characters for
    /// text, bytes for raw.
    pub fn buffer_len(&self) -> usize {
        match self {
            WireValue::Text(s) => s.chars().count(),
            WireValue::Raw(b) => b.len(),
            _ => 0,
        }
    }
}

type EncodeFn = fn(&Value, &ConvertConfig) -> Result<WireValue>;
type DecodeFn = fn(WireValue, &ConvertConfig) -> Result<Value>;
type AcceptsFn = fn(&Value) -> bool;

/// Conversion functions for one database type.
pub struct TypeConversion {
    pub db_type: DbType,
    /// Whether a non-null value has a shape this type can bind.
    pub accepts: AcceptsFn,
    /// Encode a non-null value.
    pub encode: EncodeFn,
    /// Decode a non-null wire value.
    pub decode: DecodeFn,
}

static TABLE: [TypeConversion; 16] = [
    entry(DbType::Varchar, accepts_text, encode_text, decode_text),
    entry(DbType::Char, accepts_text, encode_text, decode_text),
    entry(DbType::Long, accepts_text, encode_text, decode_text),
    entry(DbType::Number, accepts_number, encode_number, decode_number),
    entry(DbType::BinaryInteger, accepts_integer, encode_number, decode_integer),
    entry(DbType::BinaryFloat, accepts_number, encode_binary_float, decode_float),
    entry(DbType::BinaryDouble, accepts_number, encode_binary_double, decode_float),
    entry(DbType::Date, accepts_temporal, encode_date, decode_temporal),
    entry(DbType::Timestamp, accepts_temporal, encode_timestamp, decode_temporal),
    entry(DbType::Raw, accepts_bytes, encode_raw, decode_raw),
    entry(DbType::LongRaw, accepts_bytes, encode_raw, decode_raw),
    entry(DbType::Clob, accepts_clob, encode_lob, decode_lob),
    entry(DbType::Nclob, accepts_clob, encode_lob, decode_lob),
    entry(DbType::Blob, accepts_blob, encode_lob, decode_lob),
    entry(DbType::Cursor, accepts_cursor, encode_cursor, decode_cursor),
    entry(DbType::Boolean, accepts_boolean, encode_boolean, decode_boolean),
];

const fn entry(
    db_type: DbType,
    accepts: AcceptsFn,
    encode: EncodeFn,
    decode: DecodeFn,
) -> TypeConversion {
    TypeConversion {
        db_type,
        accepts,
        encode,
        decode,
    }
}

/// Look up the conversion entry for a type.
pub fn conversion_for(db_type: DbType) -> &'static TypeConversion {
    let index = match db_type {
        DbType::Varchar => 0,
        DbType::Char => 1,
        DbType::Long => 2,
        DbType::Number => 3,
        DbType::BinaryInteger => 4,
        DbType::BinaryFloat => 5,
        DbType::BinaryDouble => 6,
        DbType::Date => 7,
        DbType::Timestamp => 8,
        DbType::Raw => 9,
        DbType::LongRaw => 10,
        DbType::Clob => 11,
        DbType::Nclob => 12,
        DbType::Blob => 13,
        DbType::Cursor => 14,
        DbType::Boolean => 15,
    };
    &TABLE[index]
}

/// Whether a bind value is sent as SQL NULL for `db_type`.
pub fn is_nullish(db_type: DbType, value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty() && (db_type.is_text() || db_type.is_binary()),
        Some(Value::Bytes(b)) => b.is_empty() && (db_type.is_text() || db_type.is_binary()),
        _ => false,
    }
}

/// Shape predicate: can `value` be bound as `db_type`?
///
/// Null is always accepted. NaN is never accepted by numeric types.
pub fn validate(db_type: DbType, value: &Value) -> bool {
    value.is_null() || (conversion_for(db_type).accepts)(value)
}

/// Encode a bind value (absent means NULL).
pub fn encode(db_type: DbType, value: Option<&Value>, config: &ConvertConfig) -> Result<WireValue> {
    if is_nullish(db_type, value) {
        return Ok(WireValue::Null);
    }
    let Some(value) = value else {
        return Ok(WireValue::Null);
    };
    if let Value::Array(items) = value {
        return items
            .iter()
            .map(|item| encode(db_type, Some(item), config))
            .collect::<Result<Vec<_>>>()
            .map(WireValue::Array);
    }
    if matches!(value, Value::Float(f) if f.is_nan()) && db_type.is_numeric() {
        return Err(Error::NanValue);
    }
    let conv = conversion_for(db_type);
    if !(conv.accepts)(value) {
        return Err(mismatch(db_type, value));
    }
    (conv.encode)(value, config)
}

/// Decode a wire value reported for `db_type`.
pub fn decode(db_type: DbType, wire: WireValue, config: &ConvertConfig) -> Result<Value> {
    match wire {
        WireValue::Null => Ok(Value::Null),
        WireValue::Array(items) => items
            .into_iter()
            .map(|item| decode(db_type, item, config))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        wire => (conversion_for(db_type).decode)(wire, config),
    }
}

/// Type inferred for a bare bind value, or `None` when no type follows from it.
pub fn infer_type(value: &Value) -> Option<DbType> {
    match value {
        Value::String(_) => Some(DbType::Varchar),
        Value::Integer(_) | Value::Float(_) | Value::Number(_) => Some(DbType::Number),
        Value::Bytes(_) => Some(DbType::Raw),
        Value::Date(_) | Value::DateParts(_) => Some(DbType::Timestamp),
        Value::Boolean(_) => Some(DbType::Boolean),
        Value::Lob(lob) => Some(lob.kind.db_type()),
        Value::Cursor(_) => Some(DbType::Cursor),
        Value::Array(items) => items.iter().find(|v| !v.is_null()).and_then(infer_type),
        Value::Null | Value::Object(_) => None,
    }
}

fn mismatch(db_type: DbType, value: &Value) -> Error {
    Error::type_conversion(format!("cannot bind {} value as {}", value.kind_name(), db_type))
}

fn unexpected_wire(db_type: DbType, wire: &WireValue) -> Error {
    Error::protocol(format!("unexpected wire value for {}: {:?}", db_type, wire))
}

fn is_numeric_text(s: &str) -> bool {
    encode_oracle_number(s).is_ok()
}

// Shape predicates.

fn accepts_text(value: &Value) -> bool {
    matches!(value, Value::String(_))
}

fn accepts_number(value: &Value) -> bool {
    match value {
        Value::Integer(_) => true,
        Value::Float(f) => !f.is_nan(),
        Value::Number(s) | Value::String(s) => is_numeric_text(s),
        _ => false,
    }
}

fn accepts_integer(value: &Value) -> bool {
    match value {
        Value::Integer(_) => true,
        Value::Float(f) => f.is_finite() && f.fract() == 0.0,
        Value::Number(s) | Value::String(s) => s.trim().parse::<i64>().is_ok(),
        _ => false,
    }
}

fn accepts_temporal(value: &Value) -> bool {
    matches!(value, Value::Date(_) | Value::DateParts(_))
}

fn accepts_bytes(value: &Value) -> bool {
    matches!(value, Value::Bytes(_))
}

fn accepts_clob(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Lob(lob) => lob.kind == LobKind::Clob,
        _ => false,
    }
}

fn accepts_blob(value: &Value) -> bool {
    match value {
        Value::Bytes(_) => true,
        Value::Lob(lob) => lob.kind == LobKind::Blob,
        _ => false,
    }
}

fn accepts_cursor(value: &Value) -> bool {
    matches!(value, Value::Cursor(_))
}

fn accepts_boolean(value: &Value) -> bool {
    matches!(value, Value::Boolean(_))
}

// Encoders. Callers have already checked the shape.

fn encode_text(value: &Value, _: &ConvertConfig) -> Result<WireValue> {
    match value {
        Value::String(s) => Ok(WireValue::Text(s.clone())),
        other => Err(mismatch(DbType::Varchar, other)),
    }
}

fn encode_number(value: &Value, _: &ConvertConfig) -> Result<WireValue> {
    let bytes = match value {
        Value::Integer(i) => encode_i64(*i)?,
        Value::Float(f) => encode_f64(*f)?,
        Value::Number(s) | Value::String(s) => encode_oracle_number(s)?,
        other => return Err(mismatch(DbType::Number, other)),
    };
    Ok(WireValue::Number(Bytes::from(bytes)))
}

fn float_of(value: &Value, db_type: DbType) -> Result<f64> {
    let f = match value {
        Value::Integer(i) => *i as f64,
        Value::Float(f) => *f,
        Value::Number(s) | Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| mismatch(db_type, value))?,
        other => return Err(mismatch(db_type, other)),
    };
    if f.is_nan() {
        return Err(Error::NanValue);
    }
    Ok(f)
}

fn encode_binary_double(value: &Value, _: &ConvertConfig) -> Result<WireValue> {
    float_of(value, DbType::BinaryDouble).map(WireValue::BinaryDouble)
}

fn encode_binary_float(value: &Value, _: &ConvertConfig) -> Result<WireValue> {
    float_of(value, DbType::BinaryFloat).map(|f| WireValue::BinaryFloat(f as f32))
}

fn temporal_of(value: &Value, db_type: DbType) -> Result<NaiveDateTime> {
    match value {
        Value::Date(dt) => Ok(*dt),
        Value::DateParts(parts) => parts.normalize(),
        other => Err(mismatch(db_type, other)),
    }
}

fn encode_date(value: &Value, _: &ConvertConfig) -> Result<WireValue> {
    let dt = temporal_of(value, DbType::Date)?;
    Ok(WireValue::Date(Bytes::copy_from_slice(&encode_oracle_date(dt)?)))
}

fn encode_timestamp(value: &Value, config: &ConvertConfig) -> Result<WireValue> {
    let dt = temporal_of(value, DbType::Timestamp)?;
    let bytes = encode_oracle_timestamp(dt, config.timestamp_scale)?;
    Ok(WireValue::Date(Bytes::copy_from_slice(&bytes)))
}

fn encode_raw(value: &Value, _: &ConvertConfig) -> Result<WireValue> {
    match value {
        Value::Bytes(b) => Ok(WireValue::Raw(Bytes::copy_from_slice(b))),
        other => Err(mismatch(DbType::Raw, other)),
    }
}

fn encode_lob(value: &Value, _: &ConvertConfig) -> Result<WireValue> {
    match value {
        Value::Lob(lob) => Ok(WireValue::Lob(lob.clone())),
        other => Err(Error::type_conversion(format!(
            "{} value must be written to a temporary LOB before it is bound",
            other.kind_name()
        ))),
    }
}

fn encode_cursor(value: &Value, _: &ConvertConfig) -> Result<WireValue> {
    match value {
        Value::Cursor(cursor) => Ok(WireValue::Cursor(cursor.clone())),
        other => Err(mismatch(DbType::Cursor, other)),
    }
}

fn encode_boolean(value: &Value, _: &ConvertConfig) -> Result<WireValue> {
    match value {
        Value::Boolean(b) => Ok(WireValue::Boolean(*b)),
        other => Err(mismatch(DbType::Boolean, other)),
    }
}

// Decoders. Null and arrays are handled by `decode`.

fn decode_text(wire: WireValue, _: &ConvertConfig) -> Result<Value> {
    match wire {
        WireValue::Text(s) if s.is_empty() => Ok(Value::Null),
        WireValue::Text(s) => Ok(Value::String(s)),
        other => Err(unexpected_wire(DbType::Varchar, &other)),
    }
}

fn decode_number(wire: WireValue, config: &ConvertConfig) -> Result<Value> {
    match wire {
        WireValue::Number(bytes) => {
            let text = decode_oracle_number(&bytes)?;
            if config.as_string(DbType::Number) {
                Ok(Value::String(text))
            } else {
                Ok(number_to_value(text))
            }
        }
        other => Err(unexpected_wire(DbType::Number, &other)),
    }
}

fn decode_integer(wire: WireValue, config: &ConvertConfig) -> Result<Value> {
    match decode_number(wire, config)? {
        Value::Float(f) => Err(Error::protocol(format!("BINARY_INTEGER value {} is not integral", f))),
        other => Ok(other),
    }
}

fn decode_float(wire: WireValue, config: &ConvertConfig) -> Result<Value> {
    let f = match wire {
        WireValue::BinaryDouble(f) => f,
        WireValue::BinaryFloat(f) => f as f64,
        other => return Err(unexpected_wire(DbType::BinaryDouble, &other)),
    };
    if config.as_string(DbType::BinaryDouble) || config.as_string(DbType::BinaryFloat) {
        Ok(Value::String(f.to_string()))
    } else {
        Ok(Value::Float(f))
    }
}

fn decode_temporal(wire: WireValue, config: &ConvertConfig) -> Result<Value> {
    let dt = match wire {
        WireValue::Date(bytes) => decode_oracle_timestamp(&bytes)?,
        other => return Err(unexpected_wire(DbType::Timestamp, &other)),
    };
    if config.as_string(DbType::Date) || config.as_string(DbType::Timestamp) {
        Ok(Value::String(dt.format(&config.date_format).to_string()))
    } else {
        Ok(Value::Date(dt))
    }
}

fn decode_raw(wire: WireValue, _: &ConvertConfig) -> Result<Value> {
    match wire {
        WireValue::Raw(b) if b.is_empty() => Ok(Value::Null),
        WireValue::Raw(b) => Ok(Value::Bytes(b.to_vec())),
        other => Err(unexpected_wire(DbType::Raw, &other)),
    }
}

fn decode_lob(wire: WireValue, _: &ConvertConfig) -> Result<Value> {
    match wire {
        WireValue::Lob(lob) => Ok(Value::Lob(lob)),
        // PL/SQL LOB promotions come back as plain text or bytes.
        WireValue::Text(s) if s.is_empty() => Ok(Value::Null),
        WireValue::Text(s) => Ok(Value::String(s)),
        WireValue::Raw(b) if b.is_empty() => Ok(Value::Null),
        WireValue::Raw(b) => Ok(Value::Bytes(b.to_vec())),
        other => Err(unexpected_wire(DbType::Clob, &other)),
    }
}

fn decode_cursor(wire: WireValue, _: &ConvertConfig) -> Result<Value> {
    match wire {
        WireValue::Cursor(cursor) if cursor.cursor_id == 0 => Err(Error::InvalidCursor),
        WireValue::Cursor(cursor) => Ok(Value::Cursor(cursor)),
        other => Err(unexpected_wire(DbType::Cursor, &other)),
    }
}

fn decode_boolean(wire: WireValue, _: &ConvertConfig) -> Result<Value> {
    match wire {
        WireValue::Boolean(b) => Ok(Value::Boolean(b)),
        other => Err(unexpected_wire(DbType::Boolean, &other)),
    }
}
