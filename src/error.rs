//! Error types for the bind and marshal engine.
//!
//! Every variant belongs to one [`ErrorKind`]. Bind validation and conversion
//! errors are raised before any round trip to the session; backend errors are
//! passed through unchanged.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for bind engine operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Identifies a bind slot in error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindSlot {
    /// 1-based position.
    Position(usize),
    /// Normalized bind name.
    Name(String),
}

impl fmt::Display for BindSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindSlot::Position(pos) => write!(f, "bind position {}", pos),
            BindSlot::Name(name) => write!(f, "bind \"{}\"", name),
        }
    }
}

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller supplied bindings that cannot be used. Raised before any round trip.
    BindValidation,
    /// A value cannot be converted to or from its wire form.
    Conversion,
    /// Operation against a closed or invalidated handle.
    ResourceState,
    /// Failure reported by the database, passed through unchanged.
    BackendExecution,
    /// I/O failure while streaming a LOB or a cursor.
    Stream,
    /// Malformed data or disagreement returned by the session.
    Protocol,
}

/// Error type for bind, conversion and resource operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Value does not match the declared bind type.
    #[error("encountered bind value and type mismatch for {slot}")]
    BindValueTypeMismatch { slot: BindSlot },

    /// Value shape cannot be bound at all.
    #[error("encountered invalid bind data type in parameter {position}")]
    InvalidBindDataType { position: usize },

    /// Direction code outside IN, OUT and IN OUT.
    #[error("invalid bind direction")]
    InvalidBindDirection,

    /// Bind descriptor carries none of direction, type, max size or value.
    #[error("bind object must contain one of the following attributes: \"dir\", \"type\", \"maxSize\", or \"val\"")]
    InvalidBindUnit,

    /// Positional bind list contains a name-keyed entry.
    #[error("binding by position and name cannot be mixed")]
    MixedBind,

    /// OUT or IN OUT variable-length bind without a usable max size.
    #[error("maxSize for {slot} must be specified and be greater than zero")]
    MissingMaxSize { slot: BindSlot },

    /// OUT or IN OUT bind without a type while strict typing is enabled.
    #[error("type must be specified for {slot}")]
    MissingType { slot: BindSlot },

    /// Supplied value is longer than the declared max size.
    #[error("maxSize of {max_size} is too small for value of length {length} in {slot}")]
    MaxSizeTooSmall {
        slot: BindSlot,
        max_size: u32,
        length: usize,
    },

    /// OUT value returned by the database is longer than the bind's max size.
    #[error("buffer is too small for OUT binds")]
    OutBufferTooSmall,

    /// Named bind that does not appear in the statement.
    #[error("no bind placeholder named \":{name}\" was found in the statement text")]
    InvalidBindName { name: String },

    /// Positional bind count differs from the number of distinct placeholders.
    #[error("{expected} positional bind values are required but {actual} were provided")]
    WrongNumberOfPositionalBinds { expected: usize, actual: usize },

    /// Placeholder that received no value.
    #[error("a bind variable replacement value for placeholder \":{name}\" was not provided")]
    MissingBindValue { name: String },

    /// Array element whose type differs from the array's element type.
    #[error("invalid data type at array index {index} for {slot}")]
    IncompatibleArrayElement { index: usize, slot: BindSlot },

    /// Element type that cannot be used in an array bind.
    #[error("data type is unsupported for array bind")]
    InvalidTypeForArrayBind,

    /// OUT or IN OUT array bind without a max array size.
    #[error("maxArraySize is required for IN OUT array bind")]
    RequiredMaxArraySize,

    /// Array longer than its declared max array size.
    #[error("length of given array is greater than \"maxArraySize\"")]
    InvalidArraySize,

    /// NaN bound to a numeric type.
    #[error("value is not a number (NaN) and cannot be used in Oracle Database numbers")]
    NanValue,

    /// Value outside the range an Oracle NUMBER can hold.
    #[error("value cannot be represented as an Oracle Database number")]
    NumberNoRepresentation,

    /// Calendar fields that cannot be normalized into a date.
    #[error("invalid temporal value: {message}")]
    InvalidTemporal { message: String },

    /// Generic conversion failure.
    #[error("Type conversion error: {message}")]
    TypeConversion { message: String },

    /// Operation on a closed result set.
    #[error("invalid ResultSet")]
    InvalidResultSet,

    /// Stream conversion requested after fetch methods were used.
    #[error("cannot convert ResultSet to QueryStream after invoking methods")]
    CannotConvertToStream,

    /// Operation on an invalidated LOB.
    #[error("invalid Lob")]
    InvalidLob,

    /// Close called on a LOB that was already closed.
    #[error("LOB was already closed")]
    LobClosed,

    /// Cursor locator that does not refer to an open server cursor.
    #[error("invalid cursor")]
    InvalidCursor,

    /// Property assignment with a value the property rejects.
    #[error("invalid value for property \"{property}\"")]
    InvalidPropertyValue { property: &'static str },

    /// Owning connection was closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// An error raised by the server, passed through unchanged.
    #[error("ORA-{code:05}: {message}")]
    Oracle { code: u32, message: String },

    /// Session round trip exceeded the configured call timeout.
    #[error("call timeout of {} ms exceeded", timeout.as_millis())]
    CallTimeout { timeout: Duration },

    /// I/O failure while streaming.
    #[error("Stream error: {message}")]
    Stream { message: String },

    /// The session returned data this crate cannot interpret.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// A described column uses a type number with no [`DbType`](crate::DbType).
    #[error("Unsupported Oracle data type: {type_num}")]
    UnsupportedType { type_num: u8 },

    /// A row lookup named a column absent from the select list.
    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },
}

impl Error {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    pub fn oracle(code: u32, message: impl Into<String>) -> Self {
        Self::Oracle {
            code,
            message: message.into(),
        }
    }

    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion {
            message: message.into(),
        }
    }

    /// Create a stream error.
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream {
            message: message.into(),
        }
    }

    /// Create a temporal conversion error.
    pub fn invalid_temporal(message: impl Into<String>) -> Self {
        Self::InvalidTemporal {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BindValueTypeMismatch { .. }
            | Error::InvalidBindDataType { .. }
            | Error::InvalidBindDirection
            | Error::InvalidBindUnit
            | Error::MixedBind
            | Error::MissingMaxSize { .. }
            | Error::MissingType { .. }
            | Error::MaxSizeTooSmall { .. }
            | Error::OutBufferTooSmall
            | Error::InvalidBindName { .. }
            | Error::WrongNumberOfPositionalBinds { .. }
            | Error::MissingBindValue { .. }
            | Error::IncompatibleArrayElement { .. }
            | Error::InvalidTypeForArrayBind
            | Error::RequiredMaxArraySize
            | Error::InvalidArraySize
            | Error::InvalidPropertyValue { .. } => ErrorKind::BindValidation,
            Error::NanValue
            | Error::NumberNoRepresentation
            | Error::InvalidTemporal { .. }
            | Error::TypeConversion { .. } => ErrorKind::Conversion,
            Error::InvalidResultSet
            | Error::CannotConvertToStream
            | Error::InvalidLob
            | Error::LobClosed
            | Error::InvalidCursor
            | Error::ConnectionClosed => ErrorKind::ResourceState,
            Error::Oracle { .. } | Error::CallTimeout { .. } => ErrorKind::BackendExecution,
            Error::Stream { .. } => ErrorKind::Stream,
            Error::Protocol { .. } | Error::UnsupportedType { .. } | Error::ColumnNotFound { .. } => {
                ErrorKind::Protocol
            }
        }
    }

    /// Whether an OUT value did not fit its buffer: ORA-06502 (character
    /// string buffer too small), ORA-01406 (truncated fetch) or a promoted
    /// PL/SQL bind that came back longer than its max size.
    pub fn is_buffer_too_small(&self) -> bool {
        matches!(
            self,
            Error::Oracle { code: 6502 | 1406, .. } | Error::OutBufferTooSmall
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::NanValue.kind(), ErrorKind::Conversion);
        assert_eq!(Error::InvalidResultSet.kind(), ErrorKind::ResourceState);
        assert_eq!(Error::MixedBind.kind(), ErrorKind::BindValidation);
        assert_eq!(Error::oracle(1, "unique constraint").kind(), ErrorKind::BackendExecution);
        assert_eq!(Error::stream("reset").kind(), ErrorKind::Stream);
    }

    #[test]
    fn test_oracle_error_display() {
        let err = Error::oracle(6502, "PL/SQL: numeric or value error");
        assert_eq!(err.to_string(), "ORA-06502: PL/SQL: numeric or value error");
        assert!(err.is_buffer_too_small());
        assert!(!Error::oracle(1, "x").is_buffer_too_small());
    }

    #[test]
    fn test_slot_display() {
        let err = Error::MissingMaxSize {
            slot: BindSlot::Position(2),
        };
        assert_eq!(
            err.to_string(),
            "maxSize for bind position 2 must be specified and be greater than zero"
        );
        let err = Error::MissingType {
            slot: BindSlot::Name("OUT1".to_string()),
        };
        assert_eq!(err.to_string(), "type must be specified for bind \"OUT1\"");
    }

    #[test]
    fn test_call_timeout_display() {
        let err = Error::CallTimeout {
            timeout: Duration::from_millis(1500),
        };
        assert_eq!(err.to_string(), "call timeout of 1500 ms exceeded");
    }
}
