//! Logical database types used for binds and column values.
//!
//! Each variant maps to an Oracle wire type number. Width and precision are
//! column or bind attributes, not part of the type tag.

use crate::error::{Error, Result};

use super::metadata::CS_FORM_NCHAR;

pub const ORA_TYPE_NUM_VARCHAR: u8 = 1;
pub const ORA_TYPE_NUM_NUMBER: u8 = 2;
pub const ORA_TYPE_NUM_BINARY_INTEGER: u8 = 3;
pub const ORA_TYPE_NUM_LONG: u8 = 8;
pub const ORA_TYPE_NUM_DATE: u8 = 12;
pub const ORA_TYPE_NUM_RAW: u8 = 23;
pub const ORA_TYPE_NUM_LONG_RAW: u8 = 24;
pub const ORA_TYPE_NUM_CHAR: u8 = 96;
pub const ORA_TYPE_NUM_BINARY_FLOAT: u8 = 100;
pub const ORA_TYPE_NUM_BINARY_DOUBLE: u8 = 101;
pub const ORA_TYPE_NUM_CURSOR: u8 = 102;
pub const ORA_TYPE_NUM_CLOB: u8 = 112;
pub const ORA_TYPE_NUM_BLOB: u8 = 113;
pub const ORA_TYPE_NUM_TIMESTAMP: u8 = 180;
pub const ORA_TYPE_NUM_BOOLEAN: u8 = 252;

/// Logical type tag carried by every bind and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbType {
    /// VARCHAR2 - variable-length string.
    Varchar,
    /// CHAR - fixed-length string, blank padded by the server.
    Char,
    /// LONG - legacy large text.
    Long,
    /// NUMBER - decimal number.
    Number,
    /// BINARY_INTEGER / PLS_INTEGER.
    BinaryInteger,
    /// BINARY_FLOAT.
    BinaryFloat,
    /// BINARY_DOUBLE.
    BinaryDouble,
    /// DATE - date and time to the second.
    Date,
    /// TIMESTAMP - date and time with fractional seconds.
    Timestamp,
    /// RAW - variable-length bytes.
    Raw,
    /// LONG RAW - legacy large bytes.
    LongRaw,
    /// CLOB - character large object.
    Clob,
    /// NCLOB - national character large object.
    Nclob,
    /// BLOB - binary large object.
    Blob,
    /// REF CURSOR.
    Cursor,
    /// PL/SQL BOOLEAN.
    Boolean,
}

impl DbType {
    /// Map a raw wire type number (and charset form) to a type tag.
    ///
    /// `csfrm` only matters for LOBs, where [`CS_FORM_NCHAR`] selects NCLOB.
    pub fn from_raw(type_num: u8, csfrm: u8) -> Result<Self> {
        match type_num {
            ORA_TYPE_NUM_VARCHAR => Ok(DbType::Varchar),
            ORA_TYPE_NUM_NUMBER => Ok(DbType::Number),
            ORA_TYPE_NUM_BINARY_INTEGER => Ok(DbType::BinaryInteger),
            ORA_TYPE_NUM_LONG => Ok(DbType::Long),
            ORA_TYPE_NUM_DATE => Ok(DbType::Date),
            ORA_TYPE_NUM_RAW => Ok(DbType::Raw),
            ORA_TYPE_NUM_LONG_RAW => Ok(DbType::LongRaw),
            ORA_TYPE_NUM_CHAR => Ok(DbType::Char),
            ORA_TYPE_NUM_BINARY_FLOAT => Ok(DbType::BinaryFloat),
            ORA_TYPE_NUM_BINARY_DOUBLE => Ok(DbType::BinaryDouble),
            ORA_TYPE_NUM_CURSOR => Ok(DbType::Cursor),
            ORA_TYPE_NUM_CLOB if csfrm == CS_FORM_NCHAR => Ok(DbType::Nclob),
            ORA_TYPE_NUM_CLOB => Ok(DbType::Clob),
            ORA_TYPE_NUM_BLOB => Ok(DbType::Blob),
            ORA_TYPE_NUM_TIMESTAMP => Ok(DbType::Timestamp),
            ORA_TYPE_NUM_BOOLEAN => Ok(DbType::Boolean),
            _ => Err(Error::UnsupportedType { type_num }),
        }
    }

    /// Get the Oracle type number.
    pub fn type_num(&self) -> u8 {
        match self {
            DbType::Varchar => ORA_TYPE_NUM_VARCHAR,
            DbType::Char => ORA_TYPE_NUM_CHAR,
            DbType::Long => ORA_TYPE_NUM_LONG,
            DbType::Number => ORA_TYPE_NUM_NUMBER,
            DbType::BinaryInteger => ORA_TYPE_NUM_BINARY_INTEGER,
            DbType::BinaryFloat => ORA_TYPE_NUM_BINARY_FLOAT,
            DbType::BinaryDouble => ORA_TYPE_NUM_BINARY_DOUBLE,
            DbType::Date => ORA_TYPE_NUM_DATE,
            DbType::Timestamp => ORA_TYPE_NUM_TIMESTAMP,
            DbType::Raw => ORA_TYPE_NUM_RAW,
            DbType::LongRaw => ORA_TYPE_NUM_LONG_RAW,
            DbType::Clob | DbType::Nclob => ORA_TYPE_NUM_CLOB,
            DbType::Blob => ORA_TYPE_NUM_BLOB,
            DbType::Cursor => ORA_TYPE_NUM_CURSOR,
            DbType::Boolean => ORA_TYPE_NUM_BOOLEAN,
        }
    }

    /// Types whose OUT buffer size is chosen by the caller (`max_size`).
    pub fn is_variable_length(&self) -> bool {
        matches!(
            self,
            DbType::Varchar | DbType::Char | DbType::Long | DbType::Raw | DbType::LongRaw
        )
    }

    pub fn is_lob(&self) -> bool {
        matches!(self, DbType::Clob | DbType::Nclob | DbType::Blob)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DbType::Number | DbType::BinaryInteger | DbType::BinaryFloat | DbType::BinaryDouble
        )
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, DbType::Date | DbType::Timestamp)
    }

    /// Character types, including character LOBs.
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            DbType::Varchar | DbType::Char | DbType::Long | DbType::Clob | DbType::Nclob
        )
    }

    /// Byte types, including binary LOBs.
    pub fn is_binary(&self) -> bool {
        matches!(self, DbType::Raw | DbType::LongRaw | DbType::Blob)
    }
}

impl std::fmt::Display for DbType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DbType::Varchar => "VARCHAR2",
            DbType::Char => "CHAR",
            DbType::Long => "LONG",
            DbType::Number => "NUMBER",
            DbType::BinaryInteger => "BINARY_INTEGER",
            DbType::BinaryFloat => "BINARY_FLOAT",
            DbType::BinaryDouble => "BINARY_DOUBLE",
            DbType::Date => "DATE",
            DbType::Timestamp => "TIMESTAMP",
            DbType::Raw => "RAW",
            DbType::LongRaw => "LONG RAW",
            DbType::Clob => "CLOB",
            DbType::Nclob => "NCLOB",
            DbType::Blob => "BLOB",
            DbType::Cursor => "REF CURSOR",
            DbType::Boolean => "BOOLEAN",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw() {
        assert_eq!(DbType::from_raw(ORA_TYPE_NUM_VARCHAR, 1).unwrap(), DbType::Varchar);
        assert_eq!(DbType::from_raw(ORA_TYPE_NUM_CLOB, 1).unwrap(), DbType::Clob);
        assert_eq!(DbType::from_raw(ORA_TYPE_NUM_CLOB, 2).unwrap(), DbType::Nclob);
        assert_eq!(DbType::Nclob.type_num(), ORA_TYPE_NUM_CLOB);
    }

    #[test]
    fn test_from_raw_unsupported() {
        match DbType::from_raw(255, 0) {
            Err(Error::UnsupportedType { type_num }) => assert_eq!(type_num, 255),
            other => panic!("Expected UnsupportedType error, got {:?}", other),
        }
    }

    #[test]
    fn test_classification() {
        assert!(DbType::Varchar.is_variable_length());
        assert!(!DbType::Number.is_variable_length());
        assert!(!DbType::Clob.is_variable_length());
        assert!(DbType::Clob.is_text() && DbType::Clob.is_lob());
        assert!(DbType::Blob.is_binary() && DbType::Blob.is_lob());
        assert!(DbType::Timestamp.is_temporal());
    }

    #[test]
    fn test_display() {
        assert_eq!(DbType::Varchar.to_string(), "VARCHAR2");
        assert_eq!(DbType::Cursor.to_string(), "REF CURSOR");
    }
}
