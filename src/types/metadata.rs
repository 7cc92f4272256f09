//! Describe information as a [`Session`](crate::Session) reports it, before
//! the type number is resolved into a [`DbType`](super::DbType).

/// Character set form of national character data (NCHAR, NVARCHAR2, NCLOB).
pub const CS_FORM_NCHAR: u8 = 2;
/// Character set form of ordinary character data.
pub const CS_FORM_IMPLICIT: u8 = 1;

/// One select-list item exactly as described by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMetadata {
    pub name: String,
    pub oracle_type: u8,
    pub csfrm: u8,
    pub precision: i8,
    pub scale: i8,
    pub max_size: u32,
    pub nullable: bool,
}

impl ColumnMetadata {
    /// A nullable column of `oracle_type` in the database character set.
    pub fn new(name: impl Into<String>, oracle_type: u8) -> Self {
        Self {
            name: name.into(),
            oracle_type,
            csfrm: CS_FORM_IMPLICIT,
            precision: 0,
            scale: 0,
            max_size: 0,
            nullable: true,
        }
    }

    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_precision(mut self, precision: i8, scale: i8) -> Self {
        self.precision = precision;
        self.scale = scale;
        self
    }

    /// Marks the column as national character data.
    pub fn national(mut self) -> Self {
        self.csfrm = CS_FORM_NCHAR;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}
