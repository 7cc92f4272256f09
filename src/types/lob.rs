//! LOB locator types for CLOB, NCLOB and BLOB values.
//!
//! A locator is an opaque byte sequence issued by the server that identifies a
//! large object. The [`crate::Lob`] resource wraps a locator for chunked I/O;
//! this module only holds the plain data carried on the wire.

use bytes::Bytes;

use super::DbType;

/// Character or binary large object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobKind {
    /// Character data (CLOB, NCLOB). Offsets and lengths count characters.
    Clob,
    /// Binary data (BLOB). Offsets and lengths count bytes.
    Blob,
}

impl LobKind {
    /// LOB kind stored under a database type, if it is a LOB type.
    pub fn from_db_type(db_type: DbType) -> Option<Self> {
        match db_type {
            DbType::Clob | DbType::Nclob => Some(LobKind::Clob),
            DbType::Blob => Some(LobKind::Blob),
            _ => None,
        }
    }

    /// Database type used when binding a LOB of this kind.
    pub fn db_type(&self) -> DbType {
        match self {
            LobKind::Clob => DbType::Clob,
            LobKind::Blob => DbType::Blob,
        }
    }
}

/// LOB locator handle returned by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct LobLocator {
    /// Raw locator bytes from the server.
    pub locator: Bytes,
    /// Character or binary.
    pub kind: LobKind,
    /// Length in characters (CLOB) or bytes (BLOB) when the locator was issued.
    pub size: u64,
    /// Server-negotiated I/O unit.
    pub chunk_size: u32,
    /// Whether the server allocated this LOB as a temporary.
    pub is_temp: bool,
}

impl LobLocator {
    /// Create a new LOB locator.
    pub fn new(locator: impl Into<Bytes>, kind: LobKind, size: u64, chunk_size: u32) -> Self {
        Self {
            locator: locator.into(),
            kind,
            size,
            chunk_size,
            is_temp: false,
        }
    }

    /// Mark the locator as referring to a temporary LOB.
    pub fn temporary(mut self) -> Self {
        self.is_temp = true;
        self
    }

    pub fn is_blob(&self) -> bool {
        self.kind == LobKind::Blob
    }
}

/// A piece of LOB content.
#[derive(Debug, Clone, PartialEq)]
pub enum LobData {
    /// Character content of a CLOB.
    Text(String),
    /// Byte content of a BLOB.
    Bytes(Bytes),
}

impl LobData {
    /// Length in LOB units: characters for text, bytes for binary.
    pub fn len(&self) -> u64 {
        match self {
            LobData::Text(s) => s.chars().count() as u64,
            LobData::Bytes(b) => b.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            LobData::Text(s) => s.is_empty(),
            LobData::Bytes(b) => b.is_empty(),
        }
    }

    /// LOB kind this data can be written to.
    pub fn kind(&self) -> LobKind {
        match self {
            LobData::Text(_) => LobKind::Clob,
            LobData::Bytes(_) => LobKind::Blob,
        }
    }

    /// Empty data for a LOB kind.
    pub fn empty(kind: LobKind) -> Self {
        match kind {
            LobKind::Clob => LobData::Text(String::new()),
            LobKind::Blob => LobData::Bytes(Bytes::new()),
        }
    }

    /// Append another piece of the same kind.
    pub(crate) fn append(&mut self, other: LobData) {
        match (self, other) {
            (LobData::Text(s), LobData::Text(o)) => s.push_str(&o),
            (LobData::Bytes(b), LobData::Bytes(o)) => {
                let mut joined = Vec::with_capacity(b.len() + o.len());
                joined.extend_from_slice(b);
                joined.extend_from_slice(&o);
                *b = Bytes::from(joined);
            }
            _ => {}
        }
    }

    /// Split off the first `units` characters or bytes, leaving the rest in `self`.
    pub(crate) fn split_to(&mut self, units: usize) -> LobData {
        match self {
            LobData::Text(s) => {
                let byte_idx = s.char_indices().nth(units).map(|(i, _)| i).unwrap_or(s.len());
                let rest = s.split_off(byte_idx);
                LobData::Text(std::mem::replace(s, rest))
            }
            LobData::Bytes(b) => {
                let at = units.min(b.len());
                LobData::Bytes(b.split_to(at))
            }
        }
    }
}

impl From<&str> for LobData {
    fn from(s: &str) -> Self {
        LobData::Text(s.to_string())
    }
}

impl From<String> for LobData {
    fn from(s: String) -> Self {
        LobData::Text(s)
    }
}

impl From<Vec<u8>> for LobData {
    fn from(b: Vec<u8>) -> Self {
        LobData::Bytes(Bytes::from(b))
    }
}

impl From<Bytes> for LobData {
    fn from(b: Bytes) -> Self {
        LobData::Bytes(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lob_locator_new() {
        let locator = LobLocator::new(vec![1, 2, 3, 4], LobKind::Clob, 100, 8132);
        assert_eq!(locator.size, 100);
        assert_eq!(locator.chunk_size, 8132);
        assert!(!locator.is_blob());
        assert!(!locator.is_temp);
        assert!(locator.temporary().is_temp);
    }

    #[test]
    fn test_lob_data_len_counts_characters() {
        let data = LobData::from("héllo");
        assert_eq!(data.len(), 5);
        assert_eq!(data.kind(), LobKind::Clob);
        assert!(LobData::empty(LobKind::Blob).is_empty());
    }

    #[test]
    fn test_split_to_on_char_boundary() {
        let mut data = LobData::from("aébc");
        let head = data.split_to(2);
        assert_eq!(head, LobData::from("aé"));
        assert_eq!(data, LobData::from("bc"));

        let mut data = LobData::from(vec![1u8, 2, 3]);
        let head = data.split_to(5);
        assert_eq!(head, LobData::from(vec![1u8, 2, 3]));
        assert!(data.is_empty());
    }

    #[test]
    fn test_append() {
        let mut data = LobData::from("ab");
        data.append(LobData::from("cd"));
        assert_eq!(data, LobData::from("abcd"));
    }
}
