//! Query column descriptions shared by every row of a result set.

use crate::error::Result;

use super::db_type::DbType;
use super::metadata::ColumnMetadata;

/// A described select-list item with its type resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub db_type: DbType,
    pub nullable: bool,
    /// NUMBER precision; 0 when the server left it unconstrained.
    pub precision: i8,
    /// NUMBER scale; -127 marks a FLOAT column.
    pub scale: i8,
    /// Byte limit for character and raw columns, 0 otherwise.
    pub max_size: u32,
}

impl Column {
    /// Resolves the raw type number and character set form of `meta`.
    pub fn from_metadata(meta: &ColumnMetadata) -> Result<Self> {
        let db_type = DbType::from_raw(meta.oracle_type, meta.csfrm)?;
        Ok(Self {
            name: meta.name.clone(),
            db_type,
            nullable: meta.nullable,
            precision: meta.precision,
            scale: meta.scale,
            max_size: if db_type.is_variable_length() {
                meta.max_size
            } else {
                0
            },
        })
    }
}

/// The ordered select list of one statement execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub columns: Vec<Column>,
}

impl ColumnInfo {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Fails on the first column whose type this crate cannot fetch.
    pub fn from_metadata(metadata: &[ColumnMetadata]) -> Result<Self> {
        metadata
            .iter()
            .map(Column::from_metadata)
            .collect::<Result<Vec<_>>>()
            .map(Self::new)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    /// Position of the column called `name`.
    ///
    /// An exact match wins, so quoted mixed-case aliases stay reachable when
    /// another column differs only by case. Otherwise the lookup ignores ASCII
    /// case, the way unquoted identifiers behave in SQL.
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(name))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::db_type::{ORA_TYPE_NUM_CLOB, ORA_TYPE_NUM_NUMBER, ORA_TYPE_NUM_VARCHAR};

    fn described() -> Vec<ColumnMetadata> {
        vec![
            ColumnMetadata::new("ID", ORA_TYPE_NUM_NUMBER)
                .with_precision(10, 0)
                .with_max_size(22),
            ColumnMetadata::new("NAME", ORA_TYPE_NUM_VARCHAR).with_max_size(100),
        ]
    }

    #[test]
    fn test_resolves_type_and_drops_fixed_size() {
        let info = ColumnInfo::from_metadata(&described()).unwrap();
        let id = info.get(0).unwrap();
        assert_eq!(id.db_type, DbType::Number);
        assert_eq!(id.precision, 10);
        assert_eq!(id.max_size, 0);
        assert_eq!(info.get(1).unwrap().max_size, 100);
        assert_eq!(info.column_names(), vec!["ID", "NAME"]);
    }

    #[test]
    fn test_find_by_name_prefers_exact_match() {
        let info = ColumnInfo::from_metadata(&[
            ColumnMetadata::new("VAL", ORA_TYPE_NUM_NUMBER),
            ColumnMetadata::new("Val", ORA_TYPE_NUM_VARCHAR),
        ])
        .unwrap();
        assert_eq!(info.find_by_name("Val"), Some(1));
        assert_eq!(info.find_by_name("val"), Some(0));
        assert_eq!(info.find_by_name("other"), None);
    }

    #[test]
    fn test_national_clob_and_nullability() {
        let meta = ColumnMetadata::new("DOC", ORA_TYPE_NUM_CLOB)
            .national()
            .not_null();
        let column = Column::from_metadata(&meta).unwrap();
        assert_eq!(column.db_type, DbType::Nclob);
        assert!(!column.nullable);
    }

    #[test]
    fn test_unknown_type_number_rejected() {
        let meta = [ColumnMetadata::new("X", 250)];
        assert!(ColumnInfo::from_metadata(&meta).is_err());
    }
}
