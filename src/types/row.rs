//! Fetched rows.

use std::sync::Arc;

use crate::error::{Error, Result};

use super::column::{Column, ColumnInfo};
use super::value::Value;

/// One fetched row. The select list is shared with every other row of the
/// same execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
    column_info: Arc<ColumnInfo>,
}

impl Row {
    pub fn new(values: Vec<Value>, column_info: Arc<ColumnInfo>) -> Self {
        Self {
            values,
            column_info,
        }
    }

    /// Value at the zero-based select-list position.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Value of the named column, resolved by [`ColumnInfo::find_by_name`].
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        let index = self.column_info.find_by_name(name)?;
        self.values.get(index)
    }

    /// Like [`get_by_name`](Self::get_by_name), but a missing column is an error.
    pub fn try_get_by_name(&self, name: &str) -> Result<&Value> {
        self.get_by_name(name).ok_or_else(|| Error::ColumnNotFound {
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }

    pub fn columns(&self) -> &[Column] {
        &self.column_info.columns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.values.iter()
    }
}

impl IntoIterator for Row {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::types::DbType;

    fn select_list() -> Arc<ColumnInfo> {
        let column = |name: &str, db_type| Column {
            name: name.to_string(),
            db_type,
            nullable: true,
            precision: 0,
            scale: 0,
            max_size: 0,
        };
        Arc::new(ColumnInfo::new(vec![
            column("NAME", DbType::Varchar),
            column("TOTAL", DbType::Number),
        ]))
    }

    #[test]
    fn test_lookup_by_position_and_name() {
        let row = Row::new(vec![Value::from("widget"), Value::Integer(42)], select_list());

        assert_eq!(row.len(), 2);
        assert_eq!(row.get(0), Some(&Value::from("widget")));
        assert_eq!(row.get(2), None);
        assert_eq!(row.get_by_name("total"), Some(&Value::Integer(42)));
        assert_eq!(row.columns()[1].db_type, DbType::Number);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let row = Row::new(vec![Value::Null, Value::Null], select_list());
        let err = row.try_get_by_name("missing").unwrap_err();
        assert_eq!(
            err,
            Error::ColumnNotFound {
                name: "missing".into()
            }
        );
        assert_eq!(err.kind(), ErrorKind::Protocol);
        assert_eq!(row.into_values().iter().filter(|v| v.is_null()).count(), 2);
    }
}
