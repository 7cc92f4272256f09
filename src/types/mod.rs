//! Data model shared by binds, out binds and result rows.

mod column;
pub mod db_type;
mod lob;
mod metadata;
mod row;
mod value;

pub use column::{Column, ColumnInfo};
pub use db_type::DbType;
pub use lob::{LobData, LobKind, LobLocator};
pub use metadata::{ColumnMetadata, CS_FORM_IMPLICIT, CS_FORM_NCHAR};
pub use row::Row;
pub use value::{CursorLocator, DateParts, Value};
