//! Oracle bind and marshal engine
//!
//! The client-side layer of an Oracle driver that turns SQL text plus
//! caller-supplied binds into an encoded execute request, and turns the
//! response (rows, out binds, LOBs, cursors) back into caller values. The
//! transport is an external [`Session`].
//!
//! # Example
//!
//! ```
//! use oracle_thin_bind::{resolve, scan, BindConfig, BindSpec, Binds, DbType};
//!
//! let info = scan("begin :total := add_one(:n); end;");
//! assert_eq!(info.bind_names, vec!["TOTAL", "N"]);
//!
//! let binds = Binds::named([
//!     ("total", BindSpec::output(DbType::Number)),
//!     ("n", BindSpec::input(41)),
//! ]);
//! let resolved = resolve(&info, &binds, &BindConfig::default()).unwrap();
//! assert!(resolved[0].dir.is_output());
//! assert_eq!(resolved[1].db_type, DbType::Number);
//! ```

pub mod bind;
pub mod cancel;
pub mod config;
pub mod connection;
pub mod convert;
pub mod error;
pub mod lob;
pub mod result_set;
pub mod scanner;
pub mod session;
pub mod statement_cache;
pub mod types;

// Re-export main types
pub use bind::{normalize_bind_name, resolve, BindDescriptor, BindDirection, BindParam, BindSpec, Binds};
pub use cancel::CancelHandle;
pub use config::{BindConfig, ConnectionConfig, ConvertConfig, ExecuteOptions};
pub use connection::{Connection, ExecuteManyResult, ExecuteResult, OutBind, OutValue};
pub use convert::WireValue;
pub use error::{BindSlot, Error, ErrorKind, Result};
pub use lob::{Lob, LobWriter};
pub use result_set::ResultSet;
pub use scanner::{scan, StatementCategory, StatementInfo, StatementType};
pub use session::{
    BoundValue, ExecuteManyRequest, ExecuteManyResponse, ExecuteRequest, ExecuteResponse,
    FetchResponse, PrepareInfo, Session,
};
pub use statement_cache::StatementCache;
pub use types::{
    Column, ColumnInfo, ColumnMetadata, CursorLocator, DateParts, DbType, LobData, LobKind,
    LobLocator, Row, Value,
};
