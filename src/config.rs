//! Configuration threaded explicitly into resolve, execute and decode calls.
//!
//! There is no process-wide state: every setting lives in one of these
//! structs, passed by reference to the operation that needs it.

use std::time::Duration;

use crate::types::DbType;

/// Default buffer size for OUT binds that do not declare `max_size`.
pub const DEFAULT_MAX_SIZE_FOR_OUT_BINDS: u32 = 200;

/// Largest string or raw value PL/SQL accepts without a LOB.
pub const PLSQL_MAX_STRING_SIZE: u32 = 32767;

/// Default number of rows per fetch round trip.
pub const DEFAULT_FETCH_ARRAY_SIZE: u32 = 100;

/// Default number of statement scans kept in the cache.
pub const DEFAULT_STATEMENT_CACHE_SIZE: usize = 30;

/// Conversion policy used when decoding column and out-bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertConfig {
    /// Types fetched as text instead of their native representation.
    pub fetch_as_string: Vec<DbType>,
    /// Types fetched as bytes instead of a LOB handle.
    pub fetch_as_buffer: Vec<DbType>,
    /// Fractional-second digits kept when encoding TIMESTAMP values (0..=9).
    pub timestamp_scale: u8,
    /// `strftime` format used for temporals fetched as text.
    pub date_format: String,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            fetch_as_string: Vec::new(),
            fetch_as_buffer: Vec::new(),
            timestamp_scale: 6,
            date_format: "%Y-%m-%d %H:%M:%S".to_string(),
        }
    }
}

impl ConvertConfig {
    /// Fetch the given types as text.
    pub fn with_fetch_as_string(mut self, types: impl IntoIterator<Item = DbType>) -> Self {
        self.fetch_as_string.extend(types);
        self
    }

    /// Fetch the given types as bytes.
    pub fn with_fetch_as_buffer(mut self, types: impl IntoIterator<Item = DbType>) -> Self {
        self.fetch_as_buffer.extend(types);
        self
    }

    /// Set fractional-second digits kept on TIMESTAMP encode (clamped to 9).
    pub fn with_timestamp_scale(mut self, scale: u8) -> Self {
        self.timestamp_scale = scale.min(9);
        self
    }

    pub fn as_string(&self, db_type: DbType) -> bool {
        self.fetch_as_string.contains(&db_type)
    }

    pub fn as_buffer(&self, db_type: DbType) -> bool {
        self.fetch_as_buffer.contains(&db_type)
    }
}

/// Bind resolution policy.
#[derive(Debug, Clone, PartialEq)]
pub struct BindConfig {
    /// Buffer size for variable-length OUT binds without `max_size`.
    pub default_out_max_size: u32,
    /// Type assumed for OUT binds that declare none.
    pub default_out_type: DbType,
    /// Reject OUT and IN OUT binds that declare no type instead of defaulting.
    pub require_out_type: bool,
    /// Strings and raws above this size are sent to PL/SQL as LOBs.
    pub plsql_max_string_size: u32,
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            default_out_max_size: DEFAULT_MAX_SIZE_FOR_OUT_BINDS,
            default_out_type: DbType::Varchar,
            require_out_type: false,
            plsql_max_string_size: PLSQL_MAX_STRING_SIZE,
        }
    }
}

impl BindConfig {
    /// Set the default OUT buffer size.
    pub fn with_default_out_max_size(mut self, size: u32) -> Self {
        self.default_out_max_size = size;
        self
    }

    /// Require an explicit type on OUT and IN OUT binds.
    pub fn with_require_out_type(mut self, require: bool) -> Self {
        self.require_out_type = require;
        self
    }
}

/// Options for a single execute call.
///
/// # Example
///
/// ```
/// use oracle_thin_bind::{DbType, ExecuteOptions};
/// use std::time::Duration;
///
/// let options = ExecuteOptions::new()
///     .with_result_set(true)
///     .with_fetch_array_size(500)
///     .with_call_timeout(Duration::from_secs(5))
///     .with_fetch_as_string([DbType::Number]);
/// assert!(options.result_set);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExecuteOptions {
    /// Rows per fetch round trip. Affects round trips only, never results.
    pub fetch_array_size: u32,
    /// Rows returned with the execute response itself.
    pub prefetch_rows: u32,
    /// Return a [`crate::ResultSet`] instead of materialized rows.
    pub result_set: bool,
    /// Cap on materialized rows (0 = unlimited). Ignored for result sets.
    pub max_rows: u32,
    /// Forwarded to the session.
    pub auto_commit: bool,
    /// Upper bound on each session round trip.
    pub call_timeout: Option<Duration>,
    /// Decode policy.
    pub convert: ConvertConfig,
    /// Bind policy.
    pub bind: BindConfig,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            fetch_array_size: DEFAULT_FETCH_ARRAY_SIZE,
            prefetch_rows: 2,
            result_set: false,
            max_rows: 0,
            auto_commit: false,
            call_timeout: None,
            convert: ConvertConfig::default(),
            bind: BindConfig::default(),
        }
    }
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set rows per fetch round trip (0 is treated as 1).
    pub fn with_fetch_array_size(mut self, size: u32) -> Self {
        self.fetch_array_size = size.max(1);
        self
    }

    pub fn with_prefetch_rows(mut self, rows: u32) -> Self {
        self.prefetch_rows = rows;
        self
    }

    /// Return a result set instead of materialized rows.
    pub fn with_result_set(mut self, result_set: bool) -> Self {
        self.result_set = result_set;
        self
    }

    pub fn with_max_rows(mut self, max_rows: u32) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn with_auto_commit(mut self, auto_commit: bool) -> Self {
        self.auto_commit = auto_commit;
        self
    }

    /// Bound each session round trip.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn with_fetch_as_string(mut self, types: impl IntoIterator<Item = DbType>) -> Self {
        self.convert = self.convert.with_fetch_as_string(types);
        self
    }

    pub fn with_fetch_as_buffer(mut self, types: impl IntoIterator<Item = DbType>) -> Self {
        self.convert = self.convert.with_fetch_as_buffer(types);
        self
    }

    pub fn with_convert(mut self, convert: ConvertConfig) -> Self {
        self.convert = convert;
        self
    }

    pub fn with_bind_config(mut self, bind: BindConfig) -> Self {
        self.bind = bind;
        self
    }
}

/// Connection-wide settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionConfig {
    /// Number of statement scans cached by SQL text (0 disables the cache).
    pub statement_cache_size: usize,
    /// Options used by [`crate::Connection::execute`].
    pub default_options: ExecuteOptions,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            statement_cache_size: DEFAULT_STATEMENT_CACHE_SIZE,
            default_options: ExecuteOptions::default(),
        }
    }
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statement_cache_size(mut self, size: usize) -> Self {
        self.statement_cache_size = size;
        self
    }

    pub fn with_default_options(mut self, options: ExecuteOptions) -> Self {
        self.default_options = options;
        self
    }
}
