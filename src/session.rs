//! The session collaborator.
//!
//! A [`Session`] owns the transport, the physical wire protocol and the
//! server-side handles. This crate hands it fully resolved and encoded binds
//! and receives wire values back; it never sees packets.
//!
//! Methods take `&self`: a session is shared by the connection and every LOB
//! and result set it produced, and serializes round trips internally.

use std::future::Future;
use std::sync::Arc;

use crate::bind::BindDescriptor;
use crate::convert::WireValue;
use crate::error::Result;
use crate::scanner::{StatementInfo, StatementType};
use crate::types::{ColumnMetadata, LobData, LobKind, LobLocator};

/// One bind as sent to the session.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundValue {
    pub descriptor: BindDescriptor,
    /// Encoded value. `WireValue::Null` for OUT binds.
    pub wire: WireValue,
}

/// Statement execution request.
#[derive(Debug, Clone)]
pub struct ExecuteRequest {
    pub sql: String,
    /// Scanner output for `sql`.
    pub statement: Arc<StatementInfo>,
    /// Binds in placeholder order.
    pub binds: Vec<BoundValue>,
    /// Rows per fetch round trip.
    pub fetch_array_size: u32,
    /// Rows returned with the execute response.
    pub prefetch_rows: u32,
    pub auto_commit: bool,
}

/// Batch execution request: one bind row per execution.
#[derive(Debug, Clone)]
pub struct ExecuteManyRequest {
    pub sql: String,
    pub statement: Arc<StatementInfo>,
    pub rows: Vec<Vec<BoundValue>>,
    pub auto_commit: bool,
}

/// Response to [`Session::execute`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteResponse {
    pub rows_affected: u64,
    /// One value per OUT or IN OUT bind, in bind order. Return binds of DML
    /// come back as `WireValue::Array` with one element per affected row.
    pub out_binds: Vec<WireValue>,
    /// Describe information when the statement is a query.
    pub columns: Option<Vec<ColumnMetadata>>,
    /// Rows fetched with the execute (prefetch).
    pub rows: Vec<Vec<WireValue>>,
    /// Open cursor for a query, 0 otherwise.
    pub cursor_id: u32,
    /// Whether the cursor has rows beyond `rows`.
    pub more_rows: bool,
}

/// Response to [`Session::execute_many`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteManyResponse {
    /// Rows affected, one count per bind row.
    pub rows_affected: Vec<u64>,
    /// OUT and IN OUT values per bind row, in bind order. Empty when the
    /// statement has no output binds.
    pub out_binds: Vec<Vec<WireValue>>,
}

/// Response to [`Session::cursor_fetch`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResponse {
    pub rows: Vec<Vec<WireValue>>,
    pub more_rows: bool,
}

/// The server's own view of a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrepareInfo {
    /// Statement type, when the server reports one.
    pub statement_type: Option<StatementType>,
    /// Distinct bind names in first-occurrence order.
    pub bind_names: Vec<String>,
}

/// Transport and server-side handle primitives.
///
/// LOB offsets are 1-based and counted in characters for CLOBs and bytes for
/// BLOBs, as on the server.
pub trait Session: Send + Sync + 'static {
    /// Execute a statement with encoded binds.
    fn execute(&self, request: ExecuteRequest) -> impl Future<Output = Result<ExecuteResponse>> + Send;

    /// Execute a statement once per bind row.
    fn execute_many(
        &self,
        request: ExecuteManyRequest,
    ) -> impl Future<Output = Result<ExecuteManyResponse>> + Send;

    /// Ask the server for statement type and bind names.
    fn prepare_info(&self, sql: &str) -> impl Future<Output = Result<PrepareInfo>> + Send;

    /// Allocate an empty temporary LOB.
    fn lob_create_temp(&self, kind: LobKind) -> impl Future<Output = Result<LobLocator>> + Send;

    /// Read up to `amount` units starting at `offset`. Returns empty data at end.
    fn lob_read(
        &self,
        locator: &LobLocator,
        offset: u64,
        amount: u64,
    ) -> impl Future<Output = Result<LobData>> + Send;

    /// Write `data` at `offset`. Writes stay pending until [`lob_commit`](Self::lob_commit).
    fn lob_write(
        &self,
        locator: &LobLocator,
        offset: u64,
        data: LobData,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Truncate to `new_size` units.
    fn lob_trim(&self, locator: &LobLocator, new_size: u64) -> impl Future<Output = Result<()>> + Send;

    /// Current length in units.
    fn lob_length(&self, locator: &LobLocator) -> impl Future<Output = Result<u64>> + Send;

    /// Make pending writes visible.
    fn lob_commit(&self, locator: &LobLocator) -> impl Future<Output = Result<()>> + Send;

    /// Release the locator. Uncommitted writes are discarded.
    fn lob_close(&self, locator: &LobLocator) -> impl Future<Output = Result<()>> + Send;

    /// Fetch up to `rows` rows from an open cursor.
    fn cursor_fetch(&self, cursor_id: u32, rows: u32) -> impl Future<Output = Result<FetchResponse>> + Send;

    /// Release a server cursor.
    fn cursor_close(&self, cursor_id: u32) -> impl Future<Output = Result<()>> + Send;
}
