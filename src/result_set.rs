//! Result sets over server cursors.
//!
//! A [`ResultSet`] is `Open` until closed explicitly, consumed to the end as
//! a stream, or invalidated by its connection closing. `Closed` is terminal:
//! metadata access, fetches and a second `close` all fail with
//! [`Error::InvalidResultSet`].
//!
//! Rows are buffered in batches of `fetch_array_size` and decoded as they are
//! handed out, so a conversion error surfaces on the fetch that returns the
//! offending row. Cursor columns decode to [`Value::Cursor`] and are opened
//! with [`ResultSet::open_nested`]; nested result sets are independent of
//! their parent and must be closed separately.

use std::collections::VecDeque;
use std::sync::Arc;

use futures::stream::{self, Stream};
use tracing::{debug, trace, warn};

use crate::cancel::{CancelHandle, Guards};
use crate::config::ConvertConfig;
use crate::convert::{decode, WireValue};
use crate::error::{Error, Result};
use crate::lob::Lob;
use crate::session::Session;
use crate::types::{
    Column, ColumnInfo, ColumnMetadata, CursorLocator, DbType, LobData, LobLocator, Row, Value,
};

/// Server cursor with buffered fetch.
pub struct ResultSet<S: Session> {
    session: Arc<S>,
    state: ResultSetState,
    guards: Guards,
    convert: ConvertConfig,
    /// Rows per fetch round trip.
    fetch_array_size: u32,
    /// `get_row`/`get_rows` were called; stream conversion is refused.
    fetched: bool,
}

enum ResultSetState {
    Open(OpenCursor),
    Closed,
}

struct OpenCursor {
    /// Cursor ID assigned by the server.
    cursor_id: u32,
    column_info: Arc<ColumnInfo>,
    /// Undecoded rows from prefetch or fetch.
    buffer: VecDeque<Vec<WireValue>>,
    /// Whether the server has more rows.
    more_rows: bool,
    /// Total rows fetched so far.
    rows_fetched: u64,
}

impl<S: Session> ResultSet<S> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        session: Arc<S>,
        cursor_id: u32,
        columns: &[ColumnMetadata],
        rows: Vec<Vec<WireValue>>,
        more_rows: bool,
        fetch_array_size: u32,
        convert: ConvertConfig,
        connection: CancelHandle,
    ) -> Result<Self> {
        if cursor_id == 0 {
            return Err(Error::InvalidCursor);
        }
        let column_info = Arc::new(ColumnInfo::from_metadata(columns)?);
        debug!(
            cursor_id,
            columns = column_info.len(),
            prefetched = rows.len(),
            more_rows,
            "opened result set"
        );
        Ok(Self {
            session,
            state: ResultSetState::Open(OpenCursor {
                cursor_id,
                column_info,
                rows_fetched: rows.len() as u64,
                buffer: rows.into(),
                more_rows,
            }),
            guards: Guards::new(connection),
            convert,
            fetch_array_size: fetch_array_size.max(1),
            fetched: false,
        })
    }

    fn cursor(&self) -> Result<&OpenCursor> {
        self.guards.check(Error::InvalidResultSet)?;
        match &self.state {
            ResultSetState::Open(cursor) => Ok(cursor),
            ResultSetState::Closed => Err(Error::InvalidResultSet),
        }
    }

    fn cursor_mut(&mut self) -> Result<&mut OpenCursor> {
        self.guards.check(Error::InvalidResultSet)?;
        match &mut self.state {
            ResultSetState::Open(cursor) => Ok(cursor),
            ResultSetState::Closed => Err(Error::InvalidResultSet),
        }
    }

    /// Column metadata. Stable while the result set is open.
    pub fn meta_data(&self) -> Result<&[Column]> {
        Ok(self.cursor()?.column_info.columns.as_slice())
    }

    /// Column names in select-list order.
    pub fn column_names(&self) -> Result<Vec<&str>> {
        Ok(self.cursor()?.column_info.column_names())
    }

    /// Cursor ID assigned by the server.
    pub fn cursor_id(&self) -> Result<u32> {
        Ok(self.cursor()?.cursor_id)
    }

    /// Rows received from the server so far.
    pub fn row_count(&self) -> u64 {
        match &self.state {
            ResultSetState::Open(cursor) => cursor.rows_fetched,
            ResultSetState::Closed => 0,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, ResultSetState::Closed)
            || self.guards.own.is_cancelled()
            || self.guards.connection.is_cancelled()
    }

    pub fn fetch_array_size(&self) -> u32 {
        self.fetch_array_size
    }

    /// Rows per fetch round trip. Affects round trips only, never results.
    pub fn set_fetch_array_size(&mut self, size: u32) {
        self.fetch_array_size = size.max(1);
    }

    /// Handle that closes this result set from elsewhere. An in-flight fetch
    /// then fails with [`Error::InvalidResultSet`]. Cancelling counts as
    /// closing: every later operation fails, `close` included.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.guards.own.clone()
    }

    /// Fetch one row. `Ok(None)` when no rows remain; the result set stays
    /// open until closed.
    pub async fn get_row(&mut self) -> Result<Option<Row>> {
        self.fetched = true;
        self.next_row().await
    }

    /// Fetch up to `max` rows; 0 fetches every remaining row.
    pub async fn get_rows(&mut self, max: usize) -> Result<Vec<Row>> {
        self.fetched = true;
        let mut rows = Vec::new();
        while max == 0 || rows.len() < max {
            match self.next_row().await? {
                Some(row) => rows.push(row),
                None => break,
            }
        }
        Ok(rows)
    }

    /// Next row. Any failure closes the result set and releases the cursor.
    async fn next_row(&mut self) -> Result<Option<Row>> {
        let row = self.read_row().await;
        if let Err(err) = &row {
            debug!(error = %err, "result set invalidated by fetch error");
            if let Err(close_err) = self.release().await {
                warn!(error = %close_err, "failed to release cursor after fetch error");
            }
        }
        row
    }

    async fn read_row(&mut self) -> Result<Option<Row>> {
        let cursor = self.cursor_mut()?;
        if cursor.buffer.is_empty() && cursor.more_rows {
            self.fetch().await?;
        }
        let cursor = self.cursor_mut()?;
        let Some(wire) = cursor.buffer.pop_front() else {
            return Ok(None);
        };
        let column_info = Arc::clone(&cursor.column_info);
        let values = decode_row(
            &self.session,
            &self.guards,
            Error::InvalidResultSet,
            &column_info,
            wire,
            &self.convert,
        )
        .await?;
        Ok(Some(Row::new(values, column_info)))
    }

    async fn fetch(&mut self) -> Result<()> {
        let cursor_id = self.cursor()?.cursor_id;
        let response = self
            .guards
            .run(
                Error::InvalidResultSet,
                self.session.cursor_fetch(cursor_id, self.fetch_array_size),
            )
            .await?;
        trace!(
            cursor_id,
            rows = response.rows.len(),
            more_rows = response.more_rows,
            "fetched rows"
        );
        let cursor = self.cursor_mut()?;
        cursor.rows_fetched += response.rows.len() as u64;
        cursor.buffer.extend(response.rows);
        cursor.more_rows = response.more_rows;
        Ok(())
    }

    /// Close the cursor. Closing twice is an error.
    pub async fn close(&mut self) -> Result<()> {
        let cursor_id = self.cursor()?.cursor_id;
        self.state = ResultSetState::Closed;
        self.guards.own.cancel();
        debug!(cursor_id, "closing result set");
        self.session.cursor_close(cursor_id).await
    }

    /// Open a nested cursor returned in one of this result set's columns.
    pub fn open_nested(&self, locator: &CursorLocator) -> Result<ResultSet<S>> {
        self.cursor()?;
        ResultSet::new(
            Arc::clone(&self.session),
            locator.cursor_id,
            &locator.columns,
            Vec::new(),
            true,
            self.fetch_array_size,
            self.convert.clone(),
            self.guards.connection.clone(),
        )
    }

    /// Open a LOB returned in one of this result set's columns.
    pub fn open_lob(&self, locator: &LobLocator) -> Result<Lob<S>> {
        self.cursor()?;
        Ok(Lob::new(
            Arc::clone(&self.session),
            locator.clone(),
            self.guards.connection.clone(),
        ))
    }

    /// Convert into a stream of rows.
    ///
    /// Refused once `get_row` or `get_rows` was used. The stream closes the
    /// cursor after the last row, or after the first error, which it yields
    /// once before ending.
    pub fn into_stream(self) -> Result<impl Stream<Item = Result<Row>> + Send> {
        self.cursor()?;
        if self.fetched {
            return Err(Error::CannotConvertToStream);
        }
        Ok(stream::unfold(Some(self), |rs| async move {
            let mut rs = rs?;
            match rs.next_row().await {
                Ok(Some(row)) => Some((Ok(row), Some(rs))),
                Ok(None) => match rs.release().await {
                    Ok(()) => None,
                    Err(err) => Some((Err(err), None)),
                },
                Err(err) => Some((Err(err), None)),
            }
        }))
    }

    /// Move to `Closed` and release the server cursor if it is still held.
    /// A no-op once closed; skips the round trip when the connection is gone.
    async fn release(&mut self) -> Result<()> {
        let state = std::mem::replace(&mut self.state, ResultSetState::Closed);
        self.guards.own.cancel();
        let ResultSetState::Open(cursor) = state else {
            return Ok(());
        };
        if self.guards.connection.is_cancelled() {
            return Ok(());
        }
        debug!(cursor_id = cursor.cursor_id, "releasing result set cursor");
        self.session.cursor_close(cursor.cursor_id).await
    }
}

impl<S: Session> std::fmt::Debug for ResultSet<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("closed", &self.is_closed())
            .field("fetch_array_size", &self.fetch_array_size)
            .field("row_count", &self.row_count())
            .finish()
    }
}

/// Decode one wire row, reading LOB columns fetched as text or bytes.
///
/// `closed` is the error an inline LOB read fails with when the owning
/// handle is closed underneath it.
pub(crate) async fn decode_row<S: Session>(
    session: &Arc<S>,
    guards: &Guards,
    closed: Error,
    column_info: &ColumnInfo,
    wire: Vec<WireValue>,
    config: &ConvertConfig,
) -> Result<Vec<Value>> {
    if wire.len() != column_info.len() {
        return Err(Error::protocol(format!(
            "row has {} values for {} columns",
            wire.len(),
            column_info.len()
        )));
    }
    let mut values = Vec::with_capacity(wire.len());
    for (column, wire) in column_info.columns.iter().zip(wire) {
        let value = decode(column.db_type, wire, config)?;
        let value = match value {
            Value::Lob(locator) if fetch_lob_inline(column.db_type, config) => {
                read_lob(session, guards, closed.clone(), &locator).await?
            }
            other => other,
        };
        values.push(value);
    }
    Ok(values)
}

fn fetch_lob_inline(db_type: DbType, config: &ConvertConfig) -> bool {
    match db_type {
        DbType::Clob | DbType::Nclob => config.as_string(db_type),
        DbType::Blob => config.as_buffer(db_type),
        _ => false,
    }
}

/// Read a whole LOB as a plain value. Empty content reads as NULL.
pub(crate) async fn read_lob<S: Session>(
    session: &Arc<S>,
    guards: &Guards,
    closed: Error,
    locator: &LobLocator,
) -> Result<Value> {
    let amount = u64::from(locator.chunk_size.max(1));
    let mut data = LobData::empty(locator.kind);
    let mut offset = 1;
    loop {
        let piece = guards
            .run(closed.clone(), session.lob_read(locator, offset, amount))
            .await?;
        if piece.is_empty() {
            break;
        }
        offset += piece.len();
        data.append(piece);
    }
    if locator.is_temp {
        session.lob_close(locator).await?;
    }
    Ok(match data {
        LobData::Text(s) if s.is_empty() => Value::Null,
        LobData::Text(s) => Value::String(s),
        LobData::Bytes(b) if b.is_empty() => Value::Null,
        LobData::Bytes(b) => Value::Bytes(b.to_vec()),
    })
}
