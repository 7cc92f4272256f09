//! In-memory session used by the integration tests.
//!
//! Execute responses come from a handler closure. LOBs and cursors live in
//! maps keyed by locator and cursor ID. LOB writes stay pending until
//! committed, as on the server.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use oracle_thin_bind::convert::{encode_i64, encode_oracle_number};
use oracle_thin_bind::{
    scan, ColumnMetadata, CursorLocator, Error, ExecuteManyRequest, ExecuteManyResponse,
    ExecuteRequest, ExecuteResponse, FetchResponse, LobData, LobKind, LobLocator, PrepareInfo, Result, Session,
    WireValue,
};

pub const CHUNK_SIZE: u32 = 8;

type Handler = Arc<dyn Fn(&MockSession, &ExecuteRequest) -> Result<ExecuteResponse> + Send + Sync>;
type BatchHandler =
    Arc<dyn Fn(&MockSession, &ExecuteManyRequest) -> Result<ExecuteManyResponse> + Send + Sync>;

struct MockLob {
    kind: LobKind,
    committed: LobData,
    pending: Option<LobData>,
    closed: bool,
}

struct MockCursor {
    rows: VecDeque<Vec<WireValue>>,
    closed: bool,
}

#[derive(Default)]
struct MockState {
    lobs: HashMap<Bytes, MockLob>,
    cursors: HashMap<u32, MockCursor>,
    next_id: u32,
    last_cursor: u32,
    executed: Vec<ExecuteRequest>,
    batches: Vec<ExecuteManyRequest>,
    fetch_calls: usize,
    lob_writes: usize,
    lob_reads: usize,
    reads_before_failure: Option<usize>,
    writes_before_failure: Option<usize>,
}

#[derive(Default)]
pub struct MockSession {
    state: Mutex<MockState>,
    handler: Option<Handler>,
    batch_handler: Option<BatchHandler>,
    prepare: Option<PrepareInfo>,
    execute_delay: Option<Duration>,
    io_delay: Option<Duration>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_execute<F>(mut self, handler: F) -> Self
    where
        F: Fn(&MockSession, &ExecuteRequest) -> Result<ExecuteResponse> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn on_execute_many<F>(mut self, handler: F) -> Self
    where
        F: Fn(&MockSession, &ExecuteManyRequest) -> Result<ExecuteManyResponse>
            + Send
            + Sync
            + 'static,
    {
        self.batch_handler = Some(Arc::new(handler));
        self
    }

    pub fn with_prepare_info(mut self, info: PrepareInfo) -> Self {
        self.prepare = Some(info);
        self
    }

    pub fn with_execute_delay(mut self, delay: Duration) -> Self {
        self.execute_delay = Some(delay);
        self
    }

    /// Delay applied to LOB reads and cursor fetches.
    pub fn with_io_delay(mut self, delay: Duration) -> Self {
        self.io_delay = Some(delay);
        self
    }

    /// Fail every LOB read after `reads` successful ones.
    pub fn fail_reads_after(self, reads: usize) -> Self {
        self.state.lock().unwrap().reads_before_failure = Some(reads);
        self
    }

    /// Fail every LOB write after `writes` successful ones.
    pub fn fail_writes_after(self, writes: usize) -> Self {
        self.state.lock().unwrap().writes_before_failure = Some(writes);
        self
    }

    fn next_id(&self) -> u32 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        state.next_id + 100
    }

    /// Register a committed LOB.
    pub fn add_lob(&self, content: impl Into<LobData>) -> LobLocator {
        self.add_lob_chunked(content, CHUNK_SIZE)
    }

    /// Register a committed LOB with its own chunk size.
    pub fn add_lob_chunked(&self, content: impl Into<LobData>, chunk_size: u32) -> LobLocator {
        let content = content.into();
        let kind = content.kind();
        let id = self.next_id();
        let locator = LobLocator::new(id.to_be_bytes().to_vec(), kind, content.len(), chunk_size);
        self.state.lock().unwrap().lobs.insert(
            locator.locator.clone(),
            MockLob {
                kind,
                committed: content,
                pending: None,
                closed: false,
            },
        );
        locator
    }

    /// Register an open cursor.
    pub fn add_cursor(&self, columns: Vec<ColumnMetadata>, rows: Vec<Vec<WireValue>>) -> CursorLocator {
        let id = self.next_id();
        let mut state = self.state.lock().unwrap();
        state.last_cursor = id;
        state.cursors.insert(
            id,
            MockCursor {
                rows: rows.into(),
                closed: false,
            },
        );
        CursorLocator::new(id, columns)
    }

    /// Query response with `prefetch` rows inline and the rest on a cursor.
    pub fn query_response(
        &self,
        columns: Vec<ColumnMetadata>,
        rows: Vec<Vec<WireValue>>,
        prefetch: usize,
    ) -> ExecuteResponse {
        let mut rows: VecDeque<_> = rows.into();
        let inline: Vec<_> = rows.drain(..prefetch.min(rows.len())).collect();
        let more_rows = !rows.is_empty();
        let cursor = self.add_cursor(columns.clone(), rows.into());
        ExecuteResponse {
            columns: Some(columns),
            rows: inline,
            cursor_id: cursor.cursor_id,
            more_rows,
            ..Default::default()
        }
    }

    pub fn lob_content(&self, locator: &LobLocator) -> Option<LobData> {
        let state = self.state.lock().unwrap();
        state.lobs.get(&locator.locator).map(|lob| lob.committed.clone())
    }

    pub fn is_lob_closed(&self, locator: &LobLocator) -> bool {
        let state = self.state.lock().unwrap();
        state.lobs.get(&locator.locator).is_some_and(|lob| lob.closed)
    }

    pub fn temp_lobs(&self) -> usize {
        self.state.lock().unwrap().lobs.len()
    }

    pub fn open_lobs(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.lobs.values().filter(|lob| !lob.closed).count()
    }

    pub fn is_cursor_closed(&self, cursor_id: u32) -> bool {
        let state = self.state.lock().unwrap();
        state.cursors.get(&cursor_id).is_some_and(|c| c.closed)
    }

    pub fn executed(&self) -> Vec<ExecuteRequest> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn batches(&self) -> Vec<ExecuteManyRequest> {
        self.state.lock().unwrap().batches.clone()
    }

    /// ID of the most recently registered cursor.
    pub fn last_cursor(&self) -> u32 {
        self.state.lock().unwrap().last_cursor
    }

    pub fn fetch_calls(&self) -> usize {
        self.state.lock().unwrap().fetch_calls
    }

    pub fn lob_writes(&self) -> usize {
        self.state.lock().unwrap().lob_writes
    }

    fn with_lob<T>(&self, locator: &LobLocator, f: impl FnOnce(&mut MockLob) -> Result<T>) -> Result<T> {
        let mut state = self.state.lock().unwrap();
        match state.lobs.get_mut(&locator.locator) {
            Some(lob) if !lob.closed => f(lob),
            _ => Err(Error::oracle(22922, "nonexistent LOB value")),
        }
    }

    async fn io_pause(&self) {
        if let Some(delay) = self.io_delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl Session for MockSession {
    async fn execute(&self, request: ExecuteRequest) -> Result<ExecuteResponse> {
        if let Some(delay) = self.execute_delay {
            tokio::time::sleep(delay).await;
        }
        self.state.lock().unwrap().executed.push(request.clone());
        match &self.handler {
            Some(handler) => handler(self, &request),
            None => Ok(ExecuteResponse::default()),
        }
    }

    async fn execute_many(&self, request: ExecuteManyRequest) -> Result<ExecuteManyResponse> {
        let response = match &self.batch_handler {
            Some(handler) => handler(self, &request),
            None => Ok(ExecuteManyResponse {
                rows_affected: vec![1; request.rows.len()],
                out_binds: Vec::new(),
            }),
        };
        self.state.lock().unwrap().batches.push(request);
        response
    }

    async fn prepare_info(&self, sql: &str) -> Result<PrepareInfo> {
        if let Some(info) = &self.prepare {
            return Ok(info.clone());
        }
        let info = scan(sql);
        Ok(PrepareInfo {
            statement_type: Some(info.statement_type),
            bind_names: info.bind_names,
        })
    }

    async fn lob_create_temp(&self, kind: LobKind) -> Result<LobLocator> {
        let locator = self.add_lob(LobData::empty(kind));
        Ok(locator.temporary())
    }

    async fn lob_read(&self, locator: &LobLocator, offset: u64, amount: u64) -> Result<LobData> {
        self.io_pause().await;
        {
            let mut state = self.state.lock().unwrap();
            if let Some(limit) = state.reads_before_failure {
                if state.lob_reads >= limit {
                    return Err(Error::stream("connection reset while reading LOB"));
                }
            }
            state.lob_reads += 1;
        }
        self.with_lob(locator, |lob| Ok(slice(&lob.committed, offset, amount)))
    }

    async fn lob_write(&self, locator: &LobLocator, offset: u64, data: LobData) -> Result<()> {
        self.io_pause().await;
        {
            let mut state = self.state.lock().unwrap();
            if let Some(limit) = state.writes_before_failure {
                if state.lob_writes >= limit {
                    return Err(Error::stream("connection reset while writing LOB"));
                }
            }
            state.lob_writes += 1;
        }
        self.with_lob(locator, |lob| {
            if data.kind() != lob.kind {
                return Err(Error::oracle(22275, "invalid LOB locator specified"));
            }
            let base = lob.pending.take().unwrap_or_else(|| lob.committed.clone());
            lob.pending = Some(overwrite(base, offset, data));
            Ok(())
        })
    }

    async fn lob_trim(&self, locator: &LobLocator, new_size: u64) -> Result<()> {
        self.with_lob(locator, |lob| {
            lob.committed = slice(&lob.committed, 1, new_size);
            lob.pending = None;
            Ok(())
        })
    }

    async fn lob_length(&self, locator: &LobLocator) -> Result<u64> {
        self.with_lob(locator, |lob| Ok(lob.committed.len()))
    }

    async fn lob_commit(&self, locator: &LobLocator) -> Result<()> {
        self.with_lob(locator, |lob| {
            if let Some(pending) = lob.pending.take() {
                lob.committed = pending;
            }
            Ok(())
        })
    }

    async fn lob_close(&self, locator: &LobLocator) -> Result<()> {
        self.with_lob(locator, |lob| {
            lob.pending = None;
            lob.closed = true;
            Ok(())
        })
    }

    async fn cursor_fetch(&self, cursor_id: u32, rows: u32) -> Result<FetchResponse> {
        self.io_pause().await;
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        match state.cursors.get_mut(&cursor_id) {
            Some(cursor) if !cursor.closed => {
                let n = (rows as usize).min(cursor.rows.len());
                let batch: Vec<_> = cursor.rows.drain(..n).collect();
                Ok(FetchResponse {
                    rows: batch,
                    more_rows: !cursor.rows.is_empty(),
                })
            }
            _ => Err(Error::oracle(1001, "invalid cursor")),
        }
    }

    async fn cursor_close(&self, cursor_id: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.cursors.get_mut(&cursor_id) {
            Some(cursor) if !cursor.closed => {
                cursor.closed = true;
                Ok(())
            }
            _ => Err(Error::oracle(1001, "invalid cursor")),
        }
    }
}

/// Units `[offset, offset + amount)` of `data`, 1-based.
fn slice(data: &LobData, offset: u64, amount: u64) -> LobData {
    let start = offset.saturating_sub(1) as usize;
    let amount = amount as usize;
    match data {
        LobData::Text(s) => LobData::Text(s.chars().skip(start).take(amount).collect()),
        LobData::Bytes(b) => {
            let start = start.min(b.len());
            let end = start.saturating_add(amount).min(b.len());
            LobData::Bytes(b.slice(start..end))
        }
    }
}

/// Write `data` over `base` at a 1-based offset, padding any gap.
fn overwrite(base: LobData, offset: u64, data: LobData) -> LobData {
    let start = offset.saturating_sub(1) as usize;
    match (base, data) {
        (LobData::Text(base), LobData::Text(data)) => {
            let mut chars: Vec<char> = base.chars().collect();
            if chars.len() < start {
                chars.resize(start, ' ');
            }
            for (i, c) in data.chars().enumerate() {
                match chars.get_mut(start + i) {
                    Some(slot) => *slot = c,
                    None => chars.push(c),
                }
            }
            LobData::Text(chars.into_iter().collect())
        }
        (LobData::Bytes(base), LobData::Bytes(data)) => {
            let mut bytes = base.to_vec();
            if bytes.len() < start {
                bytes.resize(start, 0);
            }
            for (i, b) in data.iter().enumerate() {
                match bytes.get_mut(start + i) {
                    Some(slot) => *slot = *b,
                    None => bytes.push(*b),
                }
            }
            LobData::Bytes(Bytes::from(bytes))
        }
        (base, _) => base,
    }
}

pub fn num(n: i64) -> WireValue {
    WireValue::Number(Bytes::from(encode_i64(n).unwrap()))
}

pub fn decimal(text: &str) -> WireValue {
    WireValue::Number(Bytes::from(encode_oracle_number(text).unwrap()))
}

pub fn text(s: &str) -> WireValue {
    WireValue::Text(s.to_string())
}

/// Metadata for a NUMBER column.
pub fn number_column(name: &str) -> ColumnMetadata {
    ColumnMetadata::new(name, oracle_thin_bind::types::db_type::ORA_TYPE_NUM_NUMBER)
}

/// Metadata for a VARCHAR2 column.
pub fn varchar_column(name: &str) -> ColumnMetadata {
    ColumnMetadata::new(name, oracle_thin_bind::types::db_type::ORA_TYPE_NUM_VARCHAR).with_max_size(100)
}

/// Metadata for a column of any type number.
pub fn column(name: &str, type_num: u8) -> ColumnMetadata {
    ColumnMetadata::new(name, type_num)
}
