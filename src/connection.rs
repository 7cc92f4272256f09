//! High-level connection API.
//!
//! A [`Connection`] drives one statement execution end to end: scan the text
//! (memoized), resolve binds, encode them, hand them to the [`Session`] and
//! decode what comes back. Every validation and conversion error is raised
//! before the first round trip.
//!
//! LOBs and result sets produced by a connection stay usable after the call
//! that produced them, until they are closed or the connection is.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::bind::{normalize_bind_name, resolve, BindDescriptor, Binds};
use crate::cancel::{CancelHandle, Guards};
use crate::config::{ConnectionConfig, ExecuteOptions};
use crate::convert::{decode, encode, is_nullish, WireValue};
use crate::error::{BindSlot, Error, Result};
use crate::lob::Lob;
use crate::result_set::{decode_row, read_lob, ResultSet};
use crate::scanner::StatementInfo;
use crate::session::{BoundValue, ExecuteManyRequest, ExecuteRequest, Session};
use crate::statement_cache::StatementCache;
use crate::types::{ColumnInfo, CursorLocator, LobData, LobKind, LobLocator, Row, Value};

/// Decoded OUT or IN OUT bind.
pub enum OutValue<S: Session> {
    /// Plain value.
    Value(Value),
    /// LOB handle, owned by the caller.
    Lob(Lob<S>),
    /// REF CURSOR, owned by the caller.
    ResultSet(ResultSet<S>),
}

impl<S: Session> OutValue<S> {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            OutValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_lob(self) -> Option<Lob<S>> {
        match self {
            OutValue::Lob(lob) => Some(lob),
            _ => None,
        }
    }

    pub fn into_result_set(self) -> Option<ResultSet<S>> {
        match self {
            OutValue::ResultSet(rs) => Some(rs),
            _ => None,
        }
    }
}

impl<S: Session> fmt::Debug for OutValue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            OutValue::Lob(lob) => f.debug_tuple("Lob").field(lob).finish(),
            OutValue::ResultSet(rs) => f.debug_tuple("ResultSet").field(rs).finish(),
        }
    }
}

/// One OUT or IN OUT bind of an [`ExecuteResult`].
pub struct OutBind<S: Session> {
    pub slot: BindSlot,
    /// Placeholder name as scanned.
    pub placeholder: String,
    pub value: OutValue<S>,
}

impl<S: Session> fmt::Debug for OutBind<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutBind")
            .field("slot", &self.slot)
            .field("placeholder", &self.placeholder)
            .field("value", &self.value)
            .finish()
    }
}

/// Result of [`Connection::execute`].
pub struct ExecuteResult<S: Session> {
    pub rows_affected: u64,
    /// OUT and IN OUT binds in placeholder order.
    pub out_binds: Vec<OutBind<S>>,
    /// Query columns.
    pub columns: Option<Arc<ColumnInfo>>,
    /// Query rows, unless a result set was requested.
    pub rows: Option<Vec<Row>>,
    /// Query result set, when requested.
    pub result_set: Option<ResultSet<S>>,
}

impl<S: Session> ExecuteResult<S> {
    fn index_of(&self, name: &str) -> Option<usize> {
        let normalized = normalize_bind_name(name);
        self.out_binds
            .iter()
            .position(|b| b.placeholder == normalized || b.placeholder == name)
    }

    /// OUT bind by placeholder name.
    pub fn out_bind(&self, name: &str) -> Option<&OutValue<S>> {
        self.index_of(name).map(|i| &self.out_binds[i].value)
    }

    /// Plain OUT value by placeholder name.
    pub fn out_value(&self, name: &str) -> Option<&Value> {
        self.out_bind(name).and_then(OutValue::as_value)
    }

    /// Take ownership of an OUT bind, typically a LOB or result set.
    pub fn take_out_bind(&mut self, name: &str) -> Option<OutValue<S>> {
        let index = self.index_of(name)?;
        Some(self.out_binds.remove(index).value)
    }
}

impl<S: Session> fmt::Debug for ExecuteResult<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteResult")
            .field("rows_affected", &self.rows_affected)
            .field("out_binds", &self.out_binds)
            .field("rows", &self.rows.as_ref().map(Vec::len))
            .field("result_set", &self.result_set)
            .finish()
    }
}

/// Result of [`Connection::execute_many`].
pub struct ExecuteManyResult<S: Session> {
    /// Rows affected per bind row.
    pub rows_affected: Vec<u64>,
    /// OUT and IN OUT binds per bind row, in placeholder order. Empty when
    /// the statement has no output binds.
    pub out_binds: Vec<Vec<OutBind<S>>>,
}

impl<S: Session> fmt::Debug for ExecuteManyResult<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteManyResult")
            .field("rows_affected", &self.rows_affected)
            .field("out_binds", &self.out_binds)
            .finish()
    }
}

/// A connection over a [`Session`].
///
/// # Example
///
/// ```ignore
/// use oracle_thin_bind::{BindSpec, Binds, Connection, DbType, ExecuteOptions};
///
/// let mut conn = Connection::new(session);
/// let binds = Binds::named([
///     ("id", BindSpec::input(7)),
///     ("name", BindSpec::output(DbType::Varchar).with_max_size(40)),
/// ]);
/// let result = conn
///     .execute("begin :name := get_name(:id); end;", &binds, &ExecuteOptions::default())
///     .await?;
/// println!("{:?}", result.out_value("name"));
/// ```
pub struct Connection<S: Session> {
    session: Arc<S>,
    cache: StatementCache,
    config: ConnectionConfig,
    /// Fired when the connection closes; shared with every handle it produced.
    closed: CancelHandle,
}

impl<S: Session> Connection<S> {
    pub fn new(session: S) -> Self {
        Self::with_config(session, ConnectionConfig::default())
    }

    pub fn with_config(session: S, config: ConnectionConfig) -> Self {
        Self {
            session: Arc::new(session),
            cache: StatementCache::new(config.statement_cache_size),
            config,
            closed: CancelHandle::new(),
        }
    }

    pub fn session(&self) -> &Arc<S> {
        &self.session
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn statement_cache(&self) -> &StatementCache {
        &self.cache
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.is_cancelled() {
            Err(Error::ConnectionClosed)
        } else {
            Ok(())
        }
    }

    /// Run a session round trip under the call timeout.
    async fn round_trip<T, F>(&self, call_timeout: Option<Duration>, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check_open()?;
        match call_timeout {
            Some(limit) => timeout(limit, fut)
                .await
                .map_err(|_| Error::CallTimeout { timeout: limit })?,
            None => fut.await,
        }
    }

    /// Scanner output for `sql`, checked against the server's view.
    ///
    /// Disagreement on bind names or statement type is a protocol error.
    pub async fn statement_info(&mut self, sql: &str) -> Result<Arc<StatementInfo>> {
        self.check_open()?;
        let info = self.cache.get_or_scan(sql);
        let server = self
            .round_trip(self.config.default_options.call_timeout, self.session.prepare_info(sql))
            .await?;
        let type_differs = server
            .statement_type
            .is_some_and(|t| t != info.statement_type);
        if server.bind_names != info.bind_names || type_differs {
            warn!(
                scanned = ?info.bind_names,
                server = ?server.bind_names,
                scanned_type = %info.statement_type,
                "scanner and server disagree on statement"
            );
            return Err(Error::protocol(format!(
                "bind names {:?} differ from server bind names {:?}",
                info.bind_names, server.bind_names
            )));
        }
        Ok(info)
    }

    /// Resolve binds without executing.
    pub fn resolve_binds(
        &mut self,
        sql: &str,
        binds: &Binds,
        options: &ExecuteOptions,
    ) -> Result<Vec<BindDescriptor>> {
        let info = self.cache.get_or_scan(sql);
        resolve(&info, binds, &options.bind)
    }

    /// Execute a statement.
    pub async fn execute(
        &mut self,
        sql: &str,
        binds: &Binds,
        options: &ExecuteOptions,
    ) -> Result<ExecuteResult<S>> {
        self.check_open()?;
        let info = self.cache.get_or_scan(sql);
        let descriptors = resolve(&info, binds, &options.bind)?;

        // Encode everything that needs no round trip first.
        let mut pending = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            let wire = match lob_content(descriptor) {
                Some(_) => None,
                None if descriptor.dir.is_input() => Some(encode(
                    descriptor.db_type,
                    descriptor.value.as_ref(),
                    &options.convert,
                )?),
                None => Some(WireValue::Null),
            };
            pending.push(wire);
        }

        let mut temp_lobs = Vec::new();
        let mut bound = Vec::with_capacity(descriptors.len());
        for (descriptor, wire) in descriptors.into_iter().zip(pending) {
            let wire = match wire {
                Some(wire) => wire,
                None => match self.bind_temp_lob(&descriptor, options).await {
                    Ok(lob) => {
                        let wire = WireValue::Lob(lob.locator().clone());
                        temp_lobs.push(lob);
                        wire
                    }
                    Err(err) => {
                        release_temp_lobs(temp_lobs).await;
                        return Err(err);
                    }
                },
            };
            bound.push(BoundValue { descriptor, wire });
        }

        let outputs: Vec<BindDescriptor> = bound
            .iter()
            .filter(|b| b.descriptor.dir.is_output())
            .map(|b| b.descriptor.clone())
            .collect();
        let request = ExecuteRequest {
            sql: sql.to_string(),
            statement: Arc::clone(&info),
            binds: bound,
            fetch_array_size: options.fetch_array_size,
            prefetch_rows: options.prefetch_rows,
            auto_commit: options.auto_commit,
        };
        debug!(
            statement_type = %info.statement_type,
            binds = request.binds.len(),
            outputs = outputs.len(),
            "executing statement"
        );
        let result = self
            .round_trip(options.call_timeout, self.session.execute(request))
            .await;
        release_temp_lobs(temp_lobs).await;
        let response = result?;
        debug!(
            rows_affected = response.rows_affected,
            rows = response.rows.len(),
            cursor_id = response.cursor_id,
            "statement executed"
        );

        let cursor_id = response.cursor_id;
        let out_binds = match self
            .decode_out_binds(outputs, response.out_binds, options)
            .await
        {
            Ok(out_binds) => out_binds,
            Err(err) => {
                self.release_cursor(cursor_id).await;
                return Err(err);
            }
        };

        let mut result = ExecuteResult {
            rows_affected: response.rows_affected,
            out_binds,
            columns: None,
            rows: None,
            result_set: None,
        };
        let Some(columns) = response.columns else {
            return Ok(result);
        };

        let column_info = match ColumnInfo::from_metadata(&columns) {
            Ok(info) => Arc::new(info),
            Err(err) => {
                self.release_cursor(cursor_id).await;
                release_out_binds(result.out_binds).await;
                return Err(err);
            }
        };

        if options.result_set {
            let rs = ResultSet::new(
                Arc::clone(&self.session),
                cursor_id,
                &columns,
                response.rows,
                response.more_rows,
                options.fetch_array_size,
                options.convert.clone(),
                self.closed.clone(),
            );
            return match rs {
                Ok(rs) => {
                    result.columns = Some(column_info);
                    result.result_set = Some(rs);
                    Ok(result)
                }
                Err(err) => {
                    release_out_binds(result.out_binds).await;
                    Err(err)
                }
            };
        }

        let fetched = self
            .fetch_all(
                &column_info,
                cursor_id,
                response.rows,
                response.more_rows,
                options,
            )
            .await;
        match fetched {
            Ok(rows) => {
                result.columns = Some(column_info);
                result.rows = Some(rows);
                Ok(result)
            }
            Err(err) => {
                release_out_binds(result.out_binds).await;
                Err(err)
            }
        }
    }

    /// Execute with the connection's default options and return query rows.
    pub async fn query(&mut self, sql: &str, binds: &Binds) -> Result<Vec<Row>> {
        let options = self.config.default_options.clone().with_result_set(false);
        let result = self.execute(sql, binds, &options).await?;
        Ok(result.rows.unwrap_or_default())
    }

    /// Execute once per bind row. Every row is resolved and encoded before
    /// the batch is sent. Returns rows affected and OUT binds per bind row.
    pub async fn execute_many(
        &mut self,
        sql: &str,
        rows: &[Binds],
        options: &ExecuteOptions,
    ) -> Result<ExecuteManyResult<S>> {
        self.check_open()?;
        let info = self.cache.get_or_scan(sql);
        let mut bound_rows = Vec::with_capacity(rows.len());
        let mut outputs = Vec::with_capacity(rows.len());
        for binds in rows {
            let descriptors = resolve(&info, binds, &options.bind)?;
            outputs.push(
                descriptors
                    .iter()
                    .filter(|d| d.dir.is_output())
                    .cloned()
                    .collect::<Vec<_>>(),
            );
            let bound = descriptors
                .into_iter()
                .map(|descriptor| {
                    let wire = if descriptor.dir.is_input() {
                        encode(descriptor.db_type, descriptor.value.as_ref(), &options.convert)?
                    } else {
                        WireValue::Null
                    };
                    Ok(BoundValue { descriptor, wire })
                })
                .collect::<Result<Vec<_>>>()?;
            bound_rows.push(bound);
        }
        let expected_out_rows = if outputs.iter().any(|o| !o.is_empty()) {
            rows.len()
        } else {
            0
        };
        debug!(
            statement_type = %info.statement_type,
            rows = bound_rows.len(),
            with_outputs = expected_out_rows > 0,
            "executing batch"
        );
        let request = ExecuteManyRequest {
            sql: sql.to_string(),
            statement: info,
            rows: bound_rows,
            auto_commit: options.auto_commit,
        };
        let response = self
            .round_trip(options.call_timeout, self.session.execute_many(request))
            .await?;
        if response.rows_affected.len() != rows.len() {
            return Err(Error::protocol(format!(
                "expected {} row counts, session returned {}",
                rows.len(),
                response.rows_affected.len()
            )));
        }
        if response.out_binds.len() != expected_out_rows {
            return Err(Error::protocol(format!(
                "expected OUT binds for {} rows, session returned {}",
                expected_out_rows,
                response.out_binds.len()
            )));
        }

        let mut out_binds = Vec::with_capacity(expected_out_rows);
        for (row_outputs, wires) in outputs.into_iter().zip(response.out_binds) {
            match self.decode_out_binds(row_outputs, wires, options).await {
                Ok(decoded) => out_binds.push(decoded),
                Err(err) => {
                    for decoded in out_binds {
                        release_out_binds(decoded).await;
                    }
                    return Err(err);
                }
            }
        }
        Ok(ExecuteManyResult {
            rows_affected: response.rows_affected,
            out_binds,
        })
    }

    /// Create an empty temporary LOB.
    pub async fn create_lob(&self, kind: LobKind) -> Result<Lob<S>> {
        let call_timeout = self.config.default_options.call_timeout;
        let locator = self
            .round_trip(call_timeout, self.session.lob_create_temp(kind))
            .await?;
        Ok(Lob::new(
            Arc::clone(&self.session),
            locator.temporary(),
            self.closed.clone(),
        ))
    }

    /// Open a LOB from a fetched locator.
    pub fn open_lob(&self, locator: &LobLocator) -> Result<Lob<S>> {
        self.check_open()?;
        Ok(Lob::new(
            Arc::clone(&self.session),
            locator.clone(),
            self.closed.clone(),
        ))
    }

    /// Open a result set from a fetched cursor locator.
    pub fn open_cursor(&self, locator: &CursorLocator, options: &ExecuteOptions) -> Result<ResultSet<S>> {
        self.check_open()?;
        ResultSet::new(
            Arc::clone(&self.session),
            locator.cursor_id,
            &locator.columns,
            Vec::new(),
            true,
            options.fetch_array_size,
            options.convert.clone(),
            self.closed.clone(),
        )
    }

    /// Close the connection. Every LOB and result set it produced becomes
    /// unusable; in-flight round trips on them fail fast. Dropping a
    /// connection closes it too.
    pub fn close(self) {
        debug!(cached_statements = self.cache.len(), "closing connection");
        self.closed.cancel();
    }

    /// Create a temporary LOB holding an IN bind's text or bytes.
    async fn bind_temp_lob(&self, descriptor: &BindDescriptor, options: &ExecuteOptions) -> Result<Lob<S>> {
        let Some(data) = lob_content(descriptor) else {
            return Err(Error::protocol("bind has no LOB content"));
        };
        let locator = self
            .round_trip(options.call_timeout, self.session.lob_create_temp(data.kind()))
            .await?;
        let mut lob = Lob::new(
            Arc::clone(&self.session),
            locator.temporary(),
            self.closed.clone(),
        );
        let written = async {
            let mut writer = lob.writer()?;
            writer.write(data).await?;
            writer.finish().await
        }
        .await;
        match written {
            Ok(()) => Ok(lob),
            Err(err) => {
                if !lob.is_closed() {
                    let _ = lob.close().await;
                }
                Err(err)
            }
        }
    }

    /// Decode one execution's output binds. On failure, handles already
    /// decoded and cursors still in the undecoded values are released.
    async fn decode_out_binds(
        &self,
        outputs: Vec<BindDescriptor>,
        wires: Vec<WireValue>,
        options: &ExecuteOptions,
    ) -> Result<Vec<OutBind<S>>> {
        if wires.len() != outputs.len() {
            let err = Error::protocol(format!(
                "expected {} OUT binds, session returned {}",
                outputs.len(),
                wires.len()
            ));
            self.release_wire_cursors(wires).await;
            return Err(err);
        }
        let mut decoded = Vec::with_capacity(outputs.len());
        let mut pending = outputs.into_iter().zip(wires);
        while let Some((descriptor, wire)) = pending.next() {
            match self.decode_out_bind(&descriptor, wire, options).await {
                Ok(value) => decoded.push(OutBind {
                    slot: descriptor.slot().clone(),
                    placeholder: descriptor.placeholder,
                    value,
                }),
                Err(err) => {
                    release_out_binds(decoded).await;
                    self.release_wire_cursors(pending.map(|(_, wire)| wire).collect())
                        .await;
                    return Err(err);
                }
            }
        }
        Ok(decoded)
    }

    async fn release_wire_cursors(&self, wires: Vec<WireValue>) {
        for wire in wires {
            if let WireValue::Cursor(locator) = wire {
                self.release_cursor(locator.cursor_id).await;
            }
        }
    }

    /// Close a server cursor the caller will never see. Failures are logged.
    async fn release_cursor(&self, cursor_id: u32) {
        if cursor_id == 0 {
            return;
        }
        if let Err(err) = self.session.cursor_close(cursor_id).await {
            warn!(cursor_id, error = %err, "failed to release cursor");
        }
    }

    async fn decode_out_bind(
        &self,
        descriptor: &BindDescriptor,
        wire: WireValue,
        options: &ExecuteOptions,
    ) -> Result<OutValue<S>> {
        check_out_size(descriptor, &wire)?;
        let value = decode(descriptor.db_type, wire, &options.convert)?;
        match value {
            Value::Cursor(locator) => Ok(OutValue::ResultSet(self.open_cursor(&locator, options)?)),
            Value::Lob(locator) if descriptor.promoted_from.is_some() => {
                let guards = Guards::new(self.closed.clone());
                let value =
                    read_lob(&self.session, &guards, Error::ConnectionClosed, &locator).await?;
                if value.bind_len() > descriptor.max_size as usize {
                    return Err(Error::OutBufferTooSmall);
                }
                Ok(OutValue::Value(value))
            }
            Value::Lob(locator) => Ok(OutValue::Lob(self.open_lob(&locator)?)),
            value if descriptor.promoted_from.is_some() => {
                if value.bind_len() > descriptor.max_size as usize {
                    return Err(Error::OutBufferTooSmall);
                }
                Ok(OutValue::Value(value))
            }
            value => Ok(OutValue::Value(value)),
        }
    }

    /// Decode prefetched rows and fetch the rest, up to `max_rows`. The cursor
    /// is closed on every exit.
    async fn fetch_all(
        &self,
        column_info: &Arc<ColumnInfo>,
        cursor_id: u32,
        prefetched: Vec<Vec<WireValue>>,
        more_rows: bool,
        options: &ExecuteOptions,
    ) -> Result<Vec<Row>> {
        let fetched = self
            .fetch_rows(column_info, cursor_id, prefetched, more_rows, options)
            .await;
        if fetched.is_err() {
            self.release_cursor(cursor_id).await;
            return fetched;
        }
        if cursor_id != 0 {
            self.session.cursor_close(cursor_id).await?;
        }
        fetched
    }

    async fn fetch_rows(
        &self,
        column_info: &Arc<ColumnInfo>,
        cursor_id: u32,
        prefetched: Vec<Vec<WireValue>>,
        mut more_rows: bool,
        options: &ExecuteOptions,
    ) -> Result<Vec<Row>> {
        let guards = Guards::new(self.closed.clone());
        let limit = match options.max_rows {
            0 => usize::MAX,
            n => n as usize,
        };
        let mut wire_rows = prefetched;
        let mut rows = Vec::new();
        loop {
            for wire in wire_rows.drain(..) {
                if rows.len() >= limit {
                    break;
                }
                let values = decode_row(
                    &self.session,
                    &guards,
                    Error::ConnectionClosed,
                    column_info,
                    wire,
                    &options.convert,
                )
                .await?;
                rows.push(Row::new(values, Arc::clone(column_info)));
            }
            if !more_rows || rows.len() >= limit || cursor_id == 0 {
                break;
            }
            let response = self
                .round_trip(
                    options.call_timeout,
                    self.session.cursor_fetch(cursor_id, options.fetch_array_size),
                )
                .await?;
            wire_rows = response.rows;
            more_rows = response.more_rows;
        }
        Ok(rows)
    }
}

impl<S: Session> Drop for Connection<S> {
    fn drop(&mut self) {
        self.closed.cancel();
    }
}

impl<S: Session> fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("closed", &self.is_closed())
            .field("cached_statements", &self.cache.len())
            .finish()
    }
}

/// Text or bytes an IN bind carries into a LOB-typed slot.
///
/// Content of the wrong kind for the slot is left to the encoder to reject.
fn lob_content(descriptor: &BindDescriptor) -> Option<LobData> {
    let kind = LobKind::from_db_type(descriptor.db_type)?;
    if !descriptor.dir.is_input() || is_nullish(descriptor.db_type, descriptor.value.as_ref()) {
        return None;
    }
    match (kind, descriptor.value.as_ref()?) {
        (LobKind::Clob, Value::String(s)) => Some(LobData::Text(s.clone())),
        (LobKind::Blob, Value::Bytes(b)) => Some(LobData::Bytes(Bytes::copy_from_slice(b))),
        _ => None,
    }
}

/// Variable-length OUT values must fit the declared buffer.
fn check_out_size(descriptor: &BindDescriptor, wire: &WireValue) -> Result<()> {
    if descriptor.promoted_from.is_some() || !descriptor.db_type.is_variable_length() {
        return Ok(());
    }
    let max_size = descriptor.max_size as usize;
    let too_long = match wire {
        WireValue::Array(items) => items.iter().any(|w| w.buffer_len() > max_size),
        other => other.buffer_len() > max_size,
    };
    if too_long {
        Err(Error::OutBufferTooSmall)
    } else {
        Ok(())
    }
}

/// Close LOBs and result sets decoded for a call that then failed.
async fn release_out_binds<S: Session>(out_binds: Vec<OutBind<S>>) {
    for bind in out_binds {
        let released = match bind.value {
            OutValue::Lob(mut lob) => lob.close().await,
            OutValue::ResultSet(mut rs) => rs.close().await,
            OutValue::Value(_) => Ok(()),
        };
        if let Err(err) = released {
            warn!(placeholder = %bind.placeholder, error = %err, "failed to release OUT bind");
        }
    }
}

async fn release_temp_lobs<S: Session>(lobs: Vec<Lob<S>>) {
    for mut lob in lobs {
        if let Err(err) = lob.close().await {
            warn!(error = %err, "failed to release temporary LOB");
        }
    }
}
