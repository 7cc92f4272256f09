//! Large object handles.
//!
//! A [`Lob`] wraps a server locator as a chunked streaming resource. Reads
//! move an internal cursor forward one piece per round trip and stop at the
//! first empty piece; the sequence is not restartable. Writes go through a
//! [`LobWriter`], which buffers to the piece size and commits on
//! [`finish`](LobWriter::finish). Nothing written becomes visible until then.
//!
//! The chunk size is fixed by the server. The piece size is the client's
//! round-trip unit and defaults to the chunk size.
//!
//! A LOB is closed explicitly, by a streaming failure, or when its connection
//! closes. Every operation on a closed LOB fails. Operations on one handle
//! are serialized by `&mut self`; use a [`CancelHandle`] to close it from
//! another task while a round trip is in flight.

use std::sync::Arc;

use futures::stream::{self, Stream};
use tracing::debug;

use crate::cancel::{CancelHandle, Guards};
use crate::error::{Error, Result};
use crate::session::Session;
use crate::types::{LobData, LobKind, LobLocator, Value};

/// Server-side large object.
pub struct Lob<S: Session> {
    session: Arc<S>,
    locator: LobLocator,
    piece_size: u32,
    state: LobState,
    guards: Guards,
}

enum LobState {
    Open(LobCursor),
    Closed,
}

struct LobCursor {
    /// Next 1-based read offset.
    read_offset: u64,
    exhausted: bool,
    /// Cached length; `None` after a write.
    length: Option<u64>,
}

impl<S: Session> Lob<S> {
    pub(crate) fn new(session: Arc<S>, locator: LobLocator, connection: CancelHandle) -> Self {
        debug!(
            kind = ?locator.kind,
            size = locator.size,
            chunk_size = locator.chunk_size,
            temporary = locator.is_temp,
            "opened LOB"
        );
        let length = Some(locator.size);
        Self {
            session,
            piece_size: locator.chunk_size,
            locator,
            state: LobState::Open(LobCursor {
                read_offset: 1,
                exhausted: false,
                length,
            }),
            guards: Guards::new(connection),
        }
    }

    pub fn kind(&self) -> LobKind {
        self.locator.kind
    }

    /// Locator to bind this LOB into a statement.
    pub fn locator(&self) -> &LobLocator {
        &self.locator
    }

    /// Server-negotiated I/O unit.
    pub fn chunk_size(&self) -> u32 {
        self.locator.chunk_size
    }

    /// Client round-trip unit. 0 means the chunk size.
    pub fn piece_size(&self) -> u32 {
        self.piece_size
    }

    /// Set the piece size.
    ///
    /// Accepts any non-negative integral number, including 0. Negative
    /// values, NaN, NULL and non-numbers are rejected.
    ///
    /// ```ignore
    /// lob.set_piece_size(0)?;
    /// assert!(lob.set_piece_size(-100).is_err());
    /// assert!(lob.set_piece_size(f64::NAN).is_err());
    /// assert!(lob.set_piece_size(None::<i64>).is_err());
    /// ```
    pub fn set_piece_size(&mut self, size: impl Into<Value>) -> Result<()> {
        let invalid = Error::InvalidPropertyValue {
            property: "pieceSize",
        };
        let size = match size.into() {
            Value::Integer(n) => u32::try_from(n).map_err(|_| invalid)?,
            Value::Float(f) if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => {
                f as u32
            }
            _ => return Err(invalid),
        };
        self.piece_size = size;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, LobState::Closed)
            || self.guards.own.is_cancelled()
            || self.guards.connection.is_cancelled()
    }

    /// Handle that closes this LOB from elsewhere. An in-flight round trip
    /// then fails with [`Error::LobClosed`]. Cancelling counts as closing:
    /// every later operation fails, `close` included.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.guards.own.clone()
    }

    fn io_size(&self) -> u64 {
        let size = if self.piece_size == 0 {
            self.locator.chunk_size
        } else {
            self.piece_size
        };
        u64::from(size.max(1))
    }

    fn cursor(&mut self) -> Result<&mut LobCursor> {
        self.guards.check(Error::LobClosed)?;
        match &mut self.state {
            LobState::Open(cursor) => Ok(cursor),
            LobState::Closed => Err(Error::LobClosed),
        }
    }

    /// Move to `Closed` after a streaming failure.
    fn invalidate(&mut self, err: &Error) {
        if let LobState::Open(_) = self.state {
            debug!(error = %err, "LOB invalidated by streaming error");
            self.state = LobState::Closed;
            self.guards.own.cancel();
        }
    }

    /// Current length in characters (CLOB) or bytes (BLOB).
    pub async fn length(&mut self) -> Result<u64> {
        if let Some(length) = self.cursor()?.length {
            return Ok(length);
        }
        let length = self
            .guards
            .run(Error::LobClosed, self.session.lob_length(&self.locator))
            .await?;
        self.cursor()?.length = Some(length);
        Ok(length)
    }

    /// Read the next piece. `Ok(None)` once the end is reached.
    pub async fn read_chunk(&mut self) -> Result<Option<LobData>> {
        let amount = self.io_size();
        let cursor = self.cursor()?;
        if cursor.exhausted {
            return Ok(None);
        }
        let offset = cursor.read_offset;
        let result = self
            .guards
            .run(
                Error::LobClosed,
                self.session.lob_read(&self.locator, offset, amount),
            )
            .await;
        let data = match result {
            Ok(data) => data,
            Err(err) => {
                self.invalidate(&err);
                return Err(err);
            }
        };
        let cursor = self.cursor()?;
        if data.is_empty() {
            cursor.exhausted = true;
            return Ok(None);
        }
        cursor.read_offset += data.len();
        Ok(Some(data))
    }

    /// Stream the remaining pieces. Ends after the last piece or after the
    /// first error.
    pub fn chunks(&mut self) -> impl Stream<Item = Result<LobData>> + Send + '_ {
        stream::unfold(Some(self), |lob| async move {
            let lob = lob?;
            match lob.read_chunk().await {
                Ok(Some(data)) => Some((Ok(data), Some(lob))),
                Ok(None) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }

    /// Read the whole object, independent of the read cursor.
    pub async fn get_data(&mut self) -> Result<LobData> {
        self.cursor()?;
        let amount = self.io_size();
        let mut data = LobData::empty(self.locator.kind);
        let mut offset = 1;
        loop {
            let result = self
                .guards
                .run(
                    Error::LobClosed,
                    self.session.lob_read(&self.locator, offset, amount),
                )
                .await;
            let piece = match result {
                Ok(piece) => piece,
                Err(err) => {
                    self.invalidate(&err);
                    return Err(err);
                }
            };
            if piece.is_empty() {
                break;
            }
            offset += piece.len();
            data.append(piece);
        }
        Ok(data)
    }

    /// Truncate to `new_size` characters or bytes.
    pub async fn trim(&mut self, new_size: u64) -> Result<()> {
        self.cursor()?;
        self.guards
            .run(Error::LobClosed, self.session.lob_trim(&self.locator, new_size))
            .await?;
        self.cursor()?.length = None;
        Ok(())
    }

    /// Start writing at the beginning of the object.
    pub fn writer(&mut self) -> Result<LobWriter<'_, S>> {
        self.cursor()?;
        let buffer = LobData::empty(self.locator.kind);
        Ok(LobWriter {
            lob: self,
            offset: 1,
            buffer,
            sent_any: false,
            explicit_empty: false,
            failure: None,
        })
    }

    /// Release the server locator.
    ///
    /// Closing twice is an error. Uncommitted writes are discarded.
    pub async fn close(&mut self) -> Result<()> {
        self.cursor()?;
        self.state = LobState::Closed;
        self.guards.own.cancel();
        debug!(kind = ?self.locator.kind, "closing LOB");
        self.session.lob_close(&self.locator).await
    }
}

impl<S: Session> std::fmt::Debug for Lob<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lob")
            .field("kind", &self.locator.kind)
            .field("chunk_size", &self.locator.chunk_size)
            .field("piece_size", &self.piece_size)
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Buffered writer over a [`Lob`].
///
/// A failed round trip closes the LOB. The error is returned by the write
/// that hit it and once more by [`finish`](Self::finish).
pub struct LobWriter<'lob, S: Session> {
    lob: &'lob mut Lob<S>,
    /// Next 1-based write offset.
    offset: u64,
    buffer: LobData,
    sent_any: bool,
    explicit_empty: bool,
    failure: Option<Error>,
}

impl<S: Session> LobWriter<'_, S> {
    /// Queue data, sending every full piece.
    pub async fn write(&mut self, data: impl Into<LobData>) -> Result<()> {
        if self.failure.is_some() {
            return Err(Error::InvalidLob);
        }
        let data = data.into();
        if data.kind() != self.lob.locator.kind {
            return Err(Error::type_conversion(format!(
                "cannot write {:?} data to a {:?}",
                data.kind(),
                self.lob.locator.kind
            )));
        }
        self.lob.cursor()?;
        if data.is_empty() {
            self.explicit_empty = true;
            return Ok(());
        }
        self.buffer.append(data);
        let piece_size = self.lob.io_size();
        while self.buffer.len() >= piece_size {
            let piece = self.buffer.split_to(piece_size as usize);
            self.send(piece).await?;
        }
        Ok(())
    }

    async fn send(&mut self, piece: LobData) -> Result<()> {
        let len = piece.len();
        let result = self
            .lob
            .guards
            .run(
                Error::LobClosed,
                self.lob.session.lob_write(&self.lob.locator, self.offset, piece),
            )
            .await;
        match result {
            Ok(()) => {
                self.offset += len;
                self.sent_any = true;
                if let LobState::Open(cursor) = &mut self.lob.state {
                    cursor.length = None;
                }
                Ok(())
            }
            Err(err) => {
                self.lob.invalidate(&err);
                self.failure = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Flush the buffer and commit. An explicit empty write with no other
    /// data leaves the LOB allocated but empty.
    pub async fn finish(mut self) -> Result<()> {
        if let Some(err) = self.failure.take() {
            return Err(err);
        }
        if !self.buffer.is_empty() {
            let rest = std::mem::replace(&mut self.buffer, LobData::empty(self.lob.locator.kind));
            self.send(rest).await?;
        } else if self.explicit_empty && !self.sent_any {
            let empty = LobData::empty(self.lob.locator.kind);
            self.send(empty).await?;
        }
        let result = self
            .lob
            .guards
            .run(Error::LobClosed, self.lob.session.lob_commit(&self.lob.locator))
            .await;
        if let Err(err) = &result {
            self.lob.invalidate(err);
        } else {
            debug!(written = self.offset - 1, "committed LOB writes");
        }
        result
    }
}
