//! Cancellation for in-flight LOB and cursor round trips.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

use crate::error::{Error, Result};

/// Shared close signal.
///
/// Clones observe the same state. Cancelling is one-way.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    inner: Arc<CancelState>,
}

#[derive(Debug)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancelState {
                cancelled: AtomicBool::new(false),
                notify: Notify::new(),
            }),
        }
    }

    /// Signal cancellation. Pending [`cancelled`](Self::cancelled) futures wake up.
    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once cancelled.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking the flag so a concurrent cancel is not missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Guards for a handle owned by a connection: its own close signal and the
/// connection's.
#[derive(Clone, Debug)]
pub(crate) struct Guards {
    pub own: CancelHandle,
    pub connection: CancelHandle,
}

impl Guards {
    pub fn new(connection: CancelHandle) -> Self {
        Self {
            own: CancelHandle::new(),
            connection,
        }
    }

    /// Fail with `closed` or `ConnectionClosed` if either signal fired.
    pub fn check(&self, closed: Error) -> Result<()> {
        if self.connection.is_cancelled() {
            Err(Error::ConnectionClosed)
        } else if self.own.is_cancelled() {
            Err(closed)
        } else {
            Ok(())
        }
    }

    /// Run a round trip, failing fast with `closed` if the handle or its
    /// connection is closed before it completes.
    pub async fn run<T, F>(&self, closed: Error, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check(closed.clone())?;
        tokio::select! {
            biased;
            _ = self.connection.cancelled() => Err(Error::ConnectionClosed),
            _ = self.own.cancelled() => Err(closed),
            result = fut => result,
        }
    }
}
