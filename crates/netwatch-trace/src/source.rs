//! Trace source abstraction and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crossbeam::channel::{self, Receiver, Sender};
use netwatch_common::error::Result;

use crate::event::RawTraceEvent;

/// A stream of trace events delivered in arrival order.
///
/// Implementors own the subscription to the operating system's tracing
/// facility (or a stand-in for it). The dispatch loop is the only caller.
pub trait TraceSource: Send {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Opens the subscription. Called once before the first `next_event`.
    ///
    /// # Errors
    ///
    /// Returns [`TraceSession`](netwatch_common::error::NetwatchError::TraceSession)
    /// if the subscription cannot be established.
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    /// Waits for the next event.
    ///
    /// Returns `Ok(None)` once the stream has ended or `cancel` has fired.
    /// The wait must wake up when `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying session breaks down.
    fn next_event(&mut self, cancel: &CancelToken) -> Result<Option<RawTraceEvent>>;

    /// Releases the subscription. Called once after the last `next_event`.
    fn stop(&mut self) {}
}

struct CancelInner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

/// Cooperative cancellation shared between the dispatch worker and its owner.
///
/// Besides the flag, the token exposes a channel that disconnects on
/// cancellation so blocking waits can `select!` on it.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl CancelToken {
    /// Creates a token that has not fired.
    #[must_use]
    pub fn new() -> Self {
        let (trigger, signal) = channel::bounded(0);
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                signal,
            }),
        }
    }

    /// Fires the token. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        let trigger = self
            .inner
            .trigger
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(trigger);
    }

    /// Whether the token has fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Channel that becomes disconnected once the token fires.
    #[must_use]
    pub fn signal(&self) -> &Receiver<()> {
        &self.inner.signal
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
