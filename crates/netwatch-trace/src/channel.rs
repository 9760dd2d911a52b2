//! Push adapter: the OS session callback sends, the dispatch worker receives.

use crossbeam::channel::{self, Receiver, Sender};
use netwatch_common::error::{NetwatchError, Result};

use crate::event::RawTraceEvent;
use crate::source::{CancelToken, TraceSource};

/// Sending half handed to the tracing collaborator's callback.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<RawTraceEvent>,
}

impl EventSender {
    /// Delivers one event, blocking while the channel is full.
    ///
    /// # Errors
    ///
    /// Returns an error once the receiving source has been dropped.
    pub fn send(&self, event: RawTraceEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| NetwatchError::TraceStream {
            message: "dispatch worker is gone".into(),
        })
    }
}

/// Receiving half, consumed by the dispatch loop.
#[derive(Debug)]
pub struct ChannelSource {
    rx: Receiver<RawTraceEvent>,
    stopped: bool,
}

/// Creates a bounded push channel.
#[must_use]
pub fn channel(capacity: usize) -> (EventSender, ChannelSource) {
    let (tx, rx) = channel::bounded(capacity);
    (EventSender { tx }, ChannelSource { rx, stopped: false })
}

impl TraceSource for ChannelSource {
    fn name(&self) -> &'static str {
        "channel"
    }

    fn next_event(&mut self, cancel: &CancelToken) -> Result<Option<RawTraceEvent>> {
        if self.stopped || cancel.is_cancelled() {
            return Ok(None);
        }
        crossbeam::select! {
            recv(self.rx) -> msg => Ok(msg.ok()),
            recv(cancel.signal()) -> _ => Ok(None),
        }
    }

    fn stop(&mut self) {
        self.stopped = true;
        tracing::debug!(pending = self.rx.len(), "channel source stopped");
    }
}
