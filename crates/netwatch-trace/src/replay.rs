//! Replays captured trace events from newline-delimited JSON.
//!
//! Each non-blank line is one serialized [`RawTraceEvent`]. Lines that do
//! not decode are logged and skipped, the same way unrecognised live
//! events are filtered rather than treated as failures.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use netwatch_common::error::{NetwatchError, Result};

use crate::event::RawTraceEvent;
use crate::source::{CancelToken, TraceSource};

enum Origin {
    Path(PathBuf),
    Stdin,
    Reader(Option<Box<dyn BufRead + Send>>),
}

/// Trace source backed by an NDJSON capture.
pub struct ReplaySource {
    origin: Origin,
    reader: Option<Box<dyn BufRead + Send>>,
    line_no: u64,
    skipped: u64,
}

impl ReplaySource {
    /// Replays a capture file, opened on [`start`](TraceSource::start).
    #[must_use]
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::with_origin(Origin::Path(path.into()))
    }

    /// Replays events piped on standard input.
    #[must_use]
    pub fn from_stdin() -> Self {
        Self::with_origin(Origin::Stdin)
    }

    /// Replays events from an arbitrary reader.
    #[must_use]
    pub fn from_reader(reader: impl BufRead + Send + 'static) -> Self {
        Self::with_origin(Origin::Reader(Some(Box::new(reader))))
    }

    const fn with_origin(origin: Origin) -> Self {
        Self {
            origin,
            reader: None,
            line_no: 0,
            skipped: 0,
        }
    }

    /// Number of lines that could not be decoded so far.
    #[must_use]
    pub const fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl TraceSource for ReplaySource {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn start(&mut self) -> Result<()> {
        let reader: Box<dyn BufRead + Send> = match &mut self.origin {
            Origin::Path(path) => {
                let file = File::open(&*path).map_err(|e| NetwatchError::TraceSession {
                    message: format!("cannot open capture {}: {e}", path.display()),
                })?;
                tracing::info!(path = %path.display(), "replaying capture");
                Box::new(BufReader::new(file))
            }
            Origin::Stdin => Box::new(BufReader::new(std::io::stdin())),
            Origin::Reader(reader) => reader.take().ok_or_else(|| NetwatchError::TraceSession {
                message: "replay source already started".into(),
            })?,
        };
        self.reader = Some(reader);
        Ok(())
    }

    fn next_event(&mut self, cancel: &CancelToken) -> Result<Option<RawTraceEvent>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        let mut line = String::new();
        loop {
            if cancel.is_cancelled() {
                return Ok(None);
            }
            line.clear();
            let read = reader
                .read_line(&mut line)
                .map_err(|e| NetwatchError::TraceStream {
                    message: format!("capture read failed at line {}: {e}", self.line_no + 1),
                })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawTraceEvent>(trimmed) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => {
                    self.skipped += 1;
                    tracing::warn!(line = self.line_no, error = %e, "skipping undecodable event");
                }
            }
        }
    }

    fn stop(&mut self) {
        self.reader = None;
        tracing::debug!(lines = self.line_no, skipped = self.skipped, "replay source stopped");
    }
}

impl std::fmt::Debug for ReplaySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplaySource")
            .field("line_no", &self.line_no)
            .field("skipped", &self.skipped)
            .finish_non_exhaustive()
    }
}
