//! Output sinks for rendered records.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use netwatch_common::error::{NetwatchError, Result};

/// Accepts rendered lines one at a time, in order.
///
/// A line must be visible to readers before `write_line` returns.
pub trait RecordSink {
    /// Writes one line. The terminator is added by the sink.
    ///
    /// # Errors
    ///
    /// Returns [`NetwatchError::Sink`] if the line cannot be written.
    fn write_line(&mut self, line: &str) -> Result<()>;

    /// Flushes and releases the sink.
    ///
    /// # Errors
    ///
    /// Returns [`NetwatchError::Sink`] if the final flush fails.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Line-buffered sink over any writer (stdout, a file, a pipe).
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    /// Wraps a writer.
    #[must_use]
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for WriterSink<W> {
    fn write_line(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{line}")
            .and_then(|()| self.writer.flush())
            .map_err(|source| NetwatchError::Sink { source })
    }

    fn close(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|source| NetwatchError::Sink { source })
    }
}

/// In-memory sink whose lines stay readable through cloned handles.
///
/// Used to embed the pipeline in other programs and to observe a worker
/// thread's output.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
    closed: Arc<Mutex<bool>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out every line written so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RecordSink for MemorySink {
    fn write_line(&mut self, line: &str) -> Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_owned());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        *self.closed.lock().unwrap_or_else(PoisonError::into_inner) = true;
        Ok(())
    }
}
