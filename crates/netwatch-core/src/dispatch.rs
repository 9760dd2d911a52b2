//! The dispatch loop: classify, resolve, format, write.
//!
//! A single worker owns the output sink, so records are written in
//! delivery order without locking. The process cache is shared read-only.

use std::sync::Arc;
use std::thread::JoinHandle;

use netwatch_common::config::{MonitorConfig, OutputFormat};
use netwatch_common::constants::{DISPATCH_THREAD_NAME, HEADER_LINE};
use netwatch_common::error::{NetwatchError, Result};
use netwatch_trace::event::RawTraceEvent;
use netwatch_trace::source::{CancelToken, TraceSource};
use serde::Serialize;

use crate::classifier::classify;
use crate::formatter::format;
use crate::process_cache::ProcessCache;
use crate::resolver::resolve;
use crate::sink::RecordSink;

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Events received from the source.
    pub events: u64,
    /// Records written to the sink.
    pub emitted: u64,
    /// Events dropped as unclassified.
    pub filtered: u64,
}

/// Drives events from a trace source into a record sink.
#[derive(Debug)]
pub struct Monitor<K: RecordSink> {
    cache: Arc<ProcessCache>,
    sink: K,
    config: MonitorConfig,
    summary: RunSummary,
}

impl<K: RecordSink> Monitor<K> {
    /// Creates a monitor over an already built process cache.
    #[must_use]
    pub fn new(cache: Arc<ProcessCache>, sink: K, config: MonitorConfig) -> Self {
        Self {
            cache,
            sink,
            config,
            summary: RunSummary::default(),
        }
    }

    /// Counters accumulated so far.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// Processes one event. Returns whether a record was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink rejects the record.
    pub fn dispatch(&mut self, event: &RawTraceEvent) -> Result<bool> {
        self.summary.events += 1;
        let kind = classify(event);
        let name = resolve(event, &self.cache);
        let Some(record) = format(event, kind, &name) else {
            self.summary.filtered += 1;
            tracing::trace!(pid = event.pid, "filtered unclassified event");
            return Ok(false);
        };
        let line = match self.config.format {
            OutputFormat::Text => record.render_text(),
            OutputFormat::Json => record.render_json()?,
        };
        self.sink.write_line(&line)?;
        self.summary.emitted += 1;
        Ok(true)
    }

    /// Runs until the source ends or `cancel` fires.
    ///
    /// Starts the source, writes the header, pumps events, then stops the
    /// source and closes the sink whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns a startup error if the configuration is invalid or the
    /// source cannot start, and a runtime error if the source breaks down
    /// or the sink fails.
    pub fn run(
        &mut self,
        source: &mut dyn TraceSource,
        cancel: &CancelToken,
    ) -> Result<RunSummary> {
        self.config.validate()?;
        source.start()?;
        tracing::info!(
            source = source.name(),
            processes = self.cache.len(),
            "dispatch started"
        );

        let pumped = self.pump(source, cancel);
        source.stop();
        let closed = self.sink.close();

        tracing::info!(
            events = self.summary.events,
            emitted = self.summary.emitted,
            filtered = self.summary.filtered,
            cancelled = cancel.is_cancelled(),
            "dispatch finished"
        );
        pumped?;
        closed?;
        Ok(self.summary)
    }

    fn pump(&mut self, source: &mut dyn TraceSource, cancel: &CancelToken) -> Result<()> {
        if self.config.header && self.config.format == OutputFormat::Text {
            self.sink.write_line(HEADER_LINE)?;
        }
        while !cancel.is_cancelled() {
            let Some(event) = source.next_event(cancel)? else {
                break;
            };
            let _ = self.dispatch(&event)?;
        }
        Ok(())
    }
}

impl<K: RecordSink + Send + 'static> Monitor<K> {
    /// Moves the monitor onto a dedicated worker thread.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn<T>(
        mut self,
        mut source: T,
        cancel: CancelToken,
    ) -> Result<JoinHandle<Result<RunSummary>>>
    where
        T: TraceSource + 'static,
    {
        std::thread::Builder::new()
            .name(DISPATCH_THREAD_NAME.into())
            .spawn(move || self.run(&mut source, &cancel))
            .map_err(|e| NetwatchError::TraceSession {
                message: format!("cannot spawn dispatch worker: {e}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use netwatch_common::types::ProcessInfo;
    use netwatch_trace::channel::channel;
    use netwatch_trace::event::{
        DnsClientEvent, EventTimestamp, IpVersion, KernelNetEvent, NetOp, TracePayload, Transport,
    };

    use super::*;
    use crate::sink::{MemorySink, WriterSink};

    fn dns(event_id: u16, pid: u32) -> RawTraceEvent {
        RawTraceEvent::new(
            EventTimestamp::from_wall(Utc::now()),
            pid,
            TracePayload::DnsClient(DnsClientEvent { event_id }),
        )
        .with_message("q")
    }

    fn monitor(sink: MemorySink, config: MonitorConfig) -> Monitor<MemorySink> {
        let cache = ProcessCache::from_processes([ProcessInfo::new(1, "one.exe")]);
        Monitor::new(Arc::new(cache), sink, config)
    }

    struct FailingStart;

    impl TraceSource for FailingStart {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn start(&mut self) -> Result<()> {
            Err(NetwatchError::TraceSession {
                message: "access denied".into(),
            })
        }

        fn next_event(&mut self, _cancel: &CancelToken) -> Result<Option<RawTraceEvent>> {
            Ok(None)
        }
    }

    struct BrokenPipe;

    impl std::io::Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Replays queued events and remembers whether it was stopped.
    struct Recorded {
        events: Vec<RawTraceEvent>,
        stopped: bool,
    }

    impl TraceSource for Recorded {
        fn name(&self) -> &'static str {
            "recorded"
        }

        fn next_event(&mut self, _cancel: &CancelToken) -> Result<Option<RawTraceEvent>> {
            Ok(self.events.pop())
        }

        fn stop(&mut self) {
            self.stopped = true;
        }
    }

    #[test]
    fn header_precedes_records() {
        let sink = MemorySink::new();
        let (tx, mut source) = channel(4);
        tx.send(dns(3006, 1)).expect("send");
        drop(tx);

        let summary = monitor(sink.clone(), MonitorConfig::default())
            .run(&mut source, &CancelToken::new())
            .expect("run");

        let lines = sink.lines();
        assert_eq!(lines[0], HEADER_LINE);
        assert!(lines[1].ends_with("DNS EventID(3006) q"));
        assert_eq!(summary.emitted, 1);
        assert!(sink.is_closed());
    }

    #[test]
    fn unclassified_events_are_counted_not_written() {
        let sink = MemorySink::new();
        let config = MonitorConfig {
            header: false,
            ..MonitorConfig::default()
        };
        let mut monitor = monitor(sink.clone(), config);
        assert!(!monitor.dispatch(&dns(9999, 1)).expect("dispatch"));
        let udp_connect = RawTraceEvent::new(
            EventTimestamp::from_wall(Utc::now()),
            1,
            TracePayload::KernelNetwork(KernelNetEvent::new(
                Transport::Udp,
                NetOp::Connect,
                IpVersion::V4,
            )),
        );
        assert!(!monitor.dispatch(&udp_connect).expect("dispatch"));
        assert!(sink.lines().is_empty());
        assert_eq!(
            monitor.summary(),
            RunSummary {
                events: 2,
                emitted: 0,
                filtered: 2
            }
        );
    }

    #[test]
    fn json_format_skips_header() {
        let sink = MemorySink::new();
        let config = MonitorConfig {
            format: OutputFormat::Json,
            ..MonitorConfig::default()
        };
        let (tx, mut source) = channel(4);
        tx.send(dns(3018, 1)).expect("send");
        drop(tx);
        let _ = monitor(sink.clone(), config)
            .run(&mut source, &CancelToken::new())
            .expect("run");
        let lines = sink.lines();
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(&lines[0]).expect("json");
        assert_eq!(value["kind"], "DnsCacheEvent");
        assert_eq!(value["message"], "q one.exe");
    }

    #[test]
    fn source_start_failure_is_a_startup_error() {
        let sink = MemorySink::new();
        let err = monitor(sink.clone(), MonitorConfig::default())
            .run(&mut FailingStart, &CancelToken::new())
            .unwrap_err();
        assert!(err.is_startup());
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn broken_output_is_a_runtime_error_and_stops_the_source() {
        let config = MonitorConfig {
            header: false,
            ..MonitorConfig::default()
        };
        let cache = ProcessCache::from_processes([ProcessInfo::new(1, "one.exe")]);
        let mut monitor = Monitor::new(Arc::new(cache), WriterSink::new(BrokenPipe), config);
        let mut source = Recorded {
            events: vec![dns(3006, 1), dns(3008, 1)],
            stopped: false,
        };

        let err = monitor.run(&mut source, &CancelToken::new()).unwrap_err();

        assert!(matches!(err, NetwatchError::Sink { .. }));
        assert!(!err.is_startup());
        assert!(source.stopped);
        assert_eq!(monitor.summary().events, 1);
        assert_eq!(monitor.summary().emitted, 0);
    }

    #[test]
    fn invalid_config_is_rejected_before_start() {
        let config = MonitorConfig {
            channel_capacity: 0,
            ..MonitorConfig::default()
        };
        let err = monitor(MemorySink::new(), config)
            .run(&mut FailingStart, &CancelToken::new())
            .unwrap_err();
        assert!(matches!(err, NetwatchError::Config { .. }));
    }

    #[test]
    fn cancelled_worker_exits_cleanly() {
        let sink = MemorySink::new();
        let (tx, source) = channel(4);
        let cancel = CancelToken::new();
        let handle = monitor(sink.clone(), MonitorConfig::default())
            .spawn(source, cancel.clone())
            .expect("spawn");
        tx.send(dns(3008, 1)).expect("send");
        while sink.lines().len() < 2 {
            std::thread::yield_now();
        }
        cancel.cancel();
        let summary = handle.join().expect("join").expect("run");
        assert_eq!(summary.emitted, 1);
        assert!(sink.is_closed());
    }
}
