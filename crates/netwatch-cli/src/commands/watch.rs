//! `netwatch watch`: Stream classified network activity.
//!
//! The capture reader runs on its own thread and pushes events into the
//! dispatch channel, the same way a live session callback would.

use std::sync::Arc;
use std::thread::JoinHandle;

use clap::{Args, ValueEnum};
use netwatch_common::config::{MonitorConfig, OutputFormat};
use netwatch_common::constants::DEFAULT_CHANNEL_CAPACITY;
use netwatch_common::error::Result;
use netwatch_core::dispatch::Monitor;
use netwatch_core::process_cache::{ProcessCache, SystemProcesses};
use netwatch_core::sink::WriterSink;
use netwatch_trace::channel::{EventSender, channel};
use netwatch_trace::replay::ReplaySource;
use netwatch_trace::source::{CancelToken, TraceSource};

/// Record rendering selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, Default)]
pub enum FormatArg {
    /// Tab-delimited lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Text => Self::Text,
            FormatArg::Json => Self::Json,
        }
    }
}

/// Arguments for the `watch` command.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// NDJSON trace capture to read, or `-` for standard input.
    #[arg(default_value = "-")]
    pub input: String,

    /// Output rendering.
    #[arg(short, long, value_enum, default_value_t = FormatArg::Text, env = "NETWATCH_FORMAT")]
    pub format: FormatArg,

    /// Do not print the column header.
    #[arg(long)]
    pub no_header: bool,

    /// Events buffered between the trace reader and the dispatcher.
    #[arg(long, default_value_t = DEFAULT_CHANNEL_CAPACITY)]
    pub channel_capacity: usize,
}

impl WatchArgs {
    fn config(&self, strict: bool) -> MonitorConfig {
        MonitorConfig {
            header: !self.no_header,
            format: self.format.into(),
            strict_process_snapshot: strict,
            channel_capacity: self.channel_capacity,
        }
    }
}

/// Executes the `watch` command.
///
/// Takes the process snapshot, opens the trace input, and streams records
/// to stdout until Ctrl+C or the end of the input.
///
/// # Errors
///
/// Returns a startup error if the snapshot (in strict mode), the
/// configuration, or the trace input fails, and a runtime error if stdout
/// breaks.
pub fn execute(args: WatchArgs, strict: bool) -> anyhow::Result<()> {
    let config = args.config(strict);
    config.validate()?;

    let cache = Arc::new(ProcessCache::for_policy(
        &SystemProcesses,
        config.strict_process_snapshot,
    )?);

    let mut capture = if args.input == "-" {
        ReplaySource::from_stdin()
    } else {
        ReplaySource::from_path(&args.input)
    };
    capture.start()?;

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || {
        tracing::info!("interrupt received, shutting down");
        on_interrupt.cancel();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {e}"))?;

    let (sender, source) = channel(config.channel_capacity);
    let reader = spawn_reader(capture, sender, cancel.clone())?;

    let sink = WriterSink::new(std::io::stdout());
    let worker = Monitor::new(cache, sink, config).spawn(source, cancel.clone())?;
    let summary = worker
        .join()
        .map_err(|_| anyhow::anyhow!("dispatch worker panicked"))??;

    // An interrupted reader may still be blocked on stdin; only a reader
    // that reached the end of its input is joined.
    if !cancel.is_cancelled() {
        reader
            .join()
            .map_err(|_| anyhow::anyhow!("trace reader panicked"))??;
    }
    cancel.cancel();

    tracing::info!(
        events = summary.events,
        emitted = summary.emitted,
        filtered = summary.filtered,
        "watch finished"
    );
    Ok(())
}

/// Forwards captured events into the dispatch channel.
///
/// Dropping the sender on return ends the worker's stream.
fn spawn_reader(
    mut capture: ReplaySource,
    sender: EventSender,
    cancel: CancelToken,
) -> anyhow::Result<JoinHandle<Result<()>>> {
    let handle = std::thread::Builder::new()
        .name("netwatch-reader".into())
        .spawn(move || {
            let forwarded = forward(&mut capture, &sender, &cancel);
            capture.stop();
            if let Err(e) = &forwarded {
                tracing::error!(error = %e, "trace input failed");
            }
            forwarded
        })?;
    Ok(handle)
}

fn forward(capture: &mut ReplaySource, sender: &EventSender, cancel: &CancelToken) -> Result<()> {
    while let Some(event) = capture.next_event(cancel)? {
        if sender.send(event).is_err() {
            // worker is gone; its own error is reported instead
            break;
        }
    }
    Ok(())
}
