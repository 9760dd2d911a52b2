//! Exit status mapping and output helpers for CLI commands.

use std::process::ExitCode;

use netwatch_common::error::NetwatchError;

/// Exit status for failures before any event was processed.
pub const EXIT_STARTUP_FAILURE: u8 = 2;

/// Exit status for failures during the run.
pub const EXIT_RUNTIME_FAILURE: u8 = 1;

/// Picks the exit status for a failed command.
///
/// Startup failures (process snapshot, trace session, configuration) are
/// reported apart from failures that interrupt a running stream.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    ExitCode::from(exit_status(err))
}

fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<NetwatchError>() {
        Some(e) if e.is_startup() => EXIT_STARTUP_FAILURE,
        _ => EXIT_RUNTIME_FAILURE,
    }
}

/// Formats a process table row.
#[must_use]
pub fn process_row(pid: u32, name: &str) -> String {
    format!("{pid:<8} {name}")
}
