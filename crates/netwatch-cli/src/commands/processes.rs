//! `netwatch processes`: Show the startup process snapshot.

use std::io::Write;

use clap::Args;
use netwatch_core::process_cache::{ProcessEnumerator, SystemProcesses};

use crate::output::process_row;

/// Arguments for the `processes` command.
#[derive(Args, Debug)]
pub struct ProcessesArgs {
    /// Only show processes whose name contains this text.
    #[arg(short, long)]
    pub filter: Option<String>,
}

/// Executes the `processes` command.
///
/// # Errors
///
/// Returns an error if the process table cannot be read (only when
/// `strict` is set) or stdout is closed.
pub fn execute(args: &ProcessesArgs, strict: bool) -> anyhow::Result<()> {
    let mut processes = match SystemProcesses.snapshot() {
        Ok(processes) => processes,
        Err(e) if !strict => {
            tracing::warn!(error = %e, "process snapshot unavailable");
            Vec::new()
        }
        Err(e) => return Err(e.into()),
    };
    processes.sort_by_key(|p| p.pid);

    let mut out = std::io::stdout().lock();
    writeln!(out, "{:<8} NAME", "PID")?;
    for p in processes
        .iter()
        .filter(|p| args.filter.as_deref().is_none_or(|f| p.name.contains(f)))
    {
        writeln!(out, "{}", process_row(p.pid, &p.name))?;
    }
    Ok(())
}
