//! CLI command definitions and dispatch.

pub mod processes;
pub mod watch;

use clap::{Parser, Subcommand};

/// netwatch: live TCP/UDP/DNS activity with owning process names.
#[derive(Parser, Debug)]
#[command(name = "netwatch", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Abort startup if the process snapshot fails instead of continuing
    /// with an empty cache.
    #[arg(long, global = true, env = "NETWATCH_STRICT_PROCESSES")]
    pub strict_processes: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream records for trace events until interrupted or the input ends.
    Watch(watch::WatchArgs),
    /// Print the process snapshot used for name resolution.
    Processes(processes::ProcessesArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Watch(args) => watch::execute(args, cli.strict_processes),
        Command::Processes(args) => processes::execute(&args, cli.strict_processes),
    }
}
