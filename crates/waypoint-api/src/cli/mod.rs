//! CLI definitions for the `waypoint` binary.

pub mod thread;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Conversational plan-execute engine for token routing.
#[derive(Parser)]
#[command(name = "waypoint", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Also export spans to stdout through OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    /// Data directory holding config.toml and waypoint.db.
    #[arg(long, global = true, env = "WAYPOINT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the streaming chat API.
    Serve {
        /// Bind address (defaults to `[server] host`).
        #[arg(long)]
        host: Option<String>,

        /// Port (defaults to `[server] port`).
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Print a thread's persisted conversation state.
    ShowThread {
        /// Thread identifier.
        id: String,

        /// Print the raw state as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Delete a thread's persisted state.
    ResetThread {
        /// Thread identifier.
        id: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Default log filter for the given verbosity flags.
pub fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "info,waypoint=debug",
        _ => "trace",
    }
}
