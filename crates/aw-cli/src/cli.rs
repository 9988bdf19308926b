//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Presence watcher.
///
/// Tracks when one account comes online and goes offline, keeps cumulative
/// online and offline time per session, and announces each change.
#[derive(Debug, Parser)]
#[command(name = "aw", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Watch a gateway event feed and record presence transitions.
    Watch {
        /// JSONL event feed to read, or `-` for stdin.
        #[arg(long, default_value = "-")]
        events: PathBuf,
    },

    /// Show the latest session and accumulated totals.
    Status,

    /// List recorded sessions, newest first.
    Sessions {
        /// Maximum number of sessions to show.
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
}
