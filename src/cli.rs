//! Command-line interface for avatext
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Speech-synchronized transcript reveal
#[derive(Parser, Debug)]
#[command(
    name = "avatext",
    version,
    about = "Speech-synchronized transcript reveal"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded signal script (JSON Lines)
    Replay {
        /// Script file, one {"at_ms": .., "signal": {..}} per line
        file: PathBuf,

        /// Play on real time instead of simulating
        #[arg(long)]
        realtime: bool,

        /// Print display updates as JSON lines
        #[arg(long)]
        json: bool,

        /// Override the render delay. Examples: 500, 250ms, 1s
        #[arg(long, value_name = "DURATION", value_parser = parse_delay_ms)]
        render_delay: Option<u64>,
    },

    /// Print the playback duration of a base64 audio chunk
    Duration {
        /// Base64-encoded PCM payload
        payload: String,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the default configuration file path
    Path,
}

/// Parse a delay into milliseconds.
///
/// Bare numbers are milliseconds; anything else goes through `humantime`
/// (`250ms`, `1s`, `1s500ms`).
fn parse_delay_ms(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(ms);
    }
    humantime::parse_duration(s)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .map_err(|e| e.to_string())
}
