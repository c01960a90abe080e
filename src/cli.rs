//! Command-line interface for signstream
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Real-time sign language to sentence streaming server
#[derive(Parser, Debug)]
#[command(
    name = "signstream",
    version,
    about = "Real-time sign language to sentence streaming server"
)]
pub struct Cli {
    /// Subcommand to execute (default: serve)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Parse a pause duration into milliseconds.
///
/// Supports any duration format accepted by `humantime` (`2s`, `1500ms`,
/// `1s500ms`); a bare number is taken as milliseconds.
fn parse_pause_ms(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u64>() {
        return Ok(ms);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_millis() as u64)
        .map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP/WebSocket server
    Serve(ServeArgs),

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print the loaded sign label table
    Labels,

    /// Resolve a phrase to its sign asset
    Assets {
        /// Phrase to look up
        text: String,
    },
}

/// Server overrides
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ServeArgs {
    /// Address to bind (default: 0.0.0.0)
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Port to listen on (default: 8000)
    #[arg(long, short = 'p', value_name = "PORT")]
    pub port: Option<u16>,

    /// Sentence pause threshold. Examples: 2s, 1500ms
    #[arg(long, value_name = "DURATION", value_parser = parse_pause_ms)]
    pub pause: Option<u64>,

    /// Disable speech synthesis
    #[arg(long)]
    pub no_tts: bool,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the default configuration file path
    Path,
}
