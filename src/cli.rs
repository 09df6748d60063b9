//! Command-line interface for refrain
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Two-pass live speech transcription
#[derive(Parser, Debug)]
#[command(name = "refrain", version, about = "Two-pass live speech transcription")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress status output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Transcribe a WAV file instead of the microphone
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Audio input device (e.g., pipewire)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Session name for saving and resuming (default: input file stem or a
    /// mic timestamp)
    #[arg(long, short = 's', value_name = "NAME")]
    pub session: Option<String>,

    /// Resume the named session, appending to its transcript
    #[arg(long, requires = "session")]
    pub resume: bool,

    /// Fast (streaming) model: short name or path to a ggml file
    #[arg(long, value_name = "MODEL")]
    pub fast_model: Option<String>,

    /// Refine model: short name or path to a ggml file
    #[arg(long, value_name = "MODEL")]
    pub refine_model: Option<String>,

    /// Language code for transcription (default: auto-detect)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Chunk duration. Examples: 3s, 5s, 15s
    #[arg(long, short = 'c', value_name = "DURATION", value_parser = parse_secs)]
    pub chunk_size: Option<u64>,

    /// Interval between periodic session snapshots. Examples: 30s, 2m
    #[arg(long, value_name = "DURATION", value_parser = parse_secs)]
    pub snapshot_interval: Option<u64>,
}

/// Parse a duration string into seconds.
///
/// Supports any duration format accepted by `humantime`: bare numbers
/// (seconds), single-unit (`30s`, `5m`), and compound (`1m30s`).
fn parse_secs(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<u64>() {
        return Ok(secs);
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs())
        .map_err(|e| e.to_string())
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,

    /// List saved sessions
    Sessions,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
