//! refrain - Two-pass live speech transcription.
//!
//! Streams draft text with a fast model, then refines each transcript
//! entry in the background with a more accurate one.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
#[cfg(feature = "cli")]
pub mod output;
pub mod pipeline;
pub mod session;
pub mod stt;

// L4 composition root - needs everything
#[cfg(feature = "cli")]
pub mod app;

// Core traits (source → passes → session)
pub use audio::source::{AudioSource, MockAudioSource};
pub use pipeline::observer::TranscriptObserver;
pub use stt::engine::SpeechEngine;

// Pipeline
pub use pipeline::orchestrator::{Pipeline, PipelineConfig, PipelineHandle, PipelineState};

// Session
pub use session::store::{EntryStatus, SessionStore, TranscriptEntry};

// Error handling
pub use error::{RefrainError, Result};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.1+abc1234"` when git hash is available, `"0.3.1"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
