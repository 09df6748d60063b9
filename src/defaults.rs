//! Default configuration constants for refrain.
//!
//! Shared constants used across configuration types to keep the pipeline,
//! CLI, and config file defaults consistent.

use std::time::Duration;

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency for voice applications.
pub const SAMPLE_RATE: u32 = 16000;

/// Default chunk duration in seconds.
///
/// Each chunk is transcribed as a unit by both passes. Shorter chunks lower
/// the latency of the streaming pass; longer chunks give the engines more
/// sentence context and better throughput. 5s is the middle of the useful
/// 3-15s range for lecture speech.
pub const CHUNK_SECS: u32 = 5;

/// Smallest accepted chunk duration in seconds.
pub const MIN_CHUNK_SECS: u32 = 1;

/// Largest accepted chunk duration in seconds.
pub const MAX_CHUNK_SECS: u32 = 60;

/// Minimum length (in characters) for a segmented sentence to be kept.
///
/// Fragments at or below this length ("Ok.", "Uh.") are almost always
/// engine noise rather than lecture content and are dropped.
pub const MIN_SENTENCE_CHARS: usize = 10;

/// Capacity of the capture → fast-pass chunk queue.
///
/// Kept deliberately small: when the fast pass falls behind real time the
/// oldest chunk is dropped rather than blocking capture, which would
/// overflow the device buffer and corrupt timing.
pub const CAPTURE_QUEUE_CAPACITY: usize = 4;

/// Capacity of the fast-pass → refine-pass job queue.
///
/// Refine is allowed to lag far behind real time; each job carries its own
/// copy of the audio, so a large bound only costs memory.
pub const REFINE_QUEUE_CAPACITY: usize = 64;

/// How long workers block on an empty queue before re-checking the running
/// flag. Bounds shutdown latency without busy-spinning.
pub const POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// Default interval between periodic session snapshots.
pub const SNAPSHOT_SECS: u64 = 30;

/// Consecutive audio read failures tolerated before capture gives up and
/// the pipeline starts draining.
pub const MAX_CAPTURE_ERRORS: u32 = 10;

/// Default fast (streaming) model name.
pub const FAST_MODEL: &str = "tiny.en";

/// Default refine model name.
pub const REFINE_MODEL: &str = "base.en";

/// Default language code for transcription.
///
/// "auto" lets the engine detect the spoken language; set a specific code
/// (e.g. "en", "de") to force one.
pub const DEFAULT_LANGUAGE: &str = "auto";

/// Language value that triggers automatic language detection.
pub const AUTO_LANGUAGE: &str = "auto";

/// File extension for saved session transcripts.
pub const SESSION_EXTENSION: &str = "session";

/// Report the GPU backend compiled into this build.
///
/// Returns a human-readable name based on the compile-time feature flags.
/// Only one GPU backend can be active at a time; if none is enabled, returns "CPU".
pub fn gpu_backend() -> &'static str {
    if cfg!(feature = "cuda") {
        "CUDA"
    } else if cfg!(feature = "vulkan") {
        "Vulkan"
    } else if cfg!(feature = "openblas") {
        "OpenBLAS"
    } else {
        "CPU"
    }
}
