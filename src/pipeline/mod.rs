//! Two-pass transcription pipeline.
//!
//! Each pass runs as a station on its own thread, connected by bounded
//! drop-oldest queues. The fast pass streams draft sentences into the
//! session store in near-real time; the refine pass follows behind,
//! replacing each entry with a higher-accuracy transcription.

pub mod error;
pub mod fast_pass;
pub mod observer;
pub mod orchestrator;
pub mod queue;
pub mod refine_pass;
pub mod segmenter;
pub mod station;
pub mod types;

pub use error::{ErrorReporter, LogReporter, StationError};
pub use fast_pass::FastPassStation;
pub use observer::{CollectorObserver, NullObserver, TranscriptObserver};
pub use orchestrator::{Pipeline, PipelineConfig, PipelineHandle, PipelineState};
pub use queue::ChunkQueue;
pub use refine_pass::RefinePassStation;
pub use segmenter::SentenceSegmenter;
pub use station::{Station, StationRunner};
pub use types::{AudioChunk, RefineJob};
