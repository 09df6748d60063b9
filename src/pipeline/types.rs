//! Data types flowing between pipeline stages.

use std::time::SystemTime;

/// A fixed-duration slice of the audio stream, the unit of work for both
/// passes.
///
/// Chunks are immutable after creation and move through exactly one queue
/// at a time; the fast pass hands the same chunk on to the refine queue
/// inside its `RefineJob`, so no stage ever aliases another's samples.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Monotonically increasing id assigned when the chunk was cut.
    pub sequence: u64,
    /// Mono f32 samples at the pipeline sample rate.
    pub samples: Vec<f32>,
    /// Wall-clock time the chunk was cut.
    pub captured_at: SystemTime,
}

impl AudioChunk {
    /// Creates a new audio chunk.
    pub fn new(sequence: u64, samples: Vec<f32>, captured_at: SystemTime) -> Self {
        Self {
            sequence,
            samples,
            captured_at,
        }
    }

    /// Duration of the chunk in milliseconds at the given sample rate.
    pub fn duration_ms(&self, sample_rate: u32) -> u32 {
        (self.samples.len() as u64 * 1000 / sample_rate as u64) as u32
    }
}

/// A refinement work item: one chunk plus the draft the fast pass produced
/// for it.
#[derive(Debug, Clone)]
pub struct RefineJob {
    /// Transcript entry id this job refines.
    pub id: u64,
    /// The original audio, re-transcribed by the refine engine.
    pub chunk: AudioChunk,
    /// Draft text used as a contextual hint. May be a partial,
    /// non-terminated line; empty when the fast pass heard nothing usable.
    pub draft_text: String,
}

impl RefineJob {
    /// Creates a new refine job.
    pub fn new(id: u64, chunk: AudioChunk, draft_text: String) -> Self {
        Self {
            id,
            chunk,
            draft_text,
        }
    }
}
