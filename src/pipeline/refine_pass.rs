//! Refine-pass station: high-accuracy replacement of draft entries.
//!
//! Consumes RefineJobs, re-transcribes the chunk with the refine engine
//! (draft text as contextual hint), and upgrades the matching entry to
//! Refined. Refinement is best-effort: a failed engine call leaves the
//! Streaming entry untouched and never stalls the stream.

use crate::pipeline::error::StationError;
use crate::pipeline::fast_pass::strip_annotations;
use crate::pipeline::observer::TranscriptObserver;
use crate::pipeline::station::Station;
use crate::pipeline::types::RefineJob;
use crate::session::{EntryStatus, SessionStore};
use crate::stt::engine::SpeechEngine;
use std::sync::Arc;

/// Station that replaces draft entries with refined transcriptions.
pub struct RefinePassStation {
    engine: Arc<dyn SpeechEngine>,
    store: Arc<SessionStore>,
    observer: Arc<dyn TranscriptObserver>,
}

impl RefinePassStation {
    /// Creates a refine-pass station.
    pub fn new(
        engine: Arc<dyn SpeechEngine>,
        store: Arc<SessionStore>,
        observer: Arc<dyn TranscriptObserver>,
    ) -> Self {
        Self {
            engine,
            store,
            observer,
        }
    }
}

impl Station for RefinePassStation {
    type Input = RefineJob;
    type Output = ();

    fn name(&self) -> &'static str {
        "refine-pass"
    }

    fn process(&mut self, job: RefineJob) -> Result<Option<()>, StationError> {
        let hint = if job.draft_text.is_empty() {
            None
        } else {
            Some(job.draft_text.as_str())
        };

        let raw = self
            .engine
            .transcribe(&job.chunk.samples, hint)
            .map_err(|e| {
                StationError::Recoverable(format!(
                    "Refinement of entry {} failed: {}",
                    job.id, e
                ))
            })?;

        let refined = strip_annotations(&raw);
        if refined.is_empty() {
            // Nothing better than the draft; keep the Streaming entry
            return Ok(None);
        }

        // Out-of-order completion is fine: the update is keyed by id, so a
        // slow earlier job can land after a faster later one. Creates the
        // entry if the fast pass only reserved the id.
        let entry = self.store.update(job.id, &refined, EntryStatus::Refined);
        self.observer.on_transcript(&entry);
        Ok(None)
    }
}
