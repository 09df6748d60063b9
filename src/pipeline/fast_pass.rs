//! Fast-pass station: low-latency draft transcription.
//!
//! Consumes audio chunks, runs the fast engine, feeds the output through
//! the sentence segmenter, and appends one Streaming entry per completed
//! sentence. Every successfully transcribed chunk then becomes exactly one
//! RefineJob (even when no sentence completed) so the refine pass covers
//! all audio exactly once.

use crate::pipeline::error::StationError;
use crate::pipeline::observer::TranscriptObserver;
use crate::pipeline::segmenter::SentenceSegmenter;
use crate::pipeline::station::Station;
use crate::pipeline::types::{AudioChunk, RefineJob};
use crate::session::SessionStore;
use crate::stt::engine::SpeechEngine;
use std::sync::Arc;

/// Strips engine non-speech annotations in any language.
///
/// Whisper-style engines wrap annotations in `[…]`, `(…)`, or `*…*`; these
/// never contain real speech. Unmatched opening delimiters pass through
/// unchanged.
pub(crate) fn strip_annotations(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        let close = match ch {
            '[' => Some(']'),
            '(' => Some(')'),
            '*' => Some('*'),
            _ => None,
        };

        match close {
            Some(close) => {
                // Scan ahead for the matching closer
                let mut j = i + 1;
                while j < chars.len() && chars[j] != close {
                    j += 1;
                }
                if j < chars.len() {
                    // Annotation found: skip it wholesale
                    i = j + 1;
                } else {
                    // Unmatched opener: keep the rest verbatim
                    result.extend(&chars[i..]);
                    break;
                }
            }
            None => {
                result.push(ch);
                i += 1;
            }
        }
    }

    // Collapse runs of spaces left behind by removed annotations
    let mut collapsed = String::with_capacity(result.len());
    let mut prev_space = false;
    for c in result.chars() {
        if c == ' ' {
            if prev_space {
                continue;
            }
            prev_space = true;
        } else {
            prev_space = false;
        }
        collapsed.push(c);
    }
    collapsed.trim().to_string()
}

/// Station that drafts transcript entries from audio chunks.
pub struct FastPassStation {
    engine: Arc<dyn SpeechEngine>,
    store: Arc<SessionStore>,
    observer: Arc<dyn TranscriptObserver>,
    segmenter: SentenceSegmenter,
}

impl FastPassStation {
    /// Creates a fast-pass station.
    pub fn new(
        engine: Arc<dyn SpeechEngine>,
        store: Arc<SessionStore>,
        observer: Arc<dyn TranscriptObserver>,
        segmenter: SentenceSegmenter,
    ) -> Self {
        Self {
            engine,
            store,
            observer,
            segmenter,
        }
    }
}

impl Station for FastPassStation {
    type Input = AudioChunk;
    type Output = RefineJob;

    fn name(&self) -> &'static str {
        "fast-pass"
    }

    fn process(&mut self, chunk: AudioChunk) -> Result<Option<RefineJob>, StationError> {
        let raw = self
            .engine
            .transcribe(&chunk.samples, None)
            .map_err(|e| StationError::Recoverable(format!("Fast transcription failed: {}", e)))?;

        let draft = strip_annotations(&raw);

        let mut last_id = None;
        if !draft.is_empty() {
            for sentence in self.segmenter.feed(&draft) {
                let entry = self.store.append(&sentence);
                self.observer.on_transcript(&entry);
                last_id = Some(entry.id);
            }
        }

        // One refine job per chunk, no matter how segmentation went. A
        // chunk without a completed sentence gets a reserved id that the
        // refine pass fills in.
        let id = last_id.unwrap_or_else(|| self.store.reserve_id());
        Ok(Some(RefineJob::new(id, chunk, draft)))
    }

    fn shutdown(&mut self) {
        // Residual buffered text becomes the final streaming entry
        if let Some(residual) = self.segmenter.flush() {
            let entry = self.store.append(&residual);
            self.observer.on_transcript(&entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::observer::CollectorObserver;
    use crate::session::EntryStatus;
    use crate::stt::engine::MockEngine;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn chunk(sequence: u64) -> AudioChunk {
        AudioChunk::new(sequence, vec![0.1f32; 160], SystemTime::now())
    }

    fn station_with(
        engine: MockEngine,
    ) -> (FastPassStation, Arc<SessionStore>, Arc<CollectorObserver>, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SessionStore::create("fast-test", dir.path()).unwrap());
        let observer = Arc::new(CollectorObserver::new());
        let station = FastPassStation::new(
            Arc::new(engine),
            Arc::clone(&store),
            observer.clone() as Arc<dyn TranscriptObserver>,
            SentenceSegmenter::new(),
        );
        (station, store, observer, dir)
    }

    #[test]
    fn test_complete_sentence_appends_entry_and_job() {
        let (mut station, store, observer, _dir) =
            station_with(MockEngine::new("fast").with_response("This is a full sentence."));

        let job = station.process(chunk(0)).unwrap().unwrap();

        assert_eq!(store.len(), 1);
        let entry = &store.entries()[0];
        assert_eq!(entry.text, "This is a full sentence.");
        assert_eq!(entry.status, EntryStatus::Streaming);

        assert_eq!(job.id, entry.id);
        assert_eq!(job.draft_text, "This is a full sentence.");
        assert_eq!(job.chunk.sequence, 0);

        assert_eq!(observer.entries().len(), 1);
    }

    #[test]
    fn test_partial_text_still_produces_job() {
        let (mut station, store, observer, _dir) =
            station_with(MockEngine::new("fast").with_response("no terminator here"));

        let job = station.process(chunk(0)).unwrap().unwrap();

        // No entry yet, but the job carries the partial draft and a
        // reserved id
        assert_eq!(store.len(), 0);
        assert_eq!(job.draft_text, "no terminator here");
        assert_eq!(job.id, 0);
        assert_eq!(store.next_id(), 1);
        assert!(observer.entries().is_empty());
    }

    #[test]
    fn test_sentence_spanning_chunks() {
        let (mut station, store, _observer, _dir) = station_with(
            MockEngine::new("fast").with_responses(&["the lecture began with", "a definition."]),
        );

        let job1 = station.process(chunk(0)).unwrap().unwrap();
        assert_eq!(store.len(), 0);
        assert_eq!(job1.id, 0); // reserved

        let job2 = station.process(chunk(1)).unwrap().unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.entries()[0].text,
            "the lecture began with a definition."
        );
        // The completed sentence took id 1; the job points at it
        assert_eq!(job2.id, 1);
    }

    #[test]
    fn test_multiple_sentences_in_one_chunk() {
        let (mut station, store, _observer, _dir) = station_with(
            MockEngine::new("fast").with_response("First idea stated. Second idea follows."),
        );

        let job = station.process(chunk(0)).unwrap().unwrap();

        assert_eq!(store.len(), 2);
        // Job refines the last entry appended from this chunk
        assert_eq!(job.id, 1);
    }

    #[test]
    fn test_engine_failure_is_recoverable_and_produces_no_job() {
        let (mut station, store, _observer, _dir) =
            station_with(MockEngine::new("fast").with_failure());

        let result = station.process(chunk(0));
        match result {
            Err(StationError::Recoverable(msg)) => {
                assert!(msg.contains("Fast transcription failed"));
            }
            _ => panic!("Expected Recoverable error"),
        }
        assert_eq!(store.len(), 0);
        assert_eq!(store.next_id(), 0, "failed chunk must not consume an id");
    }

    #[test]
    fn test_annotations_are_stripped_before_segmentation() {
        let (mut station, store, _observer, _dir) = station_with(
            MockEngine::new("fast").with_response("[MUSIC] The topic today is entropy."),
        );

        station.process(chunk(0)).unwrap();

        assert_eq!(store.entries()[0].text, "The topic today is entropy.");
    }

    #[test]
    fn test_annotation_only_output_reserves_id() {
        let (mut station, store, _observer, _dir) =
            station_with(MockEngine::new("fast").with_response("[BLANK_AUDIO]"));

        let job = station.process(chunk(0)).unwrap().unwrap();
        assert!(job.draft_text.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.next_id(), 1);
    }

    #[test]
    fn test_shutdown_flushes_residual_as_final_entry() {
        let (mut station, store, observer, _dir) =
            station_with(MockEngine::new("fast").with_response("trailing words without an end"));

        station.process(chunk(0)).unwrap();
        assert_eq!(store.len(), 0);

        station.shutdown();
        assert_eq!(store.len(), 1);
        assert_eq!(store.entries()[0].text, "trailing words without an end");
        assert_eq!(store.entries()[0].status, EntryStatus::Streaming);
        assert_eq!(observer.entries().len(), 1);
    }

    #[test]
    fn test_shutdown_with_empty_buffer_appends_nothing() {
        let (mut station, store, _observer, _dir) =
            station_with(MockEngine::new("fast").with_response("A complete sentence here."));

        station.process(chunk(0)).unwrap();
        station.shutdown();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_ids_strictly_increase_across_chunks() {
        let (mut station, store, _observer, _dir) = station_with(
            MockEngine::new("fast").with_responses(&[
                "Sentence number one lands.",
                "Sentence number two lands.",
                "Sentence number three lands.",
            ]),
        );

        let ids: Vec<u64> = (0..3)
            .map(|i| station.process(chunk(i)).unwrap().unwrap().id)
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);

        let entries = store.entries();
        for pair in entries.windows(2) {
            assert!(pair[0].id < pair[1].id);
        }
    }

    // ── annotation stripping ─────────────────────────────────────────────

    #[test]
    fn test_strip_annotations_brackets() {
        assert_eq!(strip_annotations("[BLANK_AUDIO]"), "");
        assert_eq!(strip_annotations("Hello [MUSIC] world"), "Hello world");
    }

    #[test]
    fn test_strip_annotations_all_delimiters() {
        assert_eq!(
            strip_annotations("Start *tapping* middle (inaudible) end [noise]"),
            "Start middle end"
        );
    }

    #[test]
    fn test_strip_annotations_preserves_plain_text() {
        assert_eq!(
            strip_annotations("This is normal text"),
            "This is normal text"
        );
    }

    #[test]
    fn test_strip_annotations_unmatched_opener_passes_through() {
        assert_eq!(strip_annotations("price is 5["), "price is 5[");
        assert_eq!(strip_annotations("note (incomplete"), "note (incomplete");
        assert_eq!(
            strip_annotations("a * single asterisk"),
            "a * single asterisk"
        );
    }

    #[test]
    fn test_strip_annotations_collapses_spaces() {
        assert_eq!(strip_annotations("word [x] [y] [z] end"), "word end");
    }

    #[test]
    fn test_strip_annotations_empty_pairs() {
        assert_eq!(strip_annotations("text [] more"), "text more");
        assert_eq!(strip_annotations("text ** more"), "text more");
    }
}
