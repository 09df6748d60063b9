//! Incremental sentence segmentation of fast-pass output.
//!
//! Draft text arrives in chunk-sized fragments that rarely align with
//! sentence boundaries. The segmenter accumulates fragments in a buffer and
//! cuts complete sentences at terminal punctuation, leaving the unfinished
//! tail for the next feed.
//!
//! This is a deliberate scan-and-cut over `.`, `!`, `?`, not a
//! language-aware tokenizer. It favors under-splitting: an abbreviation may
//! end a "sentence" early, but the minimum-length filter discards most such
//! fragments as noise.

use crate::defaults;

/// Characters that terminate a sentence.
const TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Accumulates partial text and extracts complete sentences.
pub struct SentenceSegmenter {
    buffer: String,
    min_chars: usize,
}

impl SentenceSegmenter {
    /// Creates a segmenter with the default minimum sentence length.
    pub fn new() -> Self {
        Self::with_min_chars(defaults::MIN_SENTENCE_CHARS)
    }

    /// Creates a segmenter keeping only sentences longer than `min_chars`.
    pub fn with_min_chars(min_chars: usize) -> Self {
        Self {
            buffer: String::new(),
            min_chars,
        }
    }

    /// Appends partial text and returns any sentences completed by it.
    ///
    /// Fragments are joined with a single space. Sentences are returned in
    /// the order their terminators appear; candidates at or below the
    /// minimum length are dropped entirely (not retained in the buffer).
    pub fn feed(&mut self, partial: &str) -> Vec<String> {
        let partial = partial.trim();
        if partial.is_empty() {
            return Vec::new();
        }

        if !self.buffer.is_empty() {
            self.buffer.push(' ');
        }
        self.buffer.push_str(partial);

        self.extract()
    }

    /// Cuts every complete sentence currently in the buffer.
    fn extract(&mut self) -> Vec<String> {
        let mut sentences = Vec::new();

        while let Some(pos) = self.buffer.find(TERMINATORS) {
            // Terminators are ASCII, so pos + 1 is a char boundary
            let candidate = self.buffer[..=pos].trim().to_string();
            self.buffer = self.buffer[pos + 1..].trim_start().to_string();

            if candidate.chars().count() > self.min_chars {
                sentences.push(candidate);
            }
        }

        sentences
    }

    /// Takes whatever remains buffered, if it is long enough to matter.
    ///
    /// Called at shutdown so trailing speech without a final period still
    /// reaches the transcript.
    pub fn flush(&mut self) -> Option<String> {
        let residual = std::mem::take(&mut self.buffer);
        let residual = residual.trim();
        if residual.chars().count() > self.min_chars {
            Some(residual.to_string())
        } else {
            None
        }
    }

    /// Current unconsumed buffer contents.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }
}

impl Default for SentenceSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_sentence_is_emitted() {
        let mut segmenter = SentenceSegmenter::new();
        let sentences = segmenter.feed("Hello world.");
        assert_eq!(sentences, vec!["Hello world."]);
        assert!(segmenter.buffered().is_empty());
    }

    #[test]
    fn test_partial_text_stays_buffered() {
        let mut segmenter = SentenceSegmenter::new();
        assert!(segmenter.feed("This has no terminator").is_empty());
        assert_eq!(segmenter.buffered(), "This has no terminator");
    }

    #[test]
    fn test_sentence_built_across_feeds() {
        let mut segmenter = SentenceSegmenter::new();

        assert_eq!(segmenter.feed("Hello world."), vec!["Hello world."]);
        assert!(segmenter.feed(" This is fine").is_empty());
        assert_eq!(segmenter.feed(" too."), vec!["This is fine too."]);
        assert!(segmenter.buffered().is_empty());
    }

    #[test]
    fn test_multiple_sentences_in_one_feed() {
        let mut segmenter = SentenceSegmenter::new();
        let sentences = segmenter.feed("The first point stands. The second point follows!");
        assert_eq!(
            sentences,
            vec!["The first point stands.", "The second point follows!"]
        );
    }

    #[test]
    fn test_sentences_returned_in_scan_order() {
        let mut segmenter = SentenceSegmenter::new();
        let sentences = segmenter.feed("Is this a question? It surely seems so. What remains");
        assert_eq!(
            sentences,
            vec!["Is this a question?", "It surely seems so."]
        );
        assert_eq!(segmenter.buffered(), "What remains");
    }

    #[test]
    fn test_short_candidates_are_discarded() {
        let mut segmenter = SentenceSegmenter::new();
        // "Ok." is 3 chars of noise, not a sentence
        assert!(segmenter.feed("Ok.").is_empty());
        // And it must not linger in the buffer either
        assert!(segmenter.buffered().is_empty());
    }

    #[test]
    fn test_short_candidate_does_not_pollute_next_sentence() {
        let mut segmenter = SentenceSegmenter::new();
        assert!(segmenter.feed("Uh.").is_empty());
        let sentences = segmenter.feed("Now the actual sentence arrives.");
        assert_eq!(sentences, vec!["Now the actual sentence arrives."]);
    }

    #[test]
    fn test_exactly_min_length_is_discarded() {
        let mut segmenter = SentenceSegmenter::with_min_chars(10);
        // "123456789." is exactly 10 chars; the threshold is strict
        assert!(segmenter.feed("123456789.").is_empty());
        // One more character crosses it
        assert_eq!(segmenter.feed("1234567890."), vec!["1234567890."]);
    }

    #[test]
    fn test_fragments_joined_with_single_space() {
        let mut segmenter = SentenceSegmenter::new();
        segmenter.feed("first half");
        let sentences = segmenter.feed("second half.");
        assert_eq!(sentences, vec!["first half second half."]);
    }

    #[test]
    fn test_whitespace_only_feed_is_ignored() {
        let mut segmenter = SentenceSegmenter::new();
        segmenter.feed("pending text");
        assert!(segmenter.feed("   ").is_empty());
        assert_eq!(segmenter.buffered(), "pending text");
    }

    #[test]
    fn test_flush_returns_residual() {
        let mut segmenter = SentenceSegmenter::new();
        segmenter.feed("trailing words without a period");

        assert_eq!(
            segmenter.flush(),
            Some("trailing words without a period".to_string())
        );
        assert!(segmenter.buffered().is_empty());
    }

    #[test]
    fn test_flush_discards_trivial_residual() {
        let mut segmenter = SentenceSegmenter::new();
        segmenter.feed("um");
        assert_eq!(segmenter.flush(), None);
    }

    #[test]
    fn test_flush_on_empty_buffer() {
        let mut segmenter = SentenceSegmenter::new();
        assert_eq!(segmenter.flush(), None);
    }

    #[test]
    fn test_custom_min_chars() {
        let mut segmenter = SentenceSegmenter::with_min_chars(2);
        assert_eq!(segmenter.feed("Yes."), vec!["Yes."]);
    }

    #[test]
    fn test_multibyte_text() {
        let mut segmenter = SentenceSegmenter::new();
        let sentences = segmenter.feed("Das Maß aller Dinge ist größer. Und weiter");
        assert_eq!(sentences, vec!["Das Maß aller Dinge ist größer."]);
        assert_eq!(segmenter.buffered(), "Und weiter");
    }

    #[test]
    fn test_question_and_exclamation_terminate() {
        let mut segmenter = SentenceSegmenter::new();
        assert_eq!(
            segmenter.feed("Could this be right?"),
            vec!["Could this be right?"]
        );
        assert_eq!(
            segmenter.feed("It absolutely is!"),
            vec!["It absolutely is!"]
        );
    }
}
