//! Upward notification interface toward any presentation layer.

use crate::session::TranscriptEntry;
use std::sync::Mutex;

/// Receives pipeline events for display.
///
/// Injected into the pipeline at construction. Implementations must not
/// block: callbacks are invoked from worker threads on the hot path, and
/// each event is delivered at most once. Any UI-thread marshaling is the
/// consumer's responsibility.
pub trait TranscriptObserver: Send + Sync {
    /// A human-readable status message (engine loaded, capture ended, ...).
    fn on_status(&self, message: &str);

    /// A transcript entry was appended or updated.
    fn on_transcript(&self, entry: &TranscriptEntry);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl TranscriptObserver for NullObserver {
    fn on_status(&self, _message: &str) {}
    fn on_transcript(&self, _entry: &TranscriptEntry) {}
}

/// Observer that records every event, for tests.
#[derive(Default)]
pub struct CollectorObserver {
    statuses: Mutex<Vec<String>>,
    entries: Mutex<Vec<TranscriptEntry>>,
}

impl CollectorObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Status messages seen so far.
    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Transcript events seen so far, in delivery order.
    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl TranscriptObserver for CollectorObserver {
    fn on_status(&self, message: &str) {
        self.statuses
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(message.to_string());
    }

    fn on_transcript(&self, entry: &TranscriptEntry) {
        self.entries
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(entry.clone());
    }
}
