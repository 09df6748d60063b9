//! Terminal rendering of pipeline events.

use crate::pipeline::observer::TranscriptObserver;
use crate::session::{EntryStatus, TranscriptEntry};
use owo_colors::OwoColorize;
use std::io::IsTerminal;

/// Observer that prints transcript progress to the terminal.
///
/// Streaming drafts render dim, refined replacements render normally with
/// their entry id so the reader can match the two. Status messages go to
/// stderr so piped stdout stays a clean transcript.
pub struct ConsoleObserver {
    quiet: bool,
    color: bool,
}

impl ConsoleObserver {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            color: std::io::stderr().is_terminal(),
        }
    }
}

impl TranscriptObserver for ConsoleObserver {
    fn on_status(&self, message: &str) {
        if self.quiet {
            return;
        }
        if self.color {
            eprintln!("{} {}", "refrain:".dimmed(), message);
        } else {
            eprintln!("refrain: {}", message);
        }
    }

    fn on_transcript(&self, entry: &TranscriptEntry) {
        if self.quiet {
            return;
        }
        match entry.status {
            EntryStatus::Streaming => {
                if self.color {
                    eprintln!("{}", format!("  [{}] ~ {}", entry.id, entry.text).dimmed());
                } else {
                    eprintln!("  [{}] ~ {}", entry.id, entry.text);
                }
            }
            EntryStatus::Refined => {
                if self.color {
                    eprintln!("  [{}] {} {}", entry.id, "✓".green(), entry.text);
                } else {
                    eprintln!("  [{}] * {}", entry.id, entry.text);
                }
            }
        }
    }
}

/// Print the final transcript to stdout, refined entries as-is and
/// still-streaming ones marked as drafts.
pub fn print_transcript(entries: &[TranscriptEntry]) {
    for entry in entries {
        match entry.status {
            EntryStatus::Refined => println!("{}", entry.text),
            EntryStatus::Streaming => println!("{} (draft)", entry.text),
        }
    }
}
