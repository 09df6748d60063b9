//! Session transcript: the ordered, append-and-update entry log and its
//! on-disk persistence.

pub mod store;

pub use store::{EntryStatus, SessionStore, TranscriptEntry};
