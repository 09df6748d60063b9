//! Ordered transcript log with snapshot persistence.
//!
//! The store is the only structure mutated by more than one pipeline
//! thread: the fast pass appends Streaming entries, the refine pass
//! upgrades them to Refined by id. Both go through one internal mutex held
//! only for the duration of the list mutation, never across an engine call.
//!
//! Snapshots write the whole entry list as plain text, one `[Status] text`
//! record per line, atomically replacing the previous file. Resume parses
//! the same format back and continues id assignment past the loaded
//! entries.

use crate::defaults;
use crate::error::{RefrainError, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;
use std::time::SystemTime;

/// Lifecycle of a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// Draft text from the fast pass.
    Streaming,
    /// Replaced by the high-accuracy pass.
    Refined,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Streaming => write!(f, "Streaming"),
            EntryStatus::Refined => write!(f, "Refined"),
        }
    }
}

impl FromStr for EntryStatus {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Streaming" => Ok(EntryStatus::Streaming),
            "Refined" => Ok(EntryStatus::Refined),
            _ => Err(()),
        }
    }
}

/// One line of the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub id: u64,
    pub text: String,
    pub status: EntryStatus,
    pub created_at: SystemTime,
    pub updated_at: SystemTime,
}

struct Inner {
    entries: Vec<TranscriptEntry>,
    next_id: u64,
}

/// The session transcript: ordered entries plus their persistence identity.
pub struct SessionStore {
    name: String,
    backing_path: PathBuf,
    inner: Mutex<Inner>,
}

impl SessionStore {
    /// Create a fresh session in `dir`.
    ///
    /// The directory is created if missing. Any existing snapshot with the
    /// same name will be overwritten by the first snapshot call.
    pub fn create(name: &str, dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(Self {
            name: name.to_string(),
            backing_path: Self::session_path(dir, name),
            inner: Mutex::new(Inner {
                entries: Vec::new(),
                next_id: 0,
            }),
        })
    }

    /// Resume a session from its most recent snapshot.
    ///
    /// Entries are reconstructed in order; subsequently assigned ids
    /// continue after the highest loaded one.
    pub fn open(name: &str, dir: &Path) -> Result<Self> {
        let path = Self::session_path(dir, name);
        let contents = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RefrainError::SessionNotFound {
                    name: name.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        let now = SystemTime::now();
        let mut entries = Vec::new();
        for line in contents.lines() {
            if let Some((status, text)) = parse_record(line) {
                entries.push(TranscriptEntry {
                    id: entries.len() as u64,
                    text: text.to_string(),
                    status,
                    created_at: now,
                    updated_at: now,
                });
            }
        }

        let next_id = entries.len() as u64;
        Ok(Self {
            name: name.to_string(),
            backing_path: path,
            inner: Mutex::new(Inner { entries, next_id }),
        })
    }

    /// Whether a snapshot exists for `name` in `dir`.
    pub fn exists(name: &str, dir: &Path) -> bool {
        Self::session_path(dir, name).exists()
    }

    /// List session names with snapshots in `dir`, sorted.
    pub fn list(dir: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let entries = match fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(defaults::SESSION_EXTENSION)
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn session_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.{}", name, defaults::SESSION_EXTENSION))
    }

    /// Session name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the snapshot file.
    pub fn backing_path(&self) -> &Path {
        &self.backing_path
    }

    /// Append a new Streaming entry, taking the next id.
    pub fn append(&self, text: &str) -> TranscriptEntry {
        let now = SystemTime::now();
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let entry = TranscriptEntry {
            id: inner.next_id,
            text: text.to_string(),
            status: EntryStatus::Streaming,
            created_at: now,
            updated_at: now,
        };
        inner.next_id += 1;
        inner.entries.push(entry.clone());
        entry
    }

    /// Consume the next id without creating an entry.
    ///
    /// The fast pass reserves an id for a chunk that produced no completed
    /// sentence, so the refine pass can later create the entry at that id
    /// without colliding with a newer append.
    pub fn reserve_id(&self) -> u64 {
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let id = inner.next_id;
        inner.next_id += 1;
        id
    }

    /// Update the entry with the given id, creating it if absent.
    ///
    /// The create branch only fires for reserved ids (a chunk whose fast
    /// pass completed no sentence); entries keep id order either way.
    pub fn update(&self, id: u64, text: &str, status: EntryStatus) -> TranscriptEntry {
        let now = SystemTime::now();
        let mut inner = self.inner.lock().unwrap_or_else(|p| p.into_inner());

        match inner.entries.binary_search_by_key(&id, |e| e.id) {
            Ok(index) => {
                let entry = &mut inner.entries[index];
                entry.text = text.to_string();
                entry.status = status;
                entry.updated_at = now;
                entry.clone()
            }
            Err(index) => {
                let entry = TranscriptEntry {
                    id,
                    text: text.to_string(),
                    status,
                    created_at: now,
                    updated_at: now,
                };
                inner.entries.insert(index, entry.clone());
                if id >= inner.next_id {
                    inner.next_id = id + 1;
                }
                entry
            }
        }
    }

    /// Snapshot of the current entry list.
    pub fn entries(&self) -> Vec<TranscriptEntry> {
        self.inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .entries
            .clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .entries
            .len()
    }

    /// Whether the transcript is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The id the next append would take.
    pub fn next_id(&self) -> u64 {
        self.inner
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .next_id
    }

    /// Write the full entry list to the snapshot file, atomically replacing
    /// the previous snapshot. On failure the previous snapshot is left
    /// untouched and the in-memory session is unchanged, so a later attempt
    /// can retry.
    pub fn snapshot(&self) -> Result<()> {
        let rendered = render(&self.entries());

        let tmp_path = self.backing_path.with_extension("session.tmp");
        fs::write(&tmp_path, rendered).map_err(|e| RefrainError::SessionSnapshot {
            message: format!("write {}: {}", tmp_path.display(), e),
        })?;
        fs::rename(&tmp_path, &self.backing_path).map_err(|e| RefrainError::SessionSnapshot {
            message: format!("rename to {}: {}", self.backing_path.display(), e),
        })?;
        Ok(())
    }
}

/// Render entries in the snapshot format: one `[Status] text` per line.
fn render(entries: &[TranscriptEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push('[');
        out.push_str(&entry.status.to_string());
        out.push_str("] ");
        out.push_str(&entry.text);
        out.push('\n');
    }
    out
}

/// Parse one snapshot record. Lines that don't match are skipped, so a
/// hand-edited file degrades gracefully instead of failing the resume.
fn parse_record(line: &str) -> Option<(EntryStatus, &str)> {
    let rest = line.strip_prefix('[')?;
    let (status_str, text) = rest.split_once("] ")?;
    let status = status_str.parse().ok()?;
    Some((status, text))
}
