//! Free-text note record.

use serde::{Deserialize, Serialize};

/// Note identifier, allocated as `max(existing) + 1` and never reused in a session.
pub type NoteId = u64;

/// Persisted shape of one note under `notes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub name: String,
    #[serde(default)]
    pub content: String,
}

impl Note {
    pub fn new(id: NoteId, name: Option<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            name: name.unwrap_or_else(|| default_note_name(id)),
            content: content.into(),
        }
    }

    /// Character count shown in the footer while this note is active.
    pub fn char_count(&self) -> usize {
        self.content.chars().count()
    }
}

/// Display name used when a note is created without one.
pub fn default_note_name(id: NoteId) -> String {
    format!("Note {id}")
}
