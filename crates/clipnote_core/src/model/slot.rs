//! Clipboard slot record and preview derivation.
//!
//! # Responsibility
//! - Hold one slot's persisted fields plus its derived display text.
//! - Convert between in-memory slots and persisted `SlotSnapshot`s.
//!
//! # Invariants
//! - `preview` is recomputed on every content change.
//! - A display notice overrides the shown text but never touches `content`.

use serde::{Deserialize, Serialize};

/// Shown for a slot whose content is empty.
pub const EMPTY_SLOT_TEXT: &str = "(clipboard empty)";
/// Character cap for single-line previews.
pub const PREVIEW_MAX_CHARS: usize = 100;

/// Persisted shape of one slot under `clipboardSlotsData`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSnapshot {
    pub id: usize,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub expanded: bool,
}

impl SlotSnapshot {
    pub fn new(id: usize, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            locked: false,
            expanded: false,
        }
    }
}

/// In-memory slot owned by `SlotModel`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    id: usize,
    content: String,
    locked: bool,
    expanded: bool,
    preview: String,
    notice: Option<&'static str>,
}

impl Slot {
    /// Creates an empty, unlocked, collapsed slot.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            content: String::new(),
            locked: false,
            expanded: false,
            preview: String::new(),
            notice: None,
        }
    }

    /// Restores a slot from a snapshot, assigning the dense `id` given by the caller.
    pub fn from_snapshot(id: usize, snapshot: &SlotSnapshot) -> Self {
        let mut slot = Self::new(id);
        slot.locked = snapshot.locked;
        slot.expanded = snapshot.expanded;
        slot.set_content(snapshot.content.clone());
        slot
    }

    pub fn snapshot(&self) -> SlotSnapshot {
        SlotSnapshot {
            id: self.id,
            content: self.content.clone(),
            locked: self.locked,
            expanded: self.expanded,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn notice(&self) -> Option<&'static str> {
        self.notice
    }

    /// Text the UI shell should render for this slot right now.
    ///
    /// Priority: degraded notice, empty sentinel, full content when expanded,
    /// preview otherwise.
    pub fn shown_text(&self) -> &str {
        if let Some(notice) = self.notice {
            return notice;
        }
        if self.content.is_empty() {
            return EMPTY_SLOT_TEXT;
        }
        if self.expanded {
            &self.content
        } else {
            &self.preview
        }
    }

    /// Returns `true` when the stored content changed.
    pub(crate) fn set_content(&mut self, content: String) -> bool {
        if self.content == content {
            return false;
        }
        self.preview = derive_preview(&content);
        self.content = content;
        true
    }

    pub(crate) fn set_locked(&mut self, locked: bool) -> bool {
        let changed = self.locked != locked;
        self.locked = locked;
        changed
    }

    pub(crate) fn set_expanded(&mut self, expanded: bool) -> bool {
        let changed = self.expanded != expanded;
        self.expanded = expanded;
        changed
    }

    pub(crate) fn set_notice(&mut self, notice: Option<&'static str>) {
        self.notice = notice;
    }
}

/// Derives the collapsed preview for slot content.
///
/// Multi-line content previews as its first non-blank line; single-line
/// content previews as its first `PREVIEW_MAX_CHARS` characters.
pub fn derive_preview(content: &str) -> String {
    if content.contains('\n') {
        return content
            .lines()
            .find(|line| !line.trim().is_empty())
            .map(|line| line.trim_end().to_string())
            .unwrap_or_default();
    }
    content.chars().take(PREVIEW_MAX_CHARS).collect()
}
