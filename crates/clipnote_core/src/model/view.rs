//! Instance-local view state exposed to the UI shell.

use crate::model::note::NoteId;

/// Footer text in the clipboard view.
pub const AUTO_UPDATING_TEXT: &str = "Auto-updating";

/// Which tab the shell should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveView {
    /// Default view listing clipboard slots.
    #[default]
    Clipboard,
    Note(NoteId),
}

impl ActiveView {
    pub fn note_id(self) -> Option<NoteId> {
        match self {
            Self::Note(id) => Some(id),
            Self::Clipboard => None,
        }
    }
}

/// Footer projection for the active view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FooterStatus {
    /// Clipboard view: slots refresh themselves; delete is unavailable.
    AutoUpdating,
    /// Note view: character count of the note; delete is available.
    CharCount(usize),
}

impl FooterStatus {
    pub fn delete_enabled(&self) -> bool {
        matches!(self, Self::CharCount(_))
    }

    pub fn label(&self) -> String {
        match self {
            Self::AutoUpdating => AUTO_UPDATING_TEXT.to_string(),
            Self::CharCount(count) => format!("{count} characters"),
        }
    }
}
