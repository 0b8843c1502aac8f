//! Free-text note collection.
//!
//! # Responsibility
//! - Create, edit and delete notes in insertion (tab) order.
//! - Persist the whole `notes` collection after every local mutation.
//!
//! # Invariants
//! - Note ids are unique within the collection.
//! - Allocated ids are never handed out twice within one session, even
//!   after the highest note is deleted.
//! - Remote events may only change `content` (see `sync::reconciler`).

use crate::error::{CoreError, CoreResult};
use crate::model::note::{Note, NoteId};
use crate::model::view::ActiveView;
use crate::store::{keys, SharedStore};
use log::{debug, error, warn};

pub struct NoteModel {
    notes: Vec<Note>,
    high_water: NoteId,
    store: SharedStore,
}

impl NoteModel {
    pub fn new(store: SharedStore) -> Self {
        Self {
            notes: Vec::new(),
            high_water: 0,
            store,
        }
    }

    /// Restores persisted notes without persisting; later duplicates of an id are dropped.
    pub fn from_notes(store: SharedStore, notes: Vec<Note>) -> Self {
        let mut model = Self::new(store);
        for note in notes {
            if model.contains(note.id) {
                warn!(
                    "event=note_restore module=notes status=skipped reason=duplicate_id note_id={}",
                    note.id
                );
                continue;
            }
            model.high_water = model.high_water.max(note.id);
            model.notes.push(note);
        }
        model
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.get(id).is_some()
    }

    /// Id the next `create(None, ..)` would receive.
    pub fn next_id(&self) -> NoteId {
        let max_existing = self.notes.iter().map(|note| note.id).max().unwrap_or(0);
        self.high_water.max(max_existing) + 1
    }

    /// Appends a note and persists the collection.
    ///
    /// An omitted or already-taken `id` is replaced by `next_id()`; an
    /// omitted `name` defaults to `Note {id}`. The caller should switch the
    /// active view to the returned id.
    pub fn create(
        &mut self,
        id: Option<NoteId>,
        name: Option<String>,
        content: impl Into<String>,
    ) -> NoteId {
        let id = match id {
            Some(id) if id > 0 && !self.contains(id) => id,
            Some(taken) => {
                warn!("event=note_create module=notes status=reassigned requested_id={taken}");
                self.next_id()
            }
            None => self.next_id(),
        };

        self.high_water = self.high_water.max(id);
        self.notes.push(Note::new(id, name, content));
        debug!(
            "event=note_create module=notes status=ok note_id={id} count={}",
            self.notes.len()
        );
        self.persist();
        id
    }

    /// Replaces one note's content and persists the collection.
    ///
    /// Safe to call per keystroke; every call persists the full collection.
    pub fn update_content(&mut self, id: NoteId, content: impl Into<String>) -> CoreResult<()> {
        let note = self
            .notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or(CoreError::NoteNotFound(id))?;
        note.content = content.into();
        self.persist();
        Ok(())
    }

    /// Removes one note and returns the view to show next: the last
    /// remaining note, or the clipboard view when none remain.
    pub fn delete(&mut self, id: NoteId) -> CoreResult<ActiveView> {
        let position = self
            .notes
            .iter()
            .position(|note| note.id == id)
            .ok_or(CoreError::NoteNotFound(id))?;
        self.notes.remove(position);
        debug!(
            "event=note_delete module=notes status=ok note_id={id} count={}",
            self.notes.len()
        );
        self.persist();

        Ok(self
            .notes
            .last()
            .map_or(ActiveView::Clipboard, |note| ActiveView::Note(note.id)))
    }

    /// Overwrites content from a remote event; returns `true` when it changed.
    pub(crate) fn apply_remote_content(&mut self, id: NoteId, content: &str) -> bool {
        match self.notes.iter_mut().find(|note| note.id == id) {
            Some(note) if note.content != content => {
                note.content = content.to_string();
                true
            }
            _ => false,
        }
    }

    fn persist(&self) {
        if let Err(err) = self.store.set_typed(keys::NOTES, &self.notes) {
            error!("event=note_persist module=notes status=error error={err}");
        }
    }
}
