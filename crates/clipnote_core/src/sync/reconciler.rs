//! Store-change reconciliation.
//!
//! # Responsibility
//! - Decode change events for `clipboardSlotsData` and `notes`.
//! - Apply them to the local models in place, without persisting.
//!
//! # Invariants
//! - Slot events whose length differs from the local collection rebuild it
//!   wholesale, dropping unsaved local lock/expand state.
//! - Slot events of equal length patch `content`/`locked`/`expanded` per
//!   index; they never reorder, resize or renumber.
//! - Note events only overwrite `content` of notes that already exist
//!   locally; they never create, delete or rename.
//! - Undecodable or cleared payloads leave local state untouched.

use crate::model::note::Note;
use crate::model::slot::SlotSnapshot;
use crate::service::note_model::NoteModel;
use crate::service::slot_model::SlotModel;
use crate::store::{keys, ChangeEvent};
use log::{debug, info, warn};

/// What a slot event did to the local collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotReconcile {
    /// Collection rebuilt to `len` slots.
    Rebuilt { len: usize },
    /// Indexes whose fields changed.
    Patched { indexes: Vec<usize> },
    /// Payload was missing or invalid.
    Ignored,
}

/// What one event did to the local models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    Slots(SlotReconcile),
    /// Number of notes whose content changed.
    Notes { updated: usize },
    /// Event for a key this reconciler does not watch.
    Unwatched,
}

/// Stateless merger of remote changes into one instance's models.
#[derive(Debug, Default, Clone, Copy)]
pub struct Reconciler;

impl Reconciler {
    pub fn new() -> Self {
        Self
    }

    /// Keys the owning instance must subscribe to.
    pub fn watched_keys(&self) -> &'static [&'static str] {
        &keys::WATCHED
    }

    /// Routes one change event to the matching model.
    pub fn apply(
        &self,
        event: &ChangeEvent,
        slots: &mut SlotModel,
        notes: &mut NoteModel,
    ) -> Reconciled {
        match event.key.as_str() {
            keys::CLIPBOARD_SLOTS_DATA => {
                let Some(incoming) = decode::<Vec<SlotSnapshot>>(event) else {
                    return Reconciled::Slots(SlotReconcile::Ignored);
                };
                Reconciled::Slots(self.reconcile_slots(slots, &incoming))
            }
            keys::NOTES => {
                let Some(incoming) = decode::<Vec<Note>>(event) else {
                    return Reconciled::Notes { updated: 0 };
                };
                Reconciled::Notes {
                    updated: self.reconcile_notes(notes, &incoming),
                }
            }
            _ => Reconciled::Unwatched,
        }
    }

    /// Applies an incoming slot snapshot.
    ///
    /// An empty snapshot is ignored so the collection never drops to zero.
    pub fn reconcile_slots(
        &self,
        slots: &mut SlotModel,
        incoming: &[SlotSnapshot],
    ) -> SlotReconcile {
        if incoming.is_empty() {
            warn!("event=reconcile_slots module=reconciler status=ignored reason=empty_snapshot");
            return SlotReconcile::Ignored;
        }

        if incoming.len() != slots.len() {
            let previous = slots.len();
            slots.replace_all(incoming);
            info!(
                "event=reconcile_slots module=reconciler status=ok mode=rebuild from={previous} to={}",
                slots.len()
            );
            return SlotReconcile::Rebuilt { len: slots.len() };
        }

        let mut indexes = Vec::new();
        for (index, remote) in incoming.iter().enumerate() {
            let Some(slot) = slots.slot_mut(index) else {
                continue;
            };
            let content_changed = slot.set_content(remote.content.clone());
            let locked_changed = slot.set_locked(remote.locked);
            let expanded_changed = slot.set_expanded(remote.expanded);
            if content_changed || locked_changed || expanded_changed {
                indexes.push(index);
            }
        }

        if !indexes.is_empty() {
            debug!(
                "event=reconcile_slots module=reconciler status=ok mode=patch changed={}",
                indexes.len()
            );
        }
        SlotReconcile::Patched { indexes }
    }

    /// Applies incoming note content; returns how many local notes changed.
    pub fn reconcile_notes(&self, notes: &mut NoteModel, incoming: &[Note]) -> usize {
        let updated = incoming
            .iter()
            .filter(|remote| notes.apply_remote_content(remote.id, &remote.content))
            .count();
        if updated > 0 {
            debug!("event=reconcile_notes module=reconciler status=ok updated={updated}");
        }
        updated
    }
}

fn decode<T: serde::de::DeserializeOwned>(event: &ChangeEvent) -> Option<T> {
    let value = event.new_value.clone()?;
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            warn!(
                "event=reconcile module=reconciler status=ignored key={} reason=decode_failed error={err}",
                event.key
            );
            None
        }
    }
}
