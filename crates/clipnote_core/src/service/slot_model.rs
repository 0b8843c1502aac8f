//! Clipboard slot collection.
//!
//! # Responsibility
//! - Keep an ordered, dense list of slots and apply local mutations.
//! - Choose the ingestion target for freshly observed clipboard text.
//!
//! # Invariants
//! - At least one slot always exists.
//! - Slot ids are dense `1..=len` in collection order.
//! - Every local mutation persists `clipboardSlotsData` and `clipboardSlots`.

use crate::error::{CoreError, CoreResult};
use crate::model::slot::{Slot, SlotSnapshot};
use crate::store::hub::encode;
use crate::store::{keys, SharedStore, StoreRecord};
use log::{debug, error, info};

pub struct SlotModel {
    slots: Vec<Slot>,
    store: SharedStore,
}

impl SlotModel {
    /// Creates `count` empty slots (at least one) without persisting.
    pub fn new(store: SharedStore, count: usize) -> Self {
        let slots = (1..=count.max(1)).map(Slot::new).collect();
        Self { slots, store }
    }

    /// Restores slots from a persisted snapshot without persisting.
    ///
    /// Ids are reassigned densely; an empty snapshot yields one empty slot.
    pub fn from_snapshots(store: SharedStore, snapshots: &[SlotSnapshot]) -> Self {
        let mut model = Self::new(store, 1);
        model.replace_all(snapshots);
        model
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Never `true`: the collection holds at least one slot.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn snapshots(&self) -> Vec<SlotSnapshot> {
        self.slots.iter().map(Slot::snapshot).collect()
    }

    /// Appends one slot with id `len + 1`, restored from `initial` when given.
    pub fn add_slot(&mut self, initial: Option<SlotSnapshot>) -> &Slot {
        let id = self.slots.len() + 1;
        let slot = match initial {
            Some(snapshot) => Slot::from_snapshot(id, &snapshot),
            None => Slot::new(id),
        };
        self.slots.push(slot);
        debug!("event=slot_add module=slots status=ok count={}", self.slots.len());
        self.persist();
        &self.slots[id - 1]
    }

    /// Drops the last slot; returns `false` (and persists nothing) when only one remains.
    pub fn remove_slot(&mut self) -> bool {
        if self.slots.len() <= 1 {
            return false;
        }
        self.slots.pop();
        debug!("event=slot_remove module=slots status=ok count={}", self.slots.len());
        self.persist();
        true
    }

    pub fn set_locked(&mut self, index: usize, locked: bool) -> CoreResult<()> {
        self.slot_mut(index)
            .ok_or(CoreError::SlotNotFound(index))?
            .set_locked(locked);
        self.persist();
        Ok(())
    }

    pub fn set_expanded(&mut self, index: usize, expanded: bool) -> CoreResult<()> {
        self.slot_mut(index)
            .ok_or(CoreError::SlotNotFound(index))?
            .set_expanded(expanded);
        self.persist();
        Ok(())
    }

    /// Writes `text` into the lowest-indexed unlocked slot.
    ///
    /// Returns the assigned index, or `None` when every slot is locked; in
    /// that case nothing is mutated or persisted.
    pub fn ingest(&mut self, text: &str) -> Option<usize> {
        let Some(index) = self.slots.iter().position(|slot| !slot.is_locked()) else {
            info!(
                "event=slot_ingest_dropped module=slots status=skipped reason=all_locked count={}",
                self.slots.len()
            );
            return None;
        };

        let slot = &mut self.slots[index];
        slot.set_notice(None);
        slot.set_content(text.to_string());
        info!(
            "event=slot_ingest module=slots status=ok index={index} chars={}",
            text.chars().count()
        );
        self.persist();
        Some(index)
    }

    /// Returns slot content for the external copy primitive.
    ///
    /// # Errors
    /// - `SlotNotFound` when `index` is out of range.
    /// - `EmptySlot` when the slot holds no content.
    pub fn copy_slot(&self, index: usize) -> CoreResult<String> {
        let slot = self.slots.get(index).ok_or(CoreError::SlotNotFound(index))?;
        if slot.content().is_empty() {
            return Err(CoreError::EmptySlot(index));
        }
        Ok(slot.content().to_string())
    }

    /// Discards local state and rebuilds from `snapshots` with dense ids.
    pub(crate) fn replace_all(&mut self, snapshots: &[SlotSnapshot]) {
        self.slots = snapshots
            .iter()
            .enumerate()
            .map(|(index, snapshot)| Slot::from_snapshot(index + 1, snapshot))
            .collect();
        if self.slots.is_empty() {
            self.slots.push(Slot::new(1));
        }
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    /// Overlays `notice` on the first unlocked slot's display.
    pub(crate) fn show_notice(&mut self, notice: &'static str) -> Option<usize> {
        let index = self.slots.iter().position(|slot| !slot.is_locked())?;
        self.slots[index].set_notice(Some(notice));
        Some(index)
    }

    pub(crate) fn clear_notices(&mut self) {
        for slot in &mut self.slots {
            slot.set_notice(None);
        }
    }

    fn persist(&self) {
        let data = match encode(keys::CLIPBOARD_SLOTS_DATA, &self.snapshots()) {
            Ok(data) => data,
            Err(err) => {
                error!("event=slot_persist module=slots status=error error={err}");
                return;
            }
        };
        let mut record = StoreRecord::new();
        record.insert(keys::CLIPBOARD_SLOTS_DATA.to_string(), data);
        record.insert(
            keys::CLIPBOARD_SLOTS.to_string(),
            serde_json::Value::from(self.slots.len()),
        );
        if let Err(err) = self.store.set(record) {
            error!("event=slot_persist module=slots status=error error={err}");
        }
    }
}
