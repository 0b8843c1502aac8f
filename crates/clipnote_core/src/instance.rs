//! Instance Controller.
//!
//! # Responsibility
//! - Own one attachment point's slot/note models, watcher and reconciler.
//! - Load persisted state on first start and subscribe to watched keys.
//! - Queue timer ticks and store changes, handling them one at a time.
//! - Expose the view state the UI shell renders.
//!
//! # Invariants
//! - Handlers run to completion before the next queued event is handled.
//! - No poll runs after `close()` returns, even if ticks are still queued.
//! - Model errors addressing missing records are silent no-ops here.
//! - Closing keeps the models; reopening does not re-read the store.
//! - Persisted state is loaded before the first mutation, even without `start()`.
//! - A change event whose value the store has since overwritten is dropped;
//!   the newer write's own event follows it in the queue.

use crate::error::CoreResult;
use crate::model::note::{Note, NoteId};
use crate::model::position::Position;
use crate::model::settings::Settings;
use crate::model::slot::{Slot, SlotSnapshot};
use crate::model::view::{ActiveView, FooterStatus};
use crate::service::note_model::NoteModel;
use crate::service::slot_model::SlotModel;
use crate::store::{keys, ChangeEvent, SharedStore, StoreRecord, SubscriptionId};
use crate::sync::clipboard::ClipboardAccess;
use crate::sync::reconciler::{Reconciled, Reconciler};
use crate::sync::ticker::Ticker;
use crate::sync::watcher::{ClipboardWatcher, PollOutcome, WatchEpoch};
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use std::sync::mpsc::{self, Receiver, Sender};
use uuid::Uuid;

pub type InstanceId = Uuid;

/// Work queued for the instance; handled by `pump`/`process_next`.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceEvent {
    Tick { epoch: WatchEpoch },
    StoreChanged(ChangeEvent),
}

pub struct Instance {
    id: InstanceId,
    store: SharedStore,
    slots: SlotModel,
    notes: NoteModel,
    watcher: ClipboardWatcher,
    reconciler: Reconciler,
    clipboard: Box<dyn ClipboardAccess>,
    ticker: Box<dyn Ticker>,
    events_tx: Sender<InstanceEvent>,
    events_rx: Receiver<InstanceEvent>,
    subscriptions: Vec<SubscriptionId>,
    settings: Settings,
    position: Option<Position>,
    active: ActiveView,
    loaded: bool,
    visible: bool,
}

impl Instance {
    /// Creates an unloaded, hidden instance attached to `store`.
    pub fn new(
        store: SharedStore,
        clipboard: impl ClipboardAccess + 'static,
        ticker: impl Ticker + 'static,
    ) -> Self {
        let settings = Settings::default();
        let (events_tx, events_rx) = mpsc::channel();
        Self {
            id: Uuid::new_v4(),
            slots: SlotModel::new(store.clone(), settings.default_slot_count),
            notes: NoteModel::new(store.clone()),
            store,
            watcher: ClipboardWatcher::new(settings.poll_interval()),
            reconciler: Reconciler::new(),
            clipboard: Box::new(clipboard),
            ticker: Box::new(ticker),
            events_tx,
            events_rx,
            subscriptions: Vec::new(),
            settings,
            position: None,
            active: ActiveView::Clipboard,
            loaded: false,
            visible: false,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Shows the widget: loads on first call, then starts watching.
    pub fn start(&mut self) {
        self.ensure_loaded();
        self.visible = true;
        self.start_watching();
    }

    /// Hides the widget and stops polling; models are retained.
    pub fn close(&mut self) {
        self.visible = false;
        self.stop_watching();
        info!("event=instance_close module=instance status=ok instance_id={}", self.id);
    }

    /// Flips visibility, as triggered by the shell's shortcut; returns the new state.
    pub fn toggle_visible(&mut self) -> bool {
        if self.visible {
            self.close();
        } else {
            self.start();
        }
        self.visible
    }

    /// Handles every queued event in arrival order; returns how many ran.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        while self.process_next() {
            handled += 1;
        }
        handled
    }

    /// Handles at most one queued event; returns `false` when the queue is empty.
    pub fn process_next(&mut self) -> bool {
        match self.events_rx.try_recv() {
            Ok(event) => {
                self.handle(event);
                true
            }
            Err(_) => false,
        }
    }

    /// Polls immediately if watching; used by hosts driving a `ManualTicker`.
    pub fn poll_now(&mut self) -> Option<PollOutcome> {
        if !self.watcher.is_watching() {
            return None;
        }
        Some(self.poll_clipboard())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_watching()
    }

    pub fn slots(&self) -> &[Slot] {
        self.slots.slots()
    }

    pub fn notes(&self) -> &[Note] {
        self.notes.notes()
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn active_view(&self) -> ActiveView {
        self.active
    }

    /// Footer projection for the active view.
    pub fn footer(&self) -> FooterStatus {
        match self.active {
            ActiveView::Note(id) => {
                FooterStatus::CharCount(self.notes.get(id).map_or(0, Note::char_count))
            }
            ActiveView::Clipboard => FooterStatus::AutoUpdating,
        }
    }

    /// Appends a slot; returns the new slot count.
    pub fn add_slot(&mut self, initial: Option<SlotSnapshot>) -> usize {
        self.ensure_loaded();
        self.slots.add_slot(initial);
        self.slots.len()
    }

    /// Removes the last slot unless only one remains.
    pub fn remove_slot(&mut self) -> bool {
        self.ensure_loaded();
        self.slots.remove_slot()
    }

    pub fn set_slot_locked(&mut self, index: usize, locked: bool) -> bool {
        self.ensure_loaded();
        let result = self.slots.set_locked(index, locked);
        swallow("set_slot_locked", result).is_some()
    }

    pub fn set_slot_expanded(&mut self, index: usize, expanded: bool) -> bool {
        self.ensure_loaded();
        let result = self.slots.set_expanded(index, expanded);
        swallow("set_slot_expanded", result).is_some()
    }

    /// Copies one slot's content to the host clipboard.
    pub fn copy_slot(&mut self, index: usize) -> bool {
        self.ensure_loaded();
        let result = self.slots.copy_slot(index);
        match swallow("copy_slot", result) {
            Some(text) => self.write_clipboard(&text),
            None => false,
        }
    }

    /// Copies the active note, or the first slot in the clipboard view.
    pub fn copy_active(&mut self) -> bool {
        self.ensure_loaded();
        match self.active {
            ActiveView::Note(id) => match self.notes.get(id).map(|note| note.content.clone()) {
                Some(content) => self.write_clipboard(&content),
                None => false,
            },
            ActiveView::Clipboard => self.copy_slot(0),
        }
    }

    /// Creates an empty note with the next id and switches to it.
    pub fn create_note(&mut self) -> NoteId {
        self.create_note_with(None, None, String::new())
    }

    pub fn create_note_with(
        &mut self,
        id: Option<NoteId>,
        name: Option<String>,
        content: impl Into<String>,
    ) -> NoteId {
        self.ensure_loaded();
        let id = self.notes.create(id, name, content);
        self.active = ActiveView::Note(id);
        id
    }

    /// Edits one note's content, as the shell's text surface does per keystroke.
    pub fn edit_note(&mut self, id: NoteId, content: impl Into<String>) -> bool {
        self.ensure_loaded();
        let result = self.notes.update_content(id, content);
        swallow("edit_note", result).is_some()
    }

    /// Deletes the active note and switches to the next target.
    ///
    /// Returns `None` without side effects when the active view is not a note.
    pub fn delete_active_note(&mut self) -> Option<ActiveView> {
        self.ensure_loaded();
        let id = self.active.note_id()?;
        let result = self.notes.delete(id);
        let next = swallow("delete_active_note", result)?;
        self.active = next;
        Some(next)
    }

    /// Switches tabs; switching to an unknown note is ignored.
    pub fn switch_view(&mut self, view: ActiveView) -> bool {
        self.ensure_loaded();
        if let ActiveView::Note(id) = view {
            if !self.notes.contains(id) {
                debug!("event=switch_view module=instance status=skipped note_id={id}");
                return false;
            }
        }
        self.active = view;
        true
    }

    /// Persists the widget placement after a drag release.
    pub fn save_position(&mut self, position: Position) -> bool {
        self.ensure_loaded();
        if let Err(err) = position.validate() {
            warn!("event=save_position module=instance status=rejected error={err}");
            return false;
        }
        if let Err(err) = self.store.set_typed(keys::NOTE_POSITION, &position) {
            error!("event=save_position module=instance status=error error={err}");
        }
        self.position = Some(position);
        true
    }

    /// Validates, persists and applies new settings.
    ///
    /// A new poll interval re-arms a running timer immediately, under a
    /// fresh epoch.
    pub fn update_settings(&mut self, settings: Settings) -> CoreResult<()> {
        settings.validate()?;
        self.ensure_loaded();
        self.store.set_typed(keys::SETTINGS, &settings)?;
        self.settings = settings;

        if self.watcher.interval() != settings.poll_interval() {
            self.watcher.set_interval(settings.poll_interval());
            if let Some(epoch) = self.watcher.rearm() {
                self.arm_ticker(epoch);
            }
        }
        Ok(())
    }

    fn ensure_loaded(&mut self) {
        if !self.loaded {
            self.load();
        }
    }

    fn load(&mut self) {
        for key in self.reconciler.watched_keys() {
            let sender = self.events_tx.clone();
            let id = self.store.subscribe(
                key,
                Box::new(move |event| {
                    let _ = sender.send(InstanceEvent::StoreChanged(event));
                }),
            );
            self.subscriptions.push(id);
        }

        let record = match self.store.get(&[
            keys::NOTE_POSITION,
            keys::SETTINGS,
            keys::CLIPBOARD_SLOTS,
            keys::CLIPBOARD_SLOTS_DATA,
            keys::NOTES,
        ]) {
            Ok(record) => record,
            Err(err) => {
                error!("event=instance_start module=instance status=degraded error={err}");
                StoreRecord::new()
            }
        };

        self.position = decode_field::<Position>(&record, keys::NOTE_POSITION)
            .filter(|position| position.validate().is_ok());

        self.settings = decode_field::<Settings>(&record, keys::SETTINGS)
            .map(Settings::clamped)
            .unwrap_or_default();
        self.watcher.set_interval(self.settings.poll_interval());

        self.slots = match decode_field::<Vec<SlotSnapshot>>(&record, keys::CLIPBOARD_SLOTS_DATA) {
            Some(snapshots) if !snapshots.is_empty() => {
                SlotModel::from_snapshots(self.store.clone(), &snapshots)
            }
            _ => {
                let count = decode_field::<usize>(&record, keys::CLIPBOARD_SLOTS)
                    .filter(|count| *count > 0)
                    .unwrap_or(self.settings.default_slot_count);
                SlotModel::new(self.store.clone(), count)
            }
        };

        let notes = decode_field::<Vec<Note>>(&record, keys::NOTES).unwrap_or_default();
        self.notes = NoteModel::from_notes(self.store.clone(), notes);

        self.loaded = true;
        info!(
            "event=instance_start module=instance status=ok instance_id={} slots={} notes={} poll_interval_ms={}",
            self.id,
            self.slots.len(),
            self.notes.len(),
            self.settings.poll_interval_ms
        );
    }

    fn start_watching(&mut self) {
        let Some(epoch) = self.watcher.start() else {
            return;
        };
        self.poll_clipboard();
        self.arm_ticker(epoch);
    }

    fn stop_watching(&mut self) {
        self.watcher.stop();
        self.ticker.stop();
    }

    fn arm_ticker(&mut self, epoch: WatchEpoch) {
        let sender = self.events_tx.clone();
        self.ticker.start(
            self.watcher.interval(),
            Box::new(move || {
                let _ = sender.send(InstanceEvent::Tick { epoch });
            }),
        );
    }

    fn handle(&mut self, event: InstanceEvent) {
        match event {
            InstanceEvent::Tick { epoch } => {
                if self.watcher.accepts(epoch) {
                    self.poll_clipboard();
                }
            }
            InstanceEvent::StoreChanged(change) => {
                if self.is_superseded(&change) {
                    debug!(
                        "event=reconcile module=instance status=skipped reason=superseded key={}",
                        change.key
                    );
                    return;
                }
                let outcome = self
                    .reconciler
                    .apply(&change, &mut self.slots, &mut self.notes);
                if let Reconciled::Unwatched = outcome {
                    debug!(
                        "event=reconcile module=instance status=skipped key={}",
                        change.key
                    );
                }
            }
        }
    }

    /// Whether the store no longer holds the value this event carries.
    fn is_superseded(&self, change: &ChangeEvent) -> bool {
        match self.store.get(&[change.key.as_str()]) {
            Ok(current) => current.get(&change.key) != change.new_value.as_ref(),
            Err(err) => {
                warn!(
                    "event=reconcile module=instance status=degraded key={} error={err}",
                    change.key
                );
                false
            }
        }
    }

    fn poll_clipboard(&mut self) -> PollOutcome {
        self.watcher.poll(self.clipboard.as_mut(), &mut self.slots)
    }

    fn write_clipboard(&mut self, text: &str) -> bool {
        match self.clipboard.write_text(text) {
            Ok(()) => true,
            Err(err) => {
                warn!("event=clipboard_write module=instance status=denied error={err}");
                false
            }
        }
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        self.ticker.stop();
        for id in self.subscriptions.drain(..) {
            self.store.unsubscribe(id);
        }
    }
}

/// Turns not-found errors into silent no-ops; logs anything else.
fn swallow<T>(operation: &'static str, result: CoreResult<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) if err.is_not_found() => {
            debug!("event={operation} module=instance status=skipped reason={err}");
            None
        }
        Err(err) => {
            error!("event={operation} module=instance status=error error={err}");
            None
        }
    }
}

fn decode_field<T: DeserializeOwned>(record: &StoreRecord, key: &str) -> Option<T> {
    let value = record.get(key)?.clone();
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            warn!("event=instance_start module=instance status=ignored key={key} error={err}");
            None
        }
    }
}
