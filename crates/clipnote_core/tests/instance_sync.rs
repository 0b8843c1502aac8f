use clipnote_core::store::keys;
use clipnote_core::sync::ticker::TickSink;
use clipnote_core::{
    ActiveView, FooterStatus, Instance, ManualTicker, MemoryClipboard, Note, PollOutcome,
    Position, Settings, SharedStore, SlotSnapshot, ThreadTicker, Ticker, ACCESS_UNAVAILABLE_TEXT,
};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Ticker whose sinks the test fires by hand; keeps every arming's sink
/// after `stop` so stale ticks can be injected.
#[derive(Clone, Default)]
struct CapturingTicker {
    sinks: Arc<Mutex<Vec<TickSink>>>,
}

impl CapturingTicker {
    /// Fires the latest arming.
    fn fire(&self) {
        if let Some(sink) = self.sinks.lock().unwrap().last() {
            sink();
        }
    }

    /// Fires the `index`-th arming, counting from the first `start`.
    fn fire_arming(&self, index: usize) {
        if let Some(sink) = self.sinks.lock().unwrap().get(index) {
            sink();
        }
    }
}

impl Ticker for CapturingTicker {
    fn start(&mut self, _interval: Duration, sink: TickSink) {
        self.sinks.lock().unwrap().push(sink);
    }

    fn stop(&mut self) {}

    fn is_running(&self) -> bool {
        !self.sinks.lock().unwrap().is_empty()
    }
}

fn persisted_slots(store: &SharedStore) -> Vec<SlotSnapshot> {
    store
        .get_typed(keys::CLIPBOARD_SLOTS_DATA)
        .unwrap()
        .unwrap()
}

fn instance(store: &SharedStore, clipboard: &MemoryClipboard) -> Instance {
    Instance::new(store.clone(), clipboard.clone(), ManualTicker::new())
}

#[test]
fn ingest_in_one_instance_patches_the_other() {
    let store = SharedStore::in_memory();
    let clip_a = MemoryClipboard::with_text("hello");
    let clip_b = MemoryClipboard::new();
    let mut b = instance(&store, &clip_b);
    b.start();
    let mut a = instance(&store, &clip_a);
    a.start();

    assert_eq!(a.slots()[0].content(), "hello");
    assert!(b.pump() > 0);
    assert_eq!(b.slots().len(), a.slots().len());
    assert_eq!(b.slots()[0].content(), "hello");
}

#[test]
fn remote_length_change_rebuilds_and_loses_local_lock() {
    let store = SharedStore::in_memory();
    let clipboard = MemoryClipboard::new();
    let mut a = instance(&store, &clipboard);
    let mut b = instance(&store, &clipboard);
    a.start();
    b.start();
    assert_eq!(b.slots().len(), 3);

    assert!(b.set_slot_locked(1, true));
    a.add_slot(None);

    b.pump();
    a.pump();
    assert_eq!(b.slots().len(), 4);
    assert!(!b.slots()[1].is_locked());
    assert_eq!(a.slots().len(), 4);
    let ids: Vec<_> = b.slots().iter().map(|slot| slot.id()).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
}

#[test]
fn own_queued_events_do_not_undo_a_later_lock() {
    let store = SharedStore::in_memory();
    let clip_b = MemoryClipboard::new();
    let mut b = instance(&store, &clip_b);
    b.start();

    let clip_a = MemoryClipboard::with_text("X");
    let ticker = CapturingTicker::default();
    let mut a = Instance::new(store.clone(), clip_a.clone(), ticker.clone());
    a.start();
    ticker.fire();
    assert!(a.set_slot_locked(0, true));
    clip_a.set_text("Z");

    // Queue: ingest of X, tick, lock of slot 0.
    a.pump();
    assert_eq!(a.slots()[0].content(), "X");
    assert!(a.slots()[0].is_locked());
    assert_eq!(a.slots()[1].content(), "Z");

    let persisted = persisted_slots(&store);
    assert_eq!(persisted[0].content, "X");
    assert!(persisted[0].locked);
    assert_eq!(persisted[1].content, "Z");

    b.pump();
    assert_eq!(b.slots()[0].content(), "X");
    assert!(b.slots()[0].is_locked());
    assert_eq!(b.slots()[1].content(), "Z");
}

#[test]
fn queued_keystrokes_never_roll_back_note_content() {
    let store = SharedStore::in_memory();
    let clipboard = MemoryClipboard::new();
    let mut a = instance(&store, &clipboard);
    a.start();
    let id = a.create_note();
    let mut b = instance(&store, &clipboard);
    b.start();
    a.pump();

    assert!(a.edit_note(id, "h"));
    assert!(a.edit_note(id, "he"));
    assert!(a.process_next());
    assert_eq!(a.notes()[0].content, "he");

    assert!(a.edit_note(id, "hel"));
    a.pump();
    assert_eq!(a.notes()[0].content, "hel");

    assert!(b.process_next());
    assert_eq!(b.notes()[0].content, "");
    b.pump();
    assert_eq!(b.notes()[0].content, "hel");

    let persisted: Vec<Note> = store.get_typed(keys::NOTES).unwrap().unwrap();
    assert_eq!(persisted[0].content, "hel");
}

#[test]
fn mutations_before_start_load_persisted_state_first() {
    let store = SharedStore::in_memory();
    store
        .set_typed(
            keys::CLIPBOARD_SLOTS_DATA,
            &vec![SlotSnapshot::new(1, "a"), SlotSnapshot::new(2, "b")],
        )
        .unwrap();
    store
        .set_typed(keys::NOTES, &vec![Note::new(4, None, "kept")])
        .unwrap();
    let mut inst = instance(&store, &MemoryClipboard::new());

    assert_eq!(inst.add_slot(None), 3);
    assert_eq!(inst.create_note(), 5);
    assert!(inst.is_loaded());
    assert!(!inst.is_watching());

    let slots = persisted_slots(&store);
    assert_eq!(slots.len(), 3);
    assert_eq!(slots[0].content, "a");
    assert_eq!(slots[1].content, "b");
    let notes: Vec<Note> = store.get_typed(keys::NOTES).unwrap().unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].content, "kept");
}

#[test]
fn settings_change_retires_ticks_from_the_previous_arming() {
    let store = SharedStore::in_memory();
    let clipboard = MemoryClipboard::with_text("one");
    let ticker = CapturingTicker::default();
    let mut inst = Instance::new(store, clipboard.clone(), ticker.clone());
    inst.start();

    inst.update_settings(Settings {
        poll_interval_ms: 500,
        default_slot_count: 3,
    })
    .unwrap();
    clipboard.set_text("two");

    ticker.fire_arming(0);
    inst.pump();
    assert_eq!(inst.slots()[0].content(), "one");

    ticker.fire();
    inst.pump();
    assert_eq!(inst.slots()[0].content(), "two");
}

#[test]
fn note_content_syncs_but_structure_does_not() {
    let store = SharedStore::in_memory();
    let clipboard = MemoryClipboard::new();
    let mut a = instance(&store, &clipboard);
    a.start();
    let shared_id = a.create_note();

    let mut b = instance(&store, &clipboard);
    b.start();
    assert_eq!(b.notes().len(), 1);

    assert!(a.edit_note(shared_id, "typed in a"));
    a.create_note();
    b.pump();

    assert_eq!(b.notes().len(), 1);
    assert_eq!(b.notes()[0].content, "typed in a");
}

#[test]
fn create_and_delete_notes_drive_the_active_view() {
    let store = SharedStore::in_memory();
    let mut inst = instance(&store, &MemoryClipboard::new());
    inst.start();

    assert_eq!(inst.create_note(), 1);
    assert_eq!(inst.create_note(), 2);
    assert_eq!(inst.active_view(), ActiveView::Note(2));

    assert!(inst.switch_view(ActiveView::Note(1)));
    assert_eq!(inst.delete_active_note(), Some(ActiveView::Note(2)));
    assert_eq!(inst.active_view(), ActiveView::Note(2));
    assert_eq!(inst.delete_active_note(), Some(ActiveView::Clipboard));
    assert_eq!(inst.active_view(), ActiveView::Clipboard);
    assert_eq!(inst.delete_active_note(), None);
}

#[test]
fn switching_to_unknown_note_is_ignored() {
    let store = SharedStore::in_memory();
    let mut inst = instance(&store, &MemoryClipboard::new());
    inst.start();
    assert!(!inst.switch_view(ActiveView::Note(42)));
    assert_eq!(inst.active_view(), ActiveView::Clipboard);
}

#[test]
fn missing_records_are_silent_noops() {
    let store = SharedStore::in_memory();
    let mut inst = instance(&store, &MemoryClipboard::new());
    inst.start();
    assert!(!inst.set_slot_locked(10, true));
    assert!(!inst.set_slot_expanded(10, true));
    assert!(!inst.edit_note(3, "x"));
    assert!(!inst.copy_slot(0));
}

#[test]
fn footer_tracks_active_view() {
    let store = SharedStore::in_memory();
    let mut inst = instance(&store, &MemoryClipboard::new());
    inst.start();
    assert_eq!(inst.footer(), FooterStatus::AutoUpdating);
    assert!(!inst.footer().delete_enabled());

    let id = inst.create_note();
    inst.edit_note(id, "héllo");
    assert_eq!(inst.footer(), FooterStatus::CharCount(5));
    assert!(inst.footer().delete_enabled());
}

#[test]
fn copy_active_writes_note_or_first_slot() {
    let store = SharedStore::in_memory();
    let clipboard = MemoryClipboard::with_text("from host");
    let mut inst = instance(&store, &clipboard);
    inst.start();

    clipboard.set_text("");
    assert!(inst.copy_active());
    assert_eq!(clipboard.text(), "from host");

    let id = inst.create_note();
    inst.edit_note(id, "note body");
    assert!(inst.copy_active());
    assert_eq!(clipboard.text(), "note body");

    clipboard.set_denied(true);
    assert!(!inst.copy_active());
}

#[test]
fn close_rejects_ticks_queued_for_the_old_epoch() {
    let store = SharedStore::in_memory();
    let clipboard = MemoryClipboard::with_text("first");
    let ticker = CapturingTicker::default();
    let mut inst = Instance::new(store, clipboard.clone(), ticker.clone());
    inst.start();
    assert_eq!(inst.slots()[0].content(), "first");

    clipboard.set_text("second");
    ticker.fire();
    inst.pump();
    assert_eq!(inst.slots()[0].content(), "second");

    clipboard.set_text("third");
    ticker.fire();
    inst.close();
    ticker.fire();
    inst.pump();
    assert_eq!(inst.slots()[0].content(), "second");
    assert!(!inst.is_watching());
    assert_eq!(inst.poll_now(), None);
}

#[test]
fn toggle_reopens_without_reloading() {
    let store = SharedStore::in_memory();
    store
        .set_typed(keys::NOTE_POSITION, &Position::from_pixels(10, 20))
        .unwrap();
    let ticker = ManualTicker::new();
    let mut inst = Instance::new(store.clone(), MemoryClipboard::new(), ticker.clone());

    assert!(inst.toggle_visible());
    assert!(inst.is_watching());
    assert_eq!(inst.position(), Some(&Position::from_pixels(10, 20)));
    let id = inst.create_note();

    assert!(!inst.toggle_visible());
    assert!(!inst.is_watching());
    assert!(ticker.interval().is_none());
    store
        .set_typed(keys::NOTE_POSITION, &Position::from_pixels(99, 99))
        .unwrap();

    assert!(inst.toggle_visible());
    assert!(inst.is_watching());
    assert_eq!(ticker.starts(), 2);
    assert_eq!(inst.position(), Some(&Position::from_pixels(10, 20)));
    assert_eq!(inst.notes()[0].id, id);
}

#[test]
fn start_prefers_slot_snapshot_over_legacy_count() {
    let store = SharedStore::in_memory();
    store.set_typed(keys::CLIPBOARD_SLOTS, &5).unwrap();
    store
        .set_typed(
            keys::CLIPBOARD_SLOTS_DATA,
            &vec![SlotSnapshot::new(1, "a"), SlotSnapshot::new(2, "b")],
        )
        .unwrap();
    let mut inst = instance(&store, &MemoryClipboard::new());
    inst.start();
    assert_eq!(inst.slots().len(), 2);
    assert_eq!(inst.slots()[1].content(), "b");

    let legacy = SharedStore::in_memory();
    legacy.set_typed(keys::CLIPBOARD_SLOTS, &5).unwrap();
    let mut inst = instance(&legacy, &MemoryClipboard::new());
    inst.start();
    assert_eq!(inst.slots().len(), 5);
}

#[test]
fn settings_drive_slot_count_and_poll_interval() {
    let store = SharedStore::in_memory();
    store
        .set_typed(
            keys::SETTINGS,
            &Settings {
                poll_interval_ms: 2000,
                default_slot_count: 4,
            },
        )
        .unwrap();
    let ticker = ManualTicker::new();
    let mut inst = Instance::new(store.clone(), MemoryClipboard::new(), ticker.clone());
    inst.start();
    assert_eq!(inst.slots().len(), 4);
    assert_eq!(ticker.interval(), Some(Duration::from_millis(2000)));

    let invalid = Settings {
        poll_interval_ms: 10,
        default_slot_count: 4,
    };
    assert!(inst.update_settings(invalid).is_err());
    assert_eq!(ticker.interval(), Some(Duration::from_millis(2000)));

    let faster = Settings {
        poll_interval_ms: 500,
        default_slot_count: 4,
    };
    inst.update_settings(faster).unwrap();
    assert_eq!(ticker.interval(), Some(Duration::from_millis(500)));
    let persisted: Settings = store.get_typed(keys::SETTINGS).unwrap().unwrap();
    assert_eq!(persisted, faster);
}

#[test]
fn out_of_range_persisted_settings_are_clamped() {
    let store = SharedStore::in_memory();
    store
        .set_typed(
            keys::SETTINGS,
            &serde_json::json!({"pollIntervalMs": 1, "defaultSlotCount": 50}),
        )
        .unwrap();
    let mut inst = instance(&store, &MemoryClipboard::new());
    inst.start();
    assert_eq!(inst.settings().poll_interval_ms, 500);
    assert_eq!(inst.slots().len(), 10);
}

#[test]
fn save_position_validates_and_persists() {
    let store = SharedStore::in_memory();
    let mut inst = instance(&store, &MemoryClipboard::new());
    inst.start();

    assert!(!inst.save_position(Position {
        top: "banana".to_string(),
        left: "0".to_string(),
    }));
    assert!(inst.position().is_none());

    assert!(inst.save_position(Position::from_pixels(5, 6)));
    let persisted: Position = store.get_typed(keys::NOTE_POSITION).unwrap().unwrap();
    assert_eq!(persisted, Position::from_pixels(5, 6));
}

#[test]
fn denied_clipboard_degrades_display_only() {
    let store = SharedStore::in_memory();
    let clipboard = MemoryClipboard::new();
    clipboard.set_denied(true);
    let mut inst = instance(&store, &clipboard);
    inst.start();

    assert_eq!(inst.poll_now(), Some(PollOutcome::AccessDenied));
    assert_eq!(inst.slots()[0].shown_text(), ACCESS_UNAVAILABLE_TEXT);
    assert!(inst.slots()[0].content().is_empty());
}

#[test]
fn dropping_instance_unsubscribes() {
    let store = SharedStore::in_memory();
    let mut inst = instance(&store, &MemoryClipboard::new());
    inst.start();
    assert_eq!(store.subscriber_count(), 2);
    drop(inst);
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn thread_ticker_polls_in_background() {
    let store = SharedStore::in_memory();
    store
        .set_typed(
            keys::SETTINGS,
            &Settings {
                poll_interval_ms: 500,
                default_slot_count: 1,
            },
        )
        .unwrap();
    let clipboard = MemoryClipboard::with_text("before");
    let mut inst = Instance::new(store, clipboard.clone(), ThreadTicker::new());
    inst.start();
    clipboard.set_text("after");

    let deadline = Instant::now() + Duration::from_secs(5);
    while inst.slots()[0].content() != "after" && Instant::now() < deadline {
        inst.pump();
        std::thread::sleep(Duration::from_millis(20));
    }
    assert_eq!(inst.slots()[0].content(), "after");
    inst.close();
}
