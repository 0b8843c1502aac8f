//! Store key names shared by all instances.

/// `{top, left}` CSS-length strings.
pub const NOTE_POSITION: &str = "notePosition";
/// Ordered array of `{id, name, content}`.
pub const NOTES: &str = "notes";
/// Legacy slot count, written alongside `clipboardSlotsData`.
pub const CLIPBOARD_SLOTS: &str = "clipboardSlots";
/// Ordered array of `{id, content, locked, expanded}`.
pub const CLIPBOARD_SLOTS_DATA: &str = "clipboardSlotsData";
/// `{pollIntervalMs, defaultSlotCount}`.
pub const SETTINGS: &str = "settings";

/// Keys the reconciler subscribes to.
pub const WATCHED: [&str; 2] = [CLIPBOARD_SLOTS_DATA, NOTES];
