//! Core synchronization engine for clipnote.
//! Keeps clipboard slots and notes consistent across every instance
//! attached to one shared store; the UI shell only renders what it exposes.

pub mod error;
pub mod instance;
pub mod logging;
pub mod model;
pub mod service;
pub mod store;
pub mod sync;

pub use error::{CoreError, CoreResult};
pub use instance::{Instance, InstanceEvent, InstanceId};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{default_note_name, Note, NoteId};
pub use model::position::Position;
pub use model::settings::Settings;
pub use model::slot::{derive_preview, Slot, SlotSnapshot, EMPTY_SLOT_TEXT};
pub use model::view::{ActiveView, FooterStatus};
pub use service::note_model::NoteModel;
pub use service::slot_model::SlotModel;
pub use store::{
    ChangeEvent, ChangeFeed, KvBackend, MemoryBackend, SharedStore, SqliteBackend, StoreError,
    StoreRecord, StoreResult,
};
pub use sync::clipboard::{ClipboardAccess, ClipboardError, MemoryClipboard};
pub use sync::reconciler::{Reconciled, Reconciler, SlotReconcile};
pub use sync::ticker::{ManualTicker, ThreadTicker, Ticker};
pub use sync::watcher::{ClipboardWatcher, PollOutcome, WatchState, ACCESS_UNAVAILABLE_TEXT};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
