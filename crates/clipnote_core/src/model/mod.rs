//! Domain records shared by the slot/note models and the store adapter.
//!
//! # Responsibility
//! - Define the persisted shapes (`SlotSnapshot`, `Note`, `Position`, `Settings`).
//! - Define instance-local view state (`Slot` display fields, `ActiveView`).
//!
//! # Invariants
//! - Persisted shapes serialize with camelCase field names.
//! - Display-only state (previews, notices) is never persisted.

pub mod note;
pub mod position;
pub mod settings;
pub mod slot;
pub mod view;
