//! Instance-local record models.
//!
//! # Responsibility
//! - Own the in-memory slot and note collections of one instance.
//! - Persist the whole collection after every local mutation.
//!
//! # Invariants
//! - Remote changes enter through `sync::reconciler` and are never re-persisted.
//!
//! Whole-collection writes stop scaling once collections grow; records
//! would then move to per-record keys.

pub mod note_model;
pub mod slot_model;
