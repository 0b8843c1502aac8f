//! Clipboard ingestion and cross-instance reconciliation.
//!
//! # Responsibility
//! - Define the host clipboard and timer seams.
//! - Poll the clipboard into the slot model (`watcher`).
//! - Merge store change events into local models (`reconciler`).
//!
//! # Invariants
//! - Neither the watcher nor the reconciler blocks; both are driven by
//!   events queued on the owning `Instance`.

pub mod clipboard;
pub mod reconciler;
pub mod ticker;
pub mod watcher;
