//! Core error taxonomy.
//!
//! # Responsibility
//! - Give model and controller operations one semantic error type.
//! - Keep transport errors (store, clipboard) reachable through `source()`.
//!
//! # Invariants
//! - `SlotNotFound`/`NoteNotFound`/`EmptySlot` are recoverable and are turned
//!   into silent no-ops by `Instance`; they never reach the UI shell.
//! - `Clipboard(AccessDenied)` degrades slot display instead of failing.

use crate::model::note::NoteId;
use crate::store::StoreError;
use crate::sync::clipboard::ClipboardError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug)]
pub enum CoreError {
    /// Slot index is outside the current collection.
    SlotNotFound(usize),
    /// Note id is not present in the collection.
    NoteNotFound(NoteId),
    /// Slot exists but holds no content to copy.
    EmptySlot(usize),
    /// Settings value outside its documented range.
    InvalidSettings(String),
    /// Position value is not a usable CSS length.
    InvalidPosition(String),
    Clipboard(ClipboardError),
    Store(StoreError),
}

impl CoreError {
    /// Returns whether the error addresses a record that no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SlotNotFound(_) | Self::NoteNotFound(_) | Self::EmptySlot(_)
        )
    }
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SlotNotFound(index) => write!(f, "slot not found at index {index}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::EmptySlot(index) => write!(f, "slot at index {index} is empty"),
            Self::InvalidSettings(message) => write!(f, "invalid settings: {message}"),
            Self::InvalidPosition(message) => write!(f, "invalid position: {message}"),
            Self::Clipboard(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Clipboard(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for CoreError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ClipboardError> for CoreError {
    fn from(value: ClipboardError) -> Self {
        Self::Clipboard(value)
    }
}
