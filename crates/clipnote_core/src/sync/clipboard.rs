//! Host clipboard seam.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    /// Host refused the read or write; retried on the next poll.
    AccessDenied(String),
}

impl Display for ClipboardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AccessDenied(reason) => write!(f, "clipboard access denied: {reason}"),
        }
    }
}

impl Error for ClipboardError {}

/// Read/write primitive offered by the host.
pub trait ClipboardAccess: Send {
    fn read_text(&mut self) -> Result<String, ClipboardError>;
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

#[derive(Debug, Default)]
struct MemoryClipboardState {
    text: String,
    denied: bool,
    reads: usize,
}

/// Process-local clipboard; clones share one buffer.
///
/// Used by tests and the demo binary, and by hosts that mirror the
/// system clipboard into the core themselves.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    state: Arc<Mutex<MemoryClipboardState>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        let clipboard = Self::new();
        clipboard.set_text(text);
        clipboard
    }

    /// Replaces the buffer as an external application would.
    pub fn set_text(&self, text: impl Into<String>) {
        self.lock().text = text.into();
    }

    pub fn text(&self) -> String {
        self.lock().text.clone()
    }

    /// Makes subsequent reads and writes fail with `AccessDenied`.
    pub fn set_denied(&self, denied: bool) {
        self.lock().denied = denied;
    }

    /// Number of read attempts, including denied ones.
    pub fn reads(&self) -> usize {
        self.lock().reads
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryClipboardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ClipboardAccess for MemoryClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        let mut state = self.lock();
        state.reads += 1;
        if state.denied {
            return Err(ClipboardError::AccessDenied("read refused".to_string()));
        }
        Ok(state.text.clone())
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let mut state = self.lock();
        if state.denied {
            return Err(ClipboardError::AccessDenied("write refused".to_string()));
        }
        state.text = text.to_string();
        Ok(())
    }
}
