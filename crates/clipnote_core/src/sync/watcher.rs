//! Clipboard Watcher state machine.
//!
//! # Responsibility
//! - Track `Idle`/`Watching` and the epoch that tags each arming.
//! - Detect clipboard changes against the last successful read and ingest
//!   them into the slot model.
//!
//! # Invariants
//! - The last-read value is updated on every observed change, whether or
//!   not a free slot accepted it.
//! - A cleared clipboard is a change like any other; the receiving slot
//!   then shows the empty sentinel.
//! - The first read after construction always counts as a change.
//! - A denied read never mutates persisted slot content.
//! - Ticks tagged with a stale epoch are rejected by `accepts`.

use crate::service::slot_model::SlotModel;
use crate::sync::clipboard::{ClipboardAccess, ClipboardError};
use log::{debug, info, warn};
use std::time::Duration;

/// Display-only text shown while the host refuses clipboard reads.
pub const ACCESS_UNAVAILABLE_TEXT: &str = "(click the page to allow clipboard access)";

/// Arming generation; bumped on every `start`.
pub type WatchEpoch = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    Watching { epoch: WatchEpoch },
}

/// Result of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Clipboard text equals the last read.
    Unchanged,
    /// New text (possibly empty) was written into the slot at this index.
    Ingested(usize),
    /// New text observed but every slot is locked.
    Dropped,
    /// Host refused the read; degraded notice shown.
    AccessDenied,
}

pub struct ClipboardWatcher {
    state: WatchState,
    interval: Duration,
    last_read: Option<String>,
    next_epoch: WatchEpoch,
}

impl ClipboardWatcher {
    pub fn new(interval: Duration) -> Self {
        Self {
            state: WatchState::Idle,
            interval,
            last_read: None,
            next_epoch: 1,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn is_watching(&self) -> bool {
        matches!(self.state, WatchState::Watching { .. })
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// New interval takes effect on the next `start`.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn last_read(&self) -> Option<&str> {
        self.last_read.as_deref()
    }

    /// Transitions `Idle -> Watching` and returns the new epoch.
    ///
    /// Returns `None` when already watching. The caller performs the
    /// immediate poll and arms the timer.
    pub fn start(&mut self) -> Option<WatchEpoch> {
        if self.is_watching() {
            return None;
        }
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        self.state = WatchState::Watching { epoch };
        info!(
            "event=watcher_start module=watcher status=ok epoch={epoch} interval_ms={}",
            self.interval.as_millis()
        );
        Some(epoch)
    }

    /// Transitions to `Idle`; returns `false` when already idle.
    pub fn stop(&mut self) -> bool {
        match self.state {
            WatchState::Idle => false,
            WatchState::Watching { epoch } => {
                self.state = WatchState::Idle;
                info!("event=watcher_stop module=watcher status=ok epoch={epoch}");
                true
            }
        }
    }

    /// Moves a running watcher to a fresh epoch, so ticks from the previous
    /// arming are rejected. Returns `None` while idle.
    pub fn rearm(&mut self) -> Option<WatchEpoch> {
        let WatchState::Watching { epoch: previous } = self.state else {
            return None;
        };
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        self.state = WatchState::Watching { epoch };
        debug!(
            "event=watcher_rearm module=watcher status=ok from_epoch={previous} epoch={epoch}"
        );
        Some(epoch)
    }

    /// Whether a tick tagged with `epoch` may still poll.
    pub fn accepts(&self, epoch: WatchEpoch) -> bool {
        self.state == WatchState::Watching { epoch }
    }

    /// Reads the clipboard once and routes the result into `slots`.
    pub fn poll(
        &mut self,
        clipboard: &mut dyn ClipboardAccess,
        slots: &mut SlotModel,
    ) -> PollOutcome {
        let text = match clipboard.read_text() {
            Ok(text) => text,
            Err(ClipboardError::AccessDenied(reason)) => {
                let index = slots.show_notice(ACCESS_UNAVAILABLE_TEXT);
                warn!(
                    "event=clipboard_poll module=watcher status=denied notice_index={} reason={reason}",
                    index.map_or_else(|| "none".to_string(), |index| index.to_string())
                );
                return PollOutcome::AccessDenied;
            }
        };

        slots.clear_notices();
        if self.last_read.as_deref() == Some(text.as_str()) {
            return PollOutcome::Unchanged;
        }

        let outcome = match slots.ingest(&text) {
            Some(index) => PollOutcome::Ingested(index),
            None => PollOutcome::Dropped,
        };
        self.last_read = Some(text);
        outcome
    }
}
