//! Poll timer seam.
//!
//! # Invariants
//! - `stop()` is idempotent and safe before `start()`.
//! - A stopped ticker never invokes its sink again once the worker observes
//!   the stop flag; late ticks are discarded by the watcher epoch check.

use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Callback fired once per interval.
pub type TickSink = Box<dyn Fn() + Send + 'static>;

/// Periodic timer driving clipboard polls.
pub trait Ticker: Send {
    /// Arms the timer, replacing any previous arming.
    fn start(&mut self, interval: Duration, sink: TickSink);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

struct Worker {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Background-thread timer.
#[derive(Default)]
pub struct ThreadTicker {
    worker: Option<Worker>,
}

impl ThreadTicker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Ticker for ThreadTicker {
    fn start(&mut self, interval: Duration, sink: TickSink) {
        self.stop();

        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let spawned = thread::Builder::new()
            .name("clipnote-ticker".to_string())
            .spawn(move || {
                let mut deadline = Instant::now() + interval;
                while !worker_stop.load(Ordering::Acquire) {
                    let now = Instant::now();
                    if now < deadline {
                        thread::park_timeout(deadline - now);
                        continue;
                    }
                    sink();
                    deadline += interval;
                }
            });

        match spawned {
            Ok(handle) => {
                debug!(
                    "event=ticker_start module=ticker status=ok interval_ms={}",
                    interval.as_millis()
                );
                self.worker = Some(Worker { stop, handle });
            }
            Err(err) => {
                warn!("event=ticker_start module=ticker status=error error={err}");
            }
        }
    }

    fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop.store(true, Ordering::Release);
            worker.handle.thread().unpark();
            debug!("event=ticker_stop module=ticker status=ok");
        }
    }

    fn is_running(&self) -> bool {
        self.worker.is_some()
    }
}

impl Drop for ThreadTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Default)]
struct ManualState {
    interval: Option<Duration>,
    starts: usize,
}

/// Timer that never fires on its own; the host calls `Instance::poll_now`.
///
/// Clones share state so tests can observe arming after handing one clone
/// to an `Instance`.
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    state: Arc<Mutex<ManualState>>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interval of the current arming, `None` while stopped.
    pub fn interval(&self) -> Option<Duration> {
        self.lock().interval
    }

    /// Number of `start` calls so far.
    pub fn starts(&self) -> usize {
        self.lock().starts
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Ticker for ManualTicker {
    fn start(&mut self, interval: Duration, _sink: TickSink) {
        let mut state = self.lock();
        state.interval = Some(interval);
        state.starts += 1;
    }

    fn stop(&mut self) {
        self.lock().interval = None;
    }

    fn is_running(&self) -> bool {
        self.lock().interval.is_some()
    }
}
