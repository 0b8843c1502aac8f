//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `clipnote_core` linkage.
//! - Run a deterministic two-instance sync pass over one store, optionally
//!   backed by the SQLite file given as the first argument.
//!
//! Set `CLIPNOTE_LOG_DIR` to an absolute directory to capture core logs.

use clipnote_core::{
    core_version, default_log_level, init_logging, ping, Instance, ManualTicker,
    MemoryClipboard, SharedStore, SqliteBackend, StoreError,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("clipnote_core ping={}", ping());
    println!("clipnote_core version={}", core_version());

    if let Ok(log_dir) = std::env::var("CLIPNOTE_LOG_DIR") {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    match run_demo(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("demo failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_demo(db_path: Option<String>) -> Result<(), StoreError> {
    let store = match db_path {
        Some(path) => SharedStore::new(SqliteBackend::open(path)?),
        None => SharedStore::new(SqliteBackend::open_in_memory()?),
    };

    let clipboard_a = MemoryClipboard::new();
    let clipboard_b = MemoryClipboard::new();
    let mut first = Instance::new(store.clone(), clipboard_a.clone(), ManualTicker::new());
    let mut second = Instance::new(store, clipboard_b, ManualTicker::new());
    first.start();
    second.start();

    clipboard_a.set_text("copied in first");
    first.poll_now();
    first.set_slot_locked(0, true);
    clipboard_a.set_text("copied again");
    first.poll_now();
    second.pump();

    for slot in second.slots() {
        println!(
            "second slot={} locked={} text={:?}",
            slot.id(),
            slot.is_locked(),
            slot.shown_text()
        );
    }

    first.close();
    second.close();
    Ok(())
}
