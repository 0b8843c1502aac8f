//! Persisted Store Adapter.
//!
//! # Responsibility
//! - Provide typed get/set over one shared key-value namespace.
//! - Fan out change events for watched keys to every attached instance.
//! - Isolate backend details (memory, SQLite) behind `KvBackend`.
//!
//! # Invariants
//! - Values are JSON documents; absent keys are omitted from reads.
//! - Change events are emitted in write order, only for real changes.

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod backend;
pub mod hub;
pub mod keys;
pub mod migrations;
mod sqlite;

pub use backend::{KvBackend, MemoryBackend};
pub use hub::{ChangeFeed, ChangeSink, SharedStore, SubscriptionId};
pub use sqlite::SqliteBackend;

pub type StoreResult<T> = Result<T, StoreError>;

/// Partial record: key -> JSON value. Used for both reads and writes.
pub type StoreRecord = BTreeMap<String, serde_json::Value>;

/// One observed change of a single key.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub key: String,
    pub old_value: Option<serde_json::Value>,
    pub new_value: Option<serde_json::Value>,
}

#[derive(Debug)]
pub enum StoreError {
    /// Backend-specific failure reported as text.
    Backend(String),
    Sqlite(rusqlite::Error),
    Encode {
        key: String,
        source: serde_json::Error,
    },
    Decode {
        key: String,
        source: serde_json::Error,
    },
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    /// Write still failed after the single retry.
    WriteFailed {
        key: String,
        source: Box<StoreError>,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(message) => write!(f, "store backend error: {message}"),
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::Encode { key, source } => write!(f, "failed to encode `{key}`: {source}"),
            Self::Decode { key, source } => write!(f, "failed to decode `{key}`: {source}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "store schema version {db_version} is newer than supported {latest_supported}"
            ),
            Self::WriteFailed { key, source } => {
                write!(f, "write to `{key}` failed after retry: {source}")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Encode { source, .. } | Self::Decode { source, .. } => Some(source),
            Self::WriteFailed { source, .. } => Some(source.as_ref()),
            Self::Backend(_) | Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
