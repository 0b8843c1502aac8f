//! SQLite-backed key-value persistence.
//!
//! # Responsibility
//! - Open file or in-memory databases and apply schema migrations.
//! - Store each key's JSON document as one row in `kv_entries`.
//!
//! # Invariants
//! - Returned backends have migrations fully applied.
//! - Stored text is always valid JSON; unparsable rows surface as `Decode`.

use crate::store::backend::KvBackend;
use crate::store::migrations::apply_migrations;
use crate::store::{StoreError, StoreResult};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::time::{Duration, Instant};

pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Opens a database file, creating it when missing.
    ///
    /// # Side effects
    /// - Emits `db_open` logging events with duration and status.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with("file", || Connection::open(path))
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::open_with("memory", Connection::open_in_memory)
    }

    fn open_with(
        mode: &'static str,
        connect: impl FnOnce() -> rusqlite::Result<Connection>,
    ) -> StoreResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=store status=start mode={mode}");

        let mut conn = match connect() {
            Ok(conn) => conn,
            Err(err) => {
                error!(
                    "event=db_open module=store status=error mode={mode} duration_ms={} error_code=db_open_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }
        };

        if let Err(err) = bootstrap_connection(&mut conn) {
            error!(
                "event=db_open module=store status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err);
        }

        info!(
            "event=db_open module=store status=ok mode={mode} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(Self { conn })
    }
}

impl KvBackend for SqliteBackend {
    fn load(&self, key: &str) -> StoreResult<Option<Value>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|text| {
            serde_json::from_str(&text).map_err(|source| StoreError::Decode {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
    }

    fn save(&mut self, key: &str, value: &Value) -> StoreResult<()> {
        let text = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, text],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }
}

fn bootstrap_connection(conn: &mut Connection) -> StoreResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    Ok(())
}
