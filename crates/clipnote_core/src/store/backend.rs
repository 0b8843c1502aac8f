//! Key-value backend contract and in-memory implementation.

use crate::store::StoreResult;
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw persistence primitive behind `SharedStore`.
///
/// Implementations only store and load values; change detection and
/// notification live in `SharedStore`.
pub trait KvBackend: Send {
    /// Loads one value; `Ok(None)` when the key was never written.
    fn load(&self, key: &str) -> StoreResult<Option<Value>>;
    /// Upserts one value.
    fn save(&mut self, key: &str, value: &Value) -> StoreResult<()>;
    /// Deletes one value; deleting an absent key is not an error.
    fn remove(&mut self, key: &str) -> StoreResult<()>;
}

/// Process-local backend, lost on drop.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: BTreeMap<String, Value>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvBackend for MemoryBackend {
    fn load(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &Value) -> StoreResult<()> {
        self.entries.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StoreResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
