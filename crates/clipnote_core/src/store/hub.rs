//! Shared store handle with change fan-out.
//!
//! # Responsibility
//! - Serialize reads/writes from every attached instance through one backend.
//! - Notify per-key subscribers after each successful, value-changing write.
//! - Retry a failed key write once before reporting `WriteFailed`.
//!
//! # Invariants
//! - Subscribers observe events in the order writes were applied.
//! - Sinks run while the store lock is held and must not call back into the
//!   store; in-crate sinks only enqueue.

use crate::store::backend::{KvBackend, MemoryBackend};
use crate::store::{ChangeEvent, StoreError, StoreRecord, StoreResult};
use log::{debug, error, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub type SubscriptionId = u64;

/// Callback invoked with every change of a subscribed key.
pub type ChangeSink = Box<dyn Fn(ChangeEvent) + Send + 'static>;

struct Subscriber {
    id: SubscriptionId,
    key: String,
    sink: ChangeSink,
}

struct StoreState {
    backend: Box<dyn KvBackend>,
    subscribers: Vec<Subscriber>,
    next_subscription_id: SubscriptionId,
}

/// Cloneable handle to one shared key-value namespace.
///
/// Every instance attached to the same namespace holds a clone.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<StoreState>>,
}

impl SharedStore {
    pub fn new(backend: impl KvBackend + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreState {
                backend: Box::new(backend),
                subscribers: Vec::new(),
                next_subscription_id: 1,
            })),
        }
    }

    /// Store over a fresh `MemoryBackend`.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    /// Reads the requested keys; keys never written are omitted.
    pub fn get(&self, keys: &[&str]) -> StoreResult<StoreRecord> {
        let state = self.lock();
        let mut record = StoreRecord::new();
        for key in keys {
            if let Some(value) = state.backend.load(key)? {
                record.insert((*key).to_string(), value);
            }
        }
        Ok(record)
    }

    /// Reads and decodes one key.
    pub fn get_typed<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        let value = self.lock().backend.load(key)?;
        value
            .map(|value| {
                serde_json::from_value(value).map_err(|source| StoreError::Decode {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    /// Writes every key in `record`, then notifies subscribers of each key
    /// whose value changed.
    ///
    /// # Errors
    /// - Returns the first `WriteFailed` after attempting all keys.
    pub fn set(&self, record: StoreRecord) -> StoreResult<()> {
        let mut state = self.lock();
        let mut first_error = None;

        for (key, value) in record {
            let old_value = match state.backend.load(&key) {
                Ok(old_value) => old_value,
                Err(err) => {
                    debug!("event=store_read module=store status=error key={key} error={err}");
                    None
                }
            };

            if let Err(err) = save_with_retry(state.backend.as_mut(), &key, &value) {
                first_error.get_or_insert(err);
                continue;
            }

            if old_value.as_ref() != Some(&value) {
                state.notify(ChangeEvent {
                    key,
                    old_value,
                    new_value: Some(value),
                });
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Encodes and writes one key.
    pub fn set_typed<T: Serialize>(&self, key: &str, value: &T) -> StoreResult<()> {
        let value = encode(key, value)?;
        let mut record = StoreRecord::new();
        record.insert(key.to_string(), value);
        self.set(record)
    }

    /// Deletes one key and notifies subscribers when it existed.
    pub fn remove(&self, key: &str) -> StoreResult<()> {
        let mut state = self.lock();
        let old_value = state.backend.load(key)?;
        state.backend.remove(key)?;
        if old_value.is_some() {
            state.notify(ChangeEvent {
                key: key.to_string(),
                old_value,
                new_value: None,
            });
        }
        Ok(())
    }

    /// Registers `sink` for changes of `key`.
    pub fn subscribe(&self, key: &str, sink: ChangeSink) -> SubscriptionId {
        let mut state = self.lock();
        let id = state.next_subscription_id;
        state.next_subscription_id += 1;
        state.subscribers.push(Subscriber {
            id,
            key: key.to_string(),
            sink,
        });
        id
    }

    /// Returns `false` when `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.lock();
        let before = state.subscribers.len();
        state.subscribers.retain(|subscriber| subscriber.id != id);
        state.subscribers.len() != before
    }

    /// Subscribes to `key` and returns the changes as a lazy sequence.
    pub fn watch(&self, key: &str) -> ChangeFeed {
        let (sender, receiver) = mpsc::channel();
        let id = self.subscribe(
            key,
            Box::new(move |event| {
                let _ = sender.send(event);
            }),
        );
        ChangeFeed {
            store: self.clone(),
            id,
            receiver,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // A panicking sink must not take the namespace down with it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StoreState {
    fn notify(&self, event: ChangeEvent) {
        for subscriber in self
            .subscribers
            .iter()
            .filter(|subscriber| subscriber.key == event.key)
        {
            (subscriber.sink)(event.clone());
        }
    }
}

/// Infinite change sequence for one key; dropping it unsubscribes.
pub struct ChangeFeed {
    store: SharedStore,
    id: SubscriptionId,
    receiver: Receiver<ChangeEvent>,
}

impl ChangeFeed {
    /// Returns the next queued change without blocking.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        self.receiver.try_recv().ok()
    }
}

impl Iterator for ChangeFeed {
    type Item = ChangeEvent;

    /// Blocks until the next change arrives.
    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.recv().ok()
    }
}

impl Drop for ChangeFeed {
    fn drop(&mut self) {
        self.store.unsubscribe(self.id);
    }
}

pub(crate) fn encode<T: Serialize>(key: &str, value: &T) -> StoreResult<Value> {
    serde_json::to_value(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })
}

fn save_with_retry(backend: &mut dyn KvBackend, key: &str, value: &Value) -> StoreResult<()> {
    let first = match backend.save(key, value) {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };
    warn!("event=store_write module=store status=retry key={key} error={first}");

    backend.save(key, value).map_err(|source| {
        error!("event=store_write module=store status=error key={key} error={source}");
        StoreError::WriteFailed {
            key: key.to_string(),
            source: Box::new(source),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::SharedStore;
    use serde_json::json;

    #[test]
    fn get_omits_absent_keys() {
        let store = SharedStore::in_memory();
        store.set_typed("a", &1).expect("write should succeed");
        let record = store.get(&["a", "b"]).expect("read should succeed");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("a"), Some(&json!(1)));
    }

    #[test]
    fn unchanged_write_emits_no_event() {
        let store = SharedStore::in_memory();
        let mut feed = store.watch("k");
        store.set_typed("k", &"v").expect("first write");
        store.set_typed("k", &"v").expect("second write");
        assert!(feed.try_next().is_some());
        assert!(feed.try_next().is_none());
    }

    #[test]
    fn dropping_feed_unsubscribes() {
        let store = SharedStore::in_memory();
        let feed = store.watch("k");
        assert_eq!(store.subscriber_count(), 1);
        drop(feed);
        assert_eq!(store.subscriber_count(), 0);
    }
}
