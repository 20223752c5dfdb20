//! In-Memory Store
//!
//! `StateStore` implementation backed by ordered maps. Used when StoreBench
//! runs standalone and by the test suite. Every call yields once so the
//! scheduling behaves like a remote store with suspension points.

use crate::error::HostError;
use crate::host::{StateChange, StateStore, StateValue, StoreObject, pattern_matches};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::broadcast;

const CHANGE_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Default)]
struct Inner {
    objects: BTreeMap<String, StoreObject>,
    states: BTreeMap<String, StateValue>,
    subscriptions: HashMap<String, usize>,
}

/// Ordered in-memory object/state store
#[derive(Debug)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    strict: bool,
    changes: broadcast::Sender<StateChange>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Store that accepts states without an object definition
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            inner: Mutex::new(Inner::default()),
            strict: false,
            changes,
        }
    }

    /// Store that rejects state writes lacking an object definition
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::new()
        }
    }

    /// Receive changes of subscribed states
    pub fn changes(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    /// Number of object definitions
    pub fn object_count(&self) -> usize {
        self.inner.lock().objects.len()
    }

    /// Number of state values
    pub fn state_count(&self) -> usize {
        self.inner.lock().states.len()
    }

    /// Number of active subscriptions across all patterns
    pub fn subscription_count(&self) -> usize {
        self.inner.lock().subscriptions.values().sum()
    }

    /// Object ids starting with `prefix`
    pub fn object_ids_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.inner
            .lock()
            .objects
            .keys()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// State ids starting with `prefix`
    pub fn state_ids_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.inner
            .lock()
            .states
            .keys()
            .filter(|id| id.starts_with(prefix))
            .cloned()
            .collect()
    }

    fn notify(&self, id: &str, state: Option<StateValue>) {
        let subscribed = self
            .inner
            .lock()
            .subscriptions
            .keys()
            .any(|pattern| pattern_matches(pattern, id));
        if subscribed {
            // no receivers is fine
            let _ = self.changes.send(StateChange {
                id: id.to_string(),
                state,
            });
        }
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn set_object_not_exists(
        &self,
        id: &str,
        object: StoreObject,
    ) -> Result<bool, HostError> {
        tokio::task::yield_now().await;
        let mut inner = self.inner.lock();
        if inner.objects.contains_key(id) {
            return Ok(false);
        }
        inner.objects.insert(id.to_string(), object);
        Ok(true)
    }

    async fn get_object(&self, id: &str) -> Result<Option<StoreObject>, HostError> {
        tokio::task::yield_now().await;
        Ok(self.inner.lock().objects.get(id).cloned())
    }

    async fn set_object(&self, id: &str, object: StoreObject) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        self.inner.lock().objects.insert(id.to_string(), object);
        Ok(())
    }

    async fn del_object(&self, id: &str) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        self.inner.lock().objects.remove(id);
        Ok(())
    }

    async fn object_ids(&self, start: &str, end: &str) -> Result<Vec<String>, HostError> {
        tokio::task::yield_now().await;
        if start > end {
            return Ok(Vec::new());
        }
        Ok(self
            .inner
            .lock()
            .objects
            .range(start.to_string()..=end.to_string())
            .map(|(id, _)| id.clone())
            .collect())
    }

    async fn set_state(&self, id: &str, state: StateValue) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        {
            let mut inner = self.inner.lock();
            if self.strict && !inner.objects.contains_key(id) {
                return Err(HostError::MissingObject(id.to_string()));
            }
            inner.states.insert(id.to_string(), state.clone());
        }
        self.notify(id, Some(state));
        Ok(())
    }

    async fn get_state(&self, id: &str) -> Result<Option<StateValue>, HostError> {
        tokio::task::yield_now().await;
        Ok(self.inner.lock().states.get(id).cloned())
    }

    async fn del_state(&self, id: &str) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        let removed = self.inner.lock().states.remove(id).is_some();
        if removed {
            self.notify(id, None);
        }
        Ok(())
    }

    async fn subscribe_states(&self, pattern: &str) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        *self
            .inner
            .lock()
            .subscriptions
            .entry(pattern.to_string())
            .or_default() += 1;
        Ok(())
    }

    async fn unsubscribe_states(&self, pattern: &str) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        let mut inner = self.inner.lock();
        if let Some(count) = inner.subscriptions.get_mut(pattern) {
            *count -= 1;
            if *count == 0 {
                inner.subscriptions.remove(pattern);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_object_not_exists_is_idempotent() {
        let store = MemoryStore::new();
        let created = store
            .set_object_not_exists("benchmark.0.a", StoreObject::channel("a"))
            .await
            .unwrap();
        assert!(created);

        let again = store
            .set_object_not_exists("benchmark.0.a", StoreObject::folder("other"))
            .await
            .unwrap();
        assert!(!again);

        let obj = store.get_object("benchmark.0.a").await.unwrap().unwrap();
        assert_eq!(obj, StoreObject::channel("a"));
    }

    #[tokio::test]
    async fn test_object_range() {
        let store = MemoryStore::new();
        for id in [
            "system.adapter.admin.0",
            "system.adapter.history.0",
            "system.host.main",
            "benchmark.0.x",
        ] {
            store.set_object(id, StoreObject::folder(id)).await.unwrap();
        }
        let ids = store
            .object_ids("system.adapter.", "system.adapter.\u{9999}")
            .await
            .unwrap();
        assert_eq!(ids, vec!["system.adapter.admin.0", "system.adapter.history.0"]);
    }

    #[tokio::test]
    async fn test_strict_rejects_missing_object() {
        let store = MemoryStore::strict();
        let result = store.set_state("a.b", StateValue::new(1, true)).await;
        assert!(matches!(result, Err(HostError::MissingObject(_))));

        store
            .set_object("a.b", StoreObject::state("b", "number"))
            .await
            .unwrap();
        store.set_state("a.b", StateValue::new(1, true)).await.unwrap();
        assert_eq!(store.state_count(), 1);
    }

    #[tokio::test]
    async fn test_subscription_notifies() {
        let store = MemoryStore::new();
        let mut changes = store.changes();

        store.set_state("a.unwatched", StateValue::new(1, false)).await.unwrap();
        store.subscribe_states("a.*").await.unwrap();
        store.set_state("a.watched", StateValue::new(2, false)).await.unwrap();

        let change = changes.recv().await.unwrap();
        assert_eq!(change.id, "a.watched");
        assert_eq!(change.state.unwrap().val, 2);

        store.unsubscribe_states("a.*").await.unwrap();
        assert_eq!(store.subscription_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = MemoryStore::new();
        store.del_object("nope").await.unwrap();
        store.del_state("nope").await.unwrap();
    }
}
