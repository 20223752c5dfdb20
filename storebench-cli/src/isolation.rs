//! Isolated Runs
//!
//! Disables every other enabled adapter instance for the duration of a run
//! and re-enables exactly those afterwards. Instance definitions live under
//! `system.adapter.<name>.<n>`.

use storebench_core::{HostError, ObjectKind, StateStore};
use tracing::{debug, info, warn};

/// Key prefix of instance definitions
pub const INSTANCE_PREFIX: &str = "system.adapter.";

/// Upper bound of the instance key range
const INSTANCE_RANGE_END: &str = "system.adapter.\u{9999}";

/// Object id of an instance definition
pub fn instance_object_id(instance: &str) -> String {
    format!("{}{}", INSTANCE_PREFIX, instance)
}

/// Instances disabled for an isolated run, in the order they were disabled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstanceRestartList {
    ids: Vec<String>,
}

impl InstanceRestartList {
    /// Disable every enabled instance except `own_instance`.
    ///
    /// If a step fails, the instances disabled so far are re-enabled before
    /// the error is returned.
    pub async fn isolate(store: &dyn StateStore, own_instance: &str) -> Result<Self, HostError> {
        let mut list = Self::default();
        match list.disable_others(store, own_instance).await {
            Ok(()) => {
                info!(count = list.ids.len(), "isolated run: instances disabled");
                Ok(list)
            }
            Err(e) => {
                warn!(error = %e, disabled = list.ids.len(), "isolation failed, rolling back");
                if let Err(restore_error) = list.restore(store).await {
                    warn!(error = %restore_error, "rollback incomplete");
                }
                Err(e)
            }
        }
    }

    async fn disable_others(
        &mut self,
        store: &dyn StateStore,
        own_instance: &str,
    ) -> Result<(), HostError> {
        let own_id = instance_object_id(own_instance);

        for id in store.object_ids(INSTANCE_PREFIX, INSTANCE_RANGE_END).await? {
            if id == own_id {
                continue;
            }
            let Some(mut object) = store.get_object(&id).await? else {
                continue;
            };
            if object.kind != ObjectKind::Instance || !object.is_enabled() {
                continue;
            }
            object.set_enabled(false);
            store.set_object(&id, object).await?;
            debug!(instance = %id, "instance disabled");
            self.ids.push(id);
        }
        Ok(())
    }

    /// Re-enable every recorded instance, re-reading its current definition first.
    ///
    /// Keeps going after a failure and returns the first error.
    pub async fn restore(self, store: &dyn StateStore) -> Result<(), HostError> {
        let mut first_error = None;

        for id in &self.ids {
            let result = async {
                match store.get_object(id).await? {
                    Some(mut object) => {
                        object.set_enabled(true);
                        store.set_object(id, object).await
                    }
                    None => {
                        warn!(instance = %id, "instance vanished during isolated run");
                        Ok(())
                    }
                }
            }
            .await;

            if let Err(e) = result {
                warn!(instance = %id, error = %e, "failed to re-enable instance");
                first_error.get_or_insert(e);
            }
        }

        info!(count = self.ids.len(), "isolated run: instances restored");
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Recorded object ids
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Number of disabled instances
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing was disabled
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use storebench_core::{MemoryStore, StateValue, StoreObject};

    /// Memory store whose `n`-th `set_object` call fails
    struct FailNthWrite {
        inner: MemoryStore,
        fail_at: usize,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl StateStore for FailNthWrite {
        async fn set_object_not_exists(
            &self,
            id: &str,
            object: StoreObject,
        ) -> Result<bool, HostError> {
            self.inner.set_object_not_exists(id, object).await
        }
        async fn get_object(&self, id: &str) -> Result<Option<StoreObject>, HostError> {
            self.inner.get_object(id).await
        }
        async fn set_object(&self, id: &str, object: StoreObject) -> Result<(), HostError> {
            if self.writes.fetch_add(1, Ordering::SeqCst) + 1 == self.fail_at {
                return Err(HostError::Unavailable(format!("write to {id} rejected")));
            }
            self.inner.set_object(id, object).await
        }
        async fn del_object(&self, id: &str) -> Result<(), HostError> {
            self.inner.del_object(id).await
        }
        async fn object_ids(&self, start: &str, end: &str) -> Result<Vec<String>, HostError> {
            self.inner.object_ids(start, end).await
        }
        async fn set_state(&self, id: &str, state: StateValue) -> Result<(), HostError> {
            self.inner.set_state(id, state).await
        }
        async fn get_state(&self, id: &str) -> Result<Option<StateValue>, HostError> {
            self.inner.get_state(id).await
        }
        async fn del_state(&self, id: &str) -> Result<(), HostError> {
            self.inner.del_state(id).await
        }
        async fn subscribe_states(&self, pattern: &str) -> Result<(), HostError> {
            self.inner.subscribe_states(pattern).await
        }
        async fn unsubscribe_states(&self, pattern: &str) -> Result<(), HostError> {
            self.inner.unsubscribe_states(pattern).await
        }
    }

    async fn seed(store: &MemoryStore) {
        for (name, enabled) in [
            ("benchmark.0", true),
            ("history.0", true),
            ("web.0", true),
            ("backup.0", false),
        ] {
            store
                .set_object(&instance_object_id(name), StoreObject::instance(name, enabled))
                .await
                .unwrap();
        }
        // Non-instance objects under the prefix are ignored
        store
            .set_object(
                "system.adapter.history.0.alive",
                StoreObject::state("alive", "boolean").with_common("enabled", true),
            )
            .await
            .unwrap();
    }

    async fn enabled(store: &MemoryStore, name: &str) -> bool {
        store
            .get_object(&instance_object_id(name))
            .await
            .unwrap()
            .unwrap()
            .is_enabled()
    }

    #[tokio::test]
    async fn test_isolate_and_restore() {
        let store = MemoryStore::new();
        seed(&store).await;

        let list = InstanceRestartList::isolate(&store, "benchmark.0")
            .await
            .unwrap();
        assert_eq!(
            list.ids(),
            &["system.adapter.history.0", "system.adapter.web.0"]
        );
        assert!(enabled(&store, "benchmark.0").await);
        assert!(!enabled(&store, "history.0").await);
        assert!(!enabled(&store, "web.0").await);
        assert!(!enabled(&store, "backup.0").await);

        list.restore(&store).await.unwrap();
        assert!(enabled(&store, "history.0").await);
        assert!(enabled(&store, "web.0").await);
        assert!(!enabled(&store, "backup.0").await);
    }

    #[tokio::test]
    async fn test_restore_keeps_concurrent_edits() {
        let store = MemoryStore::new();
        seed(&store).await;
        let list = InstanceRestartList::isolate(&store, "benchmark.0")
            .await
            .unwrap();

        let id = instance_object_id("web.0");
        let edited = store
            .get_object(&id)
            .await
            .unwrap()
            .unwrap()
            .with_common("title", "edited");
        store.set_object(&id, edited).await.unwrap();

        list.restore(&store).await.unwrap();
        let object = store.get_object(&id).await.unwrap().unwrap();
        assert!(object.is_enabled());
        assert_eq!(object.common["title"], "edited");
    }

    #[tokio::test]
    async fn test_restore_skips_vanished_instance() {
        let store = MemoryStore::new();
        seed(&store).await;
        let list = InstanceRestartList::isolate(&store, "benchmark.0")
            .await
            .unwrap();
        store
            .del_object(&instance_object_id("history.0"))
            .await
            .unwrap();

        list.restore(&store).await.unwrap();
        assert!(enabled(&store, "web.0").await);
    }

    #[tokio::test]
    async fn test_failed_isolation_rolls_back() {
        let inner = MemoryStore::new();
        seed(&inner).await;
        let store = FailNthWrite {
            inner,
            fail_at: 2,
            writes: AtomicUsize::new(0),
        };

        let err = InstanceRestartList::isolate(&store, "benchmark.0")
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::Unavailable(_)));
        assert!(enabled(&store.inner, "history.0").await);
        assert!(enabled(&store.inner, "web.0").await);
        assert!(!enabled(&store.inner, "backup.0").await);
    }
}
