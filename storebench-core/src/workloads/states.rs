//! State workloads

use super::{create_state_objects, delete_objects};
use crate::error::WorkloadError;
use crate::host::{StateValue, StoreObject};
use crate::workload::{Workload, WorkloadContext, WorkloadDef};
use async_trait::async_trait;

/// Write one state `iterations` times
pub struct SetStates {
    ctx: WorkloadContext,
}

impl SetStates {
    /// Workload bound to `ctx`
    pub fn new(ctx: WorkloadContext) -> Self {
        Self { ctx }
    }

    fn target(&self) -> String {
        self.ctx.state_id(0)
    }
}

#[async_trait]
impl Workload for SetStates {
    async fn prepare(&mut self) -> Result<(), WorkloadError> {
        let id = self.target();
        self.ctx
            .store
            .set_object(&id, StoreObject::state(&id, "number"))
            .await?;
        Ok(())
    }

    async fn execute(&mut self) -> Result<(), WorkloadError> {
        let id = self.target();
        for i in 0..self.ctx.iterations {
            self.ctx.store.set_state(&id, StateValue::new(i, true)).await?;
        }
        Ok(())
    }

    async fn cleanup(&mut self) -> Result<(), WorkloadError> {
        let id = self.target();
        self.ctx.store.del_object(&id).await?;
        self.ctx.store.del_state(&id).await?;
        Ok(())
    }
}

/// Write `iterations` numbered states that have no object definition
pub struct SetStatesNonStrict {
    ctx: WorkloadContext,
}

impl SetStatesNonStrict {
    /// Workload bound to `ctx`
    pub fn new(ctx: WorkloadContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Workload for SetStatesNonStrict {
    async fn execute(&mut self) -> Result<(), WorkloadError> {
        for i in 0..self.ctx.iterations {
            self.ctx
                .store
                .set_state(&self.ctx.state_id(i), StateValue::new(i, true))
                .await?;
        }
        Ok(())
    }

    async fn cleanup(&mut self) -> Result<(), WorkloadError> {
        for i in 0..self.ctx.iterations {
            self.ctx.store.del_state(&self.ctx.state_id(i)).await?;
        }
        Ok(())
    }
}

/// Subscribe to and unsubscribe from `iterations` states
pub struct StateChangeSubscription {
    ctx: WorkloadContext,
}

impl StateChangeSubscription {
    /// Workload bound to `ctx`
    pub fn new(ctx: WorkloadContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Workload for StateChangeSubscription {
    async fn prepare(&mut self) -> Result<(), WorkloadError> {
        create_state_objects(&self.ctx, self.ctx.iterations, WorkloadContext::state_id).await
    }

    async fn execute(&mut self) -> Result<(), WorkloadError> {
        for i in 0..self.ctx.iterations {
            let id = self.ctx.state_id(i);
            self.ctx.store.subscribe_states(&id).await?;
            self.ctx.store.unsubscribe_states(&id).await?;
        }
        Ok(())
    }

    async fn cleanup(&mut self) -> Result<(), WorkloadError> {
        delete_objects(&self.ctx, self.ctx.iterations, WorkloadContext::state_id).await
    }
}

/// Delete `iterations` existing states
pub struct DelStates {
    ctx: WorkloadContext,
}

impl DelStates {
    /// Workload bound to `ctx`
    pub fn new(ctx: WorkloadContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Workload for DelStates {
    async fn prepare(&mut self) -> Result<(), WorkloadError> {
        create_state_objects(&self.ctx, self.ctx.iterations, WorkloadContext::state_id).await?;
        for i in 0..self.ctx.iterations {
            self.ctx
                .store
                .set_state(&self.ctx.state_id(i), StateValue::new(i, true))
                .await?;
        }
        Ok(())
    }

    async fn execute(&mut self) -> Result<(), WorkloadError> {
        for i in 0..self.ctx.iterations {
            self.ctx.store.del_state(&self.ctx.state_id(i)).await?;
        }
        Ok(())
    }

    async fn cleanup(&mut self) -> Result<(), WorkloadError> {
        delete_objects(&self.ctx, self.ctx.iterations, WorkloadContext::state_id).await
    }
}

fn build_set_states(ctx: WorkloadContext) -> Box<dyn Workload> {
    Box::new(SetStates::new(ctx))
}

fn build_set_states_non_strict(ctx: WorkloadContext) -> Box<dyn Workload> {
    Box::new(SetStatesNonStrict::new(ctx))
}

fn build_state_change_subscription(ctx: WorkloadContext) -> Box<dyn Workload> {
    Box::new(StateChangeSubscription::new(ctx))
}

fn build_del_states(ctx: WorkloadContext) -> Box<dyn Workload> {
    Box::new(DelStates::new(ctx))
}

inventory::submit! {
    WorkloadDef {
        id: "setStates",
        description: "Write one state object repeatedly",
        distributed: false,
        factory: build_set_states,
    }
}

inventory::submit! {
    WorkloadDef {
        id: "setStatesNonStrict",
        description: "Write numbered states without object definitions",
        distributed: false,
        factory: build_set_states_non_strict,
    }
}

inventory::submit! {
    WorkloadDef {
        id: "stateChangeSubscription",
        description: "Subscribe to and unsubscribe from numbered states",
        distributed: false,
        factory: build_state_change_subscription,
    }
}

inventory::submit! {
    WorkloadDef {
        id: "delStates",
        description: "Delete numbered states",
        distributed: false,
        factory: build_del_states,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StateStore;
    use crate::memory::MemoryStore;
    use std::sync::Arc;

    fn context(store: &Arc<MemoryStore>, id: &str) -> WorkloadContext {
        WorkloadContext::new(store.clone(), "benchmark.0", 20).for_workload(id)
    }

    async fn run_epoch(workload: &mut dyn Workload) {
        workload.prepare().await.unwrap();
        workload.execute().await.unwrap();
        workload.cleanup().await.unwrap();
    }

    #[tokio::test]
    async fn test_set_states_on_strict_store() {
        let store = Arc::new(MemoryStore::strict());
        let mut workload = SetStates::new(context(&store, "setStates"));

        workload.prepare().await.unwrap();
        workload.execute().await.unwrap();
        let state = store
            .get_state("benchmark.0.setStates.testStates.0")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(state.val, serde_json::json!(19));
        assert!(state.ack);

        workload.cleanup().await.unwrap();
        assert_eq!(store.object_count(), 0);
        assert_eq!(store.state_count(), 0);
    }

    #[tokio::test]
    async fn test_non_strict_writes() {
        let store = Arc::new(MemoryStore::new());
        let mut workload = SetStatesNonStrict::new(context(&store, "setStatesNonStrict"));
        workload.execute().await.unwrap();
        assert_eq!(store.state_count(), 20);
        assert_eq!(store.object_count(), 0);
        workload.cleanup().await.unwrap();
        assert_eq!(store.state_count(), 0);
    }

    #[tokio::test]
    async fn test_non_strict_rejected_by_strict_store() {
        let store = Arc::new(MemoryStore::strict());
        let mut workload = SetStatesNonStrict::new(context(&store, "setStatesNonStrict"));
        assert!(workload.execute().await.is_err());
    }

    #[tokio::test]
    async fn test_subscription_churn_leaves_no_subscriptions() {
        let store = Arc::new(MemoryStore::new());
        let mut workload =
            StateChangeSubscription::new(context(&store, "stateChangeSubscription"));
        workload.prepare().await.unwrap();
        assert_eq!(store.object_count(), 20);
        workload.execute().await.unwrap();
        assert_eq!(store.subscription_count(), 0);
        workload.cleanup().await.unwrap();
        assert_eq!(store.object_count(), 0);
    }

    #[tokio::test]
    async fn test_del_states() {
        let store = Arc::new(MemoryStore::strict());
        let mut workload = DelStates::new(context(&store, "delStates"));
        workload.prepare().await.unwrap();
        assert_eq!(store.state_count(), 20);
        workload.execute().await.unwrap();
        assert_eq!(store.state_count(), 0);
        workload.cleanup().await.unwrap();
        assert_eq!(store.object_count(), 0);
    }

    #[tokio::test]
    async fn test_epochs_are_repeatable() {
        let store = Arc::new(MemoryStore::strict());
        for _ in 0..2 {
            let mut workload = DelStates::new(context(&store, "delStates"));
            run_epoch(&mut workload).await;
        }
        assert_eq!(store.object_count(), 0);
    }
}
