//! Object workloads

use super::{create_state_objects, delete_objects};
use crate::error::WorkloadError;
use crate::workload::{Workload, WorkloadContext, WorkloadDef};
use async_trait::async_trait;

/// Create `iterations` object definitions
pub struct SetObjects {
    ctx: WorkloadContext,
}

impl SetObjects {
    /// Workload bound to `ctx`
    pub fn new(ctx: WorkloadContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Workload for SetObjects {
    async fn execute(&mut self) -> Result<(), WorkloadError> {
        create_state_objects(&self.ctx, self.ctx.iterations, WorkloadContext::object_id).await
    }

    async fn cleanup(&mut self) -> Result<(), WorkloadError> {
        delete_objects(&self.ctx, self.ctx.iterations, WorkloadContext::object_id).await
    }
}

/// Delete `iterations` existing object definitions
pub struct DelObjects {
    ctx: WorkloadContext,
}

impl DelObjects {
    /// Workload bound to `ctx`
    pub fn new(ctx: WorkloadContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Workload for DelObjects {
    async fn prepare(&mut self) -> Result<(), WorkloadError> {
        create_state_objects(&self.ctx, self.ctx.iterations, WorkloadContext::object_id).await
    }

    async fn execute(&mut self) -> Result<(), WorkloadError> {
        delete_objects(&self.ctx, self.ctx.iterations, WorkloadContext::object_id).await
    }
}

fn build_set_objects(ctx: WorkloadContext) -> Box<dyn Workload> {
    Box::new(SetObjects::new(ctx))
}

fn build_del_objects(ctx: WorkloadContext) -> Box<dyn Workload> {
    Box::new(DelObjects::new(ctx))
}

inventory::submit! {
    WorkloadDef {
        id: "setObjects",
        description: "Create numbered object definitions",
        distributed: false,
        factory: build_set_objects,
    }
}

inventory::submit! {
    WorkloadDef {
        id: "delObjects",
        description: "Delete numbered object definitions",
        distributed: false,
        factory: build_del_objects,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_set_objects() {
        let store = Arc::new(MemoryStore::new());
        let ctx = WorkloadContext::new(store.clone(), "benchmark.0", 7).for_workload("setObjects");
        let mut workload = SetObjects::new(ctx);

        workload.prepare().await.unwrap();
        assert_eq!(store.object_count(), 0);
        workload.execute().await.unwrap();
        assert_eq!(
            store
                .object_ids_with_prefix("benchmark.0.setObjects.testObjects.")
                .len(),
            7
        );
        workload.cleanup().await.unwrap();
        assert_eq!(store.object_count(), 0);
    }

    #[tokio::test]
    async fn test_del_objects() {
        let store = Arc::new(MemoryStore::new());
        let ctx = WorkloadContext::new(store.clone(), "benchmark.0", 7).for_workload("delObjects");
        let mut workload = DelObjects::new(ctx);

        workload.prepare().await.unwrap();
        assert_eq!(store.object_count(), 7);
        workload.execute().await.unwrap();
        assert_eq!(store.object_count(), 0);
        workload.cleanup().await.unwrap();
    }
}
