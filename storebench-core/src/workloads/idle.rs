//! Idle baseline

use crate::error::WorkloadError;
use crate::workload::{Workload, WorkloadContext, WorkloadDef};
use async_trait::async_trait;
use tokio::time::Duration;

/// Sleep for `iterations` milliseconds
///
/// Measures harness overhead with no store traffic.
pub struct Idle {
    duration: Duration,
}

impl Idle {
    /// Workload bound to `ctx`
    pub fn new(ctx: WorkloadContext) -> Self {
        Self {
            duration: Duration::from_millis(ctx.iterations),
        }
    }
}

#[async_trait]
impl Workload for Idle {
    async fn execute(&mut self) -> Result<(), WorkloadError> {
        tokio::time::sleep(self.duration).await;
        Ok(())
    }
}

fn build_idle(ctx: WorkloadContext) -> Box<dyn Workload> {
    Box::new(Idle::new(ctx))
}

inventory::submit! {
    WorkloadDef {
        id: "idle",
        description: "Sleep for `iterations` milliseconds",
        distributed: false,
        factory: build_idle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_idle_sleeps_iterations_ms() {
        let ctx = WorkloadContext::new(Arc::new(MemoryStore::new()), "benchmark.0", 250);
        let mut workload = Idle::new(ctx);
        let start = tokio::time::Instant::now();
        workload.execute().await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(250));
        assert!(elapsed < Duration::from_millis(260));
    }
}
