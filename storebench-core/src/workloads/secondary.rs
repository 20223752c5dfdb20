//! Distributed state workload
//!
//! Splits the state writes across the configured secondaries. Each secondary
//! measures its own resources between `StartMeasuring` and `StopMeasuring`
//! and reports back to the primary, which attaches the result under
//! `secondaries` in the summary.

use crate::error::WorkloadError;
use crate::workload::{Workload, WorkloadContext, WorkloadDef};
use async_trait::async_trait;
use std::sync::Arc;
use storebench_ipc::{Command, LoadRequest, Messenger};
use tokio::task::JoinSet;

/// Drive `states` load on every secondary
pub struct SecondaryStates {
    ctx: WorkloadContext,
}

impl SecondaryStates {
    /// Workload bound to `ctx`
    pub fn new(ctx: WorkloadContext) -> Self {
        Self { ctx }
    }

    fn messenger(&self) -> Result<&Arc<dyn Messenger>, WorkloadError> {
        self.ctx
            .messenger
            .as_ref()
            .ok_or_else(|| WorkloadError::Invalid("no messenger configured".to_string()))
    }

    /// States each secondary writes per epoch
    fn share(&self) -> u32 {
        let per_secondary = self.ctx.iterations / self.ctx.secondaries.len().max(1) as u64;
        u32::try_from(per_secondary).unwrap_or(u32::MAX)
    }

    /// Send `command` to every secondary, one after another
    async fn broadcast(&self, command: Command) -> Result<(), WorkloadError> {
        let messenger = self.messenger()?;
        for target in &self.ctx.secondaries {
            request(messenger.as_ref(), target, command.clone()).await?;
        }
        Ok(())
    }

    /// Send `command` to every secondary at once and wait for all acks
    async fn fan_out(&self, command: Command) -> Result<(), WorkloadError> {
        let messenger = self.messenger()?;
        let mut pending = JoinSet::new();
        for target in self.ctx.secondaries.clone() {
            let messenger = messenger.clone();
            let command = command.clone();
            pending.spawn(async move { request(messenger.as_ref(), &target, command).await });
        }
        while let Some(joined) = pending.join_next().await {
            joined.map_err(|e| WorkloadError::Invalid(format!("load task failed: {e}")))??;
        }
        Ok(())
    }
}

/// Send one command and turn an error acknowledgement into a failure
async fn request(
    messenger: &dyn Messenger,
    target: &str,
    command: Command,
) -> Result<(), WorkloadError> {
    let name = command.name().to_string();
    let ack = messenger.send(target, command).await?;
    match ack.error {
        None => Ok(()),
        Some(message) => Err(WorkloadError::Rejected {
            instance: target.to_string(),
            command: name,
            message,
        }),
    }
}

#[async_trait]
impl Workload for SecondaryStates {
    async fn prepare(&mut self) -> Result<(), WorkloadError> {
        if self.ctx.secondaries.is_empty() {
            return Err(WorkloadError::Invalid(
                "secondaryStates needs at least one secondary".to_string(),
            ));
        }
        self.messenger()?;
        Ok(())
    }

    async fn execute(&mut self) -> Result<(), WorkloadError> {
        self.broadcast(Command::StartMeasuring).await?;
        self.fan_out(Command::States(LoadRequest::set(self.share())))
            .await?;
        self.broadcast(Command::StopMeasuring).await
    }

    async fn cleanup(&mut self) -> Result<(), WorkloadError> {
        self.fan_out(Command::States(LoadRequest::del(self.share())))
            .await
    }
}

fn build_secondary_states(ctx: WorkloadContext) -> Box<dyn Workload> {
    Box::new(SecondaryStates::new(ctx))
}

inventory::submit! {
    WorkloadDef {
        id: "secondaryStates",
        description: "Write states on every secondary while they measure",
        distributed: true,
        factory: build_secondary_states,
    }
}
