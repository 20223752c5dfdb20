//! Benchmark Instance
//!
//! Wires one StoreBench instance together: the orchestrator, the protocol
//! dispatcher and the background tasks feeding it. `unload` is the shutdown
//! hook; its completion callback runs no matter how shutdown goes.

use crate::config::StoreBenchConfig;
use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use crate::protocol::{Dispatcher, Role};
use std::sync::Arc;
use storebench_core::{ResourceProbe, StateStore, WorkloadRegistry};
use storebench_ipc::{Mailbox, Messenger};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Runs the wrapped callback exactly once when dropped
struct OnComplete<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> Drop for OnComplete<F> {
    fn drop(&mut self) {
        if let Some(callback) = self.0.take() {
            callback();
        }
    }
}

/// A running StoreBench instance
pub struct Instance {
    dispatcher: Arc<Dispatcher>,
    tasks: Vec<JoinHandle<()>>,
}

impl Instance {
    /// Build an instance from configuration
    pub fn new(
        config: &StoreBenchConfig,
        registry: WorkloadRegistry,
        store: Arc<dyn StateStore>,
        messenger: Arc<dyn Messenger>,
        probe: Arc<dyn ResourceProbe>,
    ) -> anyhow::Result<Self> {
        let role = Role::from_secondary_mode(config.benchmark.secondary_mode);
        let orchestrator_config = OrchestratorConfig {
            show_progress: role == Role::Primary,
            ..OrchestratorConfig::from_config(config)?
        };
        Ok(Self::from_orchestrator(
            role,
            orchestrator_config,
            registry,
            store,
            messenger,
            probe,
            &config.benchmark.primary,
        ))
    }

    /// Build an instance from already resolved settings
    pub fn from_orchestrator(
        role: Role,
        config: OrchestratorConfig,
        registry: WorkloadRegistry,
        store: Arc<dyn StateStore>,
        messenger: Arc<dyn Messenger>,
        probe: Arc<dyn ResourceProbe>,
        primary: &str,
    ) -> Self {
        let orchestrator = Arc::new(
            Orchestrator::new(config, registry, store)
                .with_messenger(messenger.clone())
                .with_probe(probe.clone()),
        );
        let dispatcher = Arc::new(Dispatcher::new(
            role,
            orchestrator,
            messenger,
            probe,
            primary,
        ));
        info!(
            instance = %dispatcher.orchestrator().config().namespace,
            ?role,
            "instance ready"
        );
        Self {
            dispatcher,
            tasks: Vec::new(),
        }
    }

    /// Start handling messages from `mailbox`
    pub fn attach(&mut self, mailbox: Mailbox) {
        self.tasks.push(self.dispatcher.spawn(mailbox));
    }

    /// Keep a background task (e.g. a listener) alive until unload
    pub fn track(&mut self, task: JoinHandle<()>) {
        self.tasks.push(task);
    }

    /// Protocol role
    pub fn role(&self) -> Role {
        self.dispatcher.role()
    }

    /// Inbound command handler
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Run orchestrator
    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        self.dispatcher.orchestrator()
    }

    /// Shut down and call `on_complete`, which runs even if shutdown fails
    pub async fn unload<F: FnOnce()>(self, on_complete: F) {
        let _complete = OnComplete(Some(on_complete));
        if let Err(e) = self.shutdown().await {
            error!(error = %e, "error during unload");
        }
    }

    async fn shutdown(self) -> anyhow::Result<()> {
        let orchestrator = self.dispatcher.orchestrator();
        if !orchestrator.is_idle() {
            warn!(state = ?orchestrator.state(), "unloading during an active run");
        }
        let measurement = orchestrator.measurement();
        measurement.marker.clear();
        measurement.monitoring.stop();

        let mut panicked = 0;
        for task in self.tasks {
            task.abort();
            match task.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    error!(error = %e, "background task failed");
                    panicked += 1;
                }
            }
        }
        debug!("instance unloaded");

        if panicked > 0 {
            anyhow::bail!("{panicked} background task(s) panicked");
        }
        Ok(())
    }
}
