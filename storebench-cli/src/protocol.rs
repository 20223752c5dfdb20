//! Coordination Protocol
//!
//! Role-conditioned dispatch of inbound commands.
//!
//! Primary role:
//! - `Test` runs the full suite in a detached task
//! - `Workload(id)` runs one known workload in a detached task
//! - `RequestedMonitoring` merges a secondary's series into its remote entry
//!
//! Secondary role:
//! - `Objects` / `States` apply numbered storage load under `<namespace>.test.<i>`
//! - `StartMeasuring` starts local sampling under the reserved key
//! - `StopMeasuring` stops it and reports the series to the primary
//!
//! Every inbound message is answered exactly once through its `Responder`.
//! Triggering commands are acknowledged before the work they start; load
//! commands are acknowledged once the load is applied, and `StopMeasuring`
//! once the primary has acknowledged the report, so the sender's timing
//! covers the work done on its behalf.

use crate::orchestrator::{Orchestrator, OrchestratorError};
use parking_lot::Mutex;
use std::sync::Arc;
use storebench_core::{
    HostError, Measurement, ResourceProbe, SamplerConfig, Samplers, StateStore, StateValue,
    StoreObject, Timer, as_secs, start_sampling,
};
use storebench_ipc::{
    Ack, Command, Inbound, LoadAction, LoadRequest, Mailbox, Messenger, REQUESTED_MONITORING,
};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Which half of the protocol an instance speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Runs workloads and drives secondaries
    Primary,
    /// Applies load and reports measurements on request
    Secondary,
}

impl Role {
    /// Role for the `secondary_mode` setting
    pub fn from_secondary_mode(secondary_mode: bool) -> Self {
        if secondary_mode {
            Role::Secondary
        } else {
            Role::Primary
        }
    }
}

/// Local sampling session opened by `StartMeasuring`
struct MeasuringSession {
    timer: Timer,
    // Dropping detaches the sampler tasks; they exit on their own.
    _samplers: Samplers,
}

/// Inbound command dispatcher
pub struct Dispatcher {
    role: Role,
    orchestrator: Arc<Orchestrator>,
    messenger: Arc<dyn Messenger>,
    probe: Arc<dyn ResourceProbe>,
    sampler: SamplerConfig,
    primary: String,
    session: Mutex<Option<MeasuringSession>>,
}

impl Dispatcher {
    /// Dispatcher sharing store and measurement state with `orchestrator`
    pub fn new(
        role: Role,
        orchestrator: Arc<Orchestrator>,
        messenger: Arc<dyn Messenger>,
        probe: Arc<dyn ResourceProbe>,
        primary: impl Into<String>,
    ) -> Self {
        let sampler = orchestrator.config().sampler.clone();
        Self {
            role,
            orchestrator,
            messenger,
            probe,
            sampler,
            primary: primary.into(),
            session: Mutex::new(None),
        }
    }

    /// Protocol role
    pub fn role(&self) -> Role {
        self.role
    }

    /// Orchestrator used for `test` and `workload` commands
    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Whether a `StartMeasuring` session is open
    pub fn is_measuring(&self) -> bool {
        self.session.lock().is_some()
    }

    fn store(&self) -> &Arc<dyn StateStore> {
        self.orchestrator.store()
    }

    fn measurement(&self) -> &Arc<Measurement> {
        self.orchestrator.measurement()
    }

    /// Handle one inbound message, answering it exactly once
    pub async fn handle(self: &Arc<Self>, inbound: Inbound) {
        let Inbound {
            envelope,
            responder,
        } = inbound;
        debug!(
            from = %envelope.from,
            command = envelope.command.name(),
            role = ?self.role,
            "message received"
        );

        match (self.role, envelope.command) {
            (Role::Primary, Command::Test) => {
                responder.ack();
                let orchestrator = self.orchestrator.clone();
                tokio::spawn(async move {
                    log_run_result(orchestrator.run().await.map(|_| ()));
                });
            }
            (Role::Primary, Command::Workload(id)) => {
                responder.ack();
                if !self.orchestrator.registry().contains(&id) {
                    warn!(workload = %id, from = %envelope.from, "unknown workload requested");
                    return;
                }
                let orchestrator = self.orchestrator.clone();
                tokio::spawn(async move {
                    log_run_result(orchestrator.run_selected(&[id]).await.map(|_| ()));
                });
            }
            (Role::Primary, Command::RequestedMonitoring(report)) => {
                self.orchestrator.remote().merge(&envelope.from, report);
                responder.ack();
            }
            (Role::Secondary, Command::Objects(load)) => {
                let ack = to_ack(self.apply_objects(load).await);
                responder.send(ack);
            }
            (Role::Secondary, Command::States(load)) => {
                let ack = to_ack(self.apply_states(load).await);
                responder.send(ack);
            }
            (Role::Secondary, Command::StartMeasuring) => {
                self.start_measuring();
                responder.ack();
            }
            (Role::Secondary, Command::StopMeasuring) => {
                let ack = match self.stop_measuring().await {
                    Ok(()) => Ack::default(),
                    Err(message) => Ack::error(message),
                };
                responder.send(ack);
            }
            (role, command) => {
                warn!(
                    ?role,
                    command = command.name(),
                    from = %envelope.from,
                    "ignoring command not handled in this role"
                );
                responder.ack();
            }
        }
    }

    /// Handle messages until every sender of `mailbox` is gone
    pub fn spawn(self: &Arc<Self>, mut mailbox: Mailbox) -> JoinHandle<()> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            while let Some(inbound) = mailbox.recv().await {
                dispatcher.handle(inbound).await;
            }
            debug!("mailbox closed");
        })
    }

    fn load_id(&self, index: u32) -> String {
        format!("{}.test.{}", self.orchestrator.config().namespace, index)
    }

    async fn apply_objects(&self, load: LoadRequest) -> Result<(), HostError> {
        for i in 0..load.count {
            let id = self.load_id(i);
            match load.action {
                LoadAction::Set => {
                    self.store()
                        .set_object(&id, StoreObject::state(&id, "number"))
                        .await?
                }
                LoadAction::Del => self.store().del_object(&id).await?,
            }
        }
        debug!(action = ?load.action, count = load.count, "objects load applied");
        Ok(())
    }

    async fn apply_states(&self, load: LoadRequest) -> Result<(), HostError> {
        for i in 0..load.count {
            let id = self.load_id(i);
            match load.action {
                LoadAction::Set => {
                    self.store()
                        .set_state(&id, StateValue::new(i, true))
                        .await?
                }
                LoadAction::Del => self.store().del_state(&id).await?,
            }
        }
        debug!(action = ?load.action, count = load.count, "states load applied");
        Ok(())
    }

    fn start_measuring(&self) {
        let measurement = self.measurement();
        measurement.series.init(REQUESTED_MONITORING);
        measurement.marker.set(REQUESTED_MONITORING);
        let samplers = start_sampling(measurement, self.probe.clone(), &self.sampler);

        let previous = self.session.lock().replace(MeasuringSession {
            timer: Timer::start(),
            _samplers: samplers,
        });
        if previous.is_some() {
            warn!("startMeasuring while already measuring; restarting session");
        }
        info!("measuring started");
    }

    async fn stop_measuring(&self) -> Result<(), String> {
        let session = self.session.lock().take();
        let Some(session) = session else {
            warn!("stopMeasuring without a measuring session");
            return Ok(());
        };

        let measurement = self.measurement();
        measurement.marker.clear();
        measurement.monitoring.stop();
        let elapsed = session.timer.stop();
        measurement
            .series
            .push_time(REQUESTED_MONITORING, as_secs(elapsed));
        let series = measurement
            .series
            .take(REQUESTED_MONITORING)
            .unwrap_or_default();
        info!(elapsed_s = as_secs(elapsed), "measuring stopped");

        let report = Command::RequestedMonitoring(series.into_report());
        match self.messenger.send(&self.primary, report).await {
            Ok(ack) if ack.is_ok() => Ok(()),
            Ok(ack) => {
                let message = ack.error.unwrap_or_default();
                warn!(primary = %self.primary, error = %message, "primary rejected report");
                Err(message)
            }
            Err(e) => {
                warn!(primary = %self.primary, error = %e, "failed to report to primary");
                Err(e.to_string())
            }
        }
    }
}

fn to_ack(result: Result<(), HostError>) -> Ack {
    match result {
        Ok(()) => Ack::default(),
        Err(e) => {
            warn!(error = %e, "load failed");
            Ack::error(e.to_string())
        }
    }
}

fn log_run_result(result: Result<(), OrchestratorError>) {
    match result {
        Ok(()) => {}
        Err(OrchestratorError::AlreadyRunning) => {
            warn!("run request ignored: a run is already in progress");
        }
        Err(e) => error!(error = %e, "requested run failed"),
    }
}
