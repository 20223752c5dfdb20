//! Run Orchestrator
//!
//! Drives the selected workloads through their epochs while the samplers run,
//! reduces every workload's series to a [`SummaryState`] and persists it.
//!
//! ```text
//! Idle ──▶ Preparing ──▶ Running ──▶ Aggregating ──┐
//!  ▲          (isolate)    (epochs)   (reduce, persist)
//!  │                          ▲                      │
//!  │                          └──── next workload ◀──┤
//!  └──────────────── restore isolated instances ◀────┘
//! ```
//!
//! Only one run is active at a time; a second request is rejected with
//! [`OrchestratorError::AlreadyRunning`].

use crate::config::StoreBenchConfig;
use crate::isolation::InstanceRestartList;
use crate::planner::build_plan;
use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use storebench_core::{
    HostError, Measurement, ResourceProbe, SamplerConfig, StateStore, StateValue, StoreObject,
    SysinfoProbe, Timer, WorkloadContext, WorkloadError, WorkloadRegistry, as_secs,
    start_sampling,
};
use storebench_ipc::{Messenger, MonitoringReport};
use storebench_stats::{
    RemoteSeries, SummaryState, ThroughputFormula, aggregate_secondaries, reduce_series,
};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Workload phase, used in error reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before the first workload phase (isolation, object creation)
    Setup,
    /// `Workload::prepare`
    Prepare,
    /// `Workload::execute`
    Execute,
    /// `Workload::cleanup`
    Cleanup,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Setup => "setup",
            Phase::Prepare => "prepare",
            Phase::Execute => "execute",
            Phase::Cleanup => "cleanup",
        };
        f.write_str(name)
    }
}

/// Why a run did not complete
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Another run is active
    #[error("A benchmark run is already in progress")]
    AlreadyRunning,

    /// Requested id is not registered
    #[error("Unknown workload: {0}")]
    UnknownWorkload(String),

    /// A workload phase returned an error
    #[error("Workload {id} failed in {phase}: {source}")]
    Workload {
        /// Workload id
        id: String,
        /// Failed phase
        phase: Phase,
        /// Underlying error
        #[source]
        source: WorkloadError,
    },

    /// Store call made by the orchestrator failed
    #[error("Store error: {0}")]
    Store(#[from] HostError),

    /// Isolated instances could not all be re-enabled
    #[error("Failed to restore isolated instances: {0}")]
    Isolation(HostError),
}

impl OrchestratorError {
    /// Id and phase of a failed workload
    pub fn failed_workload(&self) -> Option<(&str, Phase)> {
        match self {
            OrchestratorError::Workload { id, phase, .. } => Some((id, *phase)),
            _ => None,
        }
    }
}

/// Run lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run active
    Idle,
    /// Run accepted, isolating instances
    Preparing,
    /// Epochs executing
    Running,
    /// Reducing and persisting a summary
    Aggregating,
}

/// Orchestrator settings
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Namespace and instance id of this benchmark instance
    pub namespace: String,
    /// Operations per epoch
    pub iterations: u64,
    /// Timed repetitions per workload
    pub epochs: u32,
    /// Pause between epochs
    pub cooldown: Duration,
    /// Disable other instances while running
    pub isolated_run: bool,
    /// Secondary instance ids
    pub secondaries: Vec<String>,
    /// Actions-per-second formula
    pub formula: ThroughputFormula,
    /// Sampler intervals
    pub sampler: SamplerConfig,
    /// Draw an epoch progress bar on the terminal
    pub show_progress: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            namespace: "benchmark.0".to_string(),
            iterations: 10_000,
            epochs: 5,
            cooldown: Duration::from_secs(30),
            isolated_run: false,
            secondaries: Vec::new(),
            formula: ThroughputFormula::Compatible,
            sampler: SamplerConfig::default(),
            show_progress: false,
        }
    }
}

impl OrchestratorConfig {
    /// Settings from a loaded configuration file
    pub fn from_config(config: &StoreBenchConfig) -> anyhow::Result<Self> {
        Ok(Self {
            namespace: config.benchmark.namespace.clone(),
            iterations: config.benchmark.iterations,
            epochs: config.benchmark.epochs,
            cooldown: config.cooldown()?,
            isolated_run: config.benchmark.isolated_run,
            secondaries: config.benchmark.secondaries.clone(),
            formula: config.throughput_formula(),
            sampler: config.sampler_config()?,
            show_progress: false,
        })
    }
}

/// Summary of one completed workload
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadOutcome {
    /// Workload id
    pub id: String,
    /// Persisted summary
    pub summary: SummaryState,
    /// Measured execute time of every epoch, seconds
    pub epoch_times: Vec<f64>,
}

/// Monitoring series reported by remote instances, keyed by instance id
#[derive(Debug, Default)]
pub struct RemoteMonitoring {
    entries: Mutex<BTreeMap<String, RemoteSeries>>,
}

impl RemoteMonitoring {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a report to the sender's entry, creating it on first contact
    pub fn merge(&self, instance: &str, report: MonitoringReport) {
        let incoming = RemoteSeries {
            time: report.time,
            cpu_stats: report.cpu_stats,
            mem_stats: report.mem_stats,
            event_loop_lags: report.event_loop_lags,
        };
        self.entries
            .lock()
            .entry(instance.to_string())
            .or_default()
            .merge(incoming);
    }

    /// Remove and return every entry
    pub fn take(&self) -> BTreeMap<String, RemoteSeries> {
        std::mem::take(&mut *self.entries.lock())
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of reporting instances
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether no instance has reported
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

/// Resets the run state to `Idle` when the run ends, however it ends
struct RunGuard<'a> {
    state: &'a Mutex<RunState>,
}

impl RunGuard<'_> {
    fn set(&self, next: RunState) {
        *self.state.lock() = next;
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = RunState::Idle;
    }
}

/// Benchmark run orchestrator
pub struct Orchestrator {
    config: OrchestratorConfig,
    registry: WorkloadRegistry,
    store: Arc<dyn StateStore>,
    messenger: Option<Arc<dyn Messenger>>,
    probe: Arc<dyn ResourceProbe>,
    measurement: Arc<Measurement>,
    remote: Arc<RemoteMonitoring>,
    state: Mutex<RunState>,
}

impl Orchestrator {
    /// Orchestrator sampling the current process through `sysinfo`
    pub fn new(
        config: OrchestratorConfig,
        registry: WorkloadRegistry,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            config,
            registry,
            store,
            messenger: None,
            probe: Arc::new(SysinfoProbe::new()),
            measurement: Arc::new(Measurement::new()),
            remote: Arc::new(RemoteMonitoring::new()),
            state: Mutex::new(RunState::Idle),
        }
    }

    /// Messenger handed to distributed workloads
    pub fn with_messenger(mut self, messenger: Arc<dyn Messenger>) -> Self {
        self.messenger = Some(messenger);
        self
    }

    /// Replace the resource probe
    pub fn with_probe(mut self, probe: Arc<dyn ResourceProbe>) -> Self {
        self.probe = probe;
        self
    }

    /// Share measurement state with another component
    pub fn with_measurement(mut self, measurement: Arc<Measurement>) -> Self {
        self.measurement = measurement;
        self
    }

    /// Run settings
    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Registered workloads
    pub fn registry(&self) -> &WorkloadRegistry {
        &self.registry
    }

    /// Host store
    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Marker, monitoring flag and series shared with the samplers
    pub fn measurement(&self) -> &Arc<Measurement> {
        &self.measurement
    }

    /// Accumulator fed by `requestedMonitoring` messages
    pub fn remote(&self) -> &Arc<RemoteMonitoring> {
        &self.remote
    }

    /// Current lifecycle state
    pub fn state(&self) -> RunState {
        *self.state.lock()
    }

    /// Whether no run is active
    pub fn is_idle(&self) -> bool {
        self.state() == RunState::Idle
    }

    /// Id of the persisted summary state of a workload
    pub fn summary_id(&self, workload: &str) -> String {
        format!("{}.{}.summary", self.config.namespace, workload)
    }

    /// Run the full suite.
    ///
    /// Distributed workloads are left out when no secondary is configured.
    pub async fn run(&self) -> Result<Vec<WorkloadOutcome>, OrchestratorError> {
        let plan = build_plan(
            &self.registry,
            None,
            None,
            !self.config.secondaries.is_empty(),
        );
        for id in &plan.skipped {
            info!(workload = %id, "skipping distributed workload: no secondaries configured");
        }
        self.run_selected(&plan.workloads).await
    }

    /// Run a subset of workloads in mapping order
    pub async fn run_selected(
        &self,
        ids: &[String],
    ) -> Result<Vec<WorkloadOutcome>, OrchestratorError> {
        let mut outcomes = Vec::new();
        self.run_collecting(ids, &mut outcomes).await?;
        Ok(outcomes)
    }

    /// Run a subset of workloads, pushing each completed summary onto `outcomes`.
    ///
    /// Summaries of workloads that completed before a failure stay in `outcomes`.
    pub async fn run_collecting(
        &self,
        ids: &[String],
        outcomes: &mut Vec<WorkloadOutcome>,
    ) -> Result<(), OrchestratorError> {
        if let Some(unknown) = ids.iter().find(|id| !self.registry.contains(id)) {
            return Err(OrchestratorError::UnknownWorkload(unknown.clone()));
        }
        let selected: Vec<&str> = self
            .registry
            .ids()
            .filter(|id| ids.iter().any(|wanted| wanted == id))
            .collect();

        let guard = self.begin_run()?;
        info!(
            workloads = selected.len(),
            iterations = self.config.iterations,
            epochs = self.config.epochs,
            "benchmark run started"
        );

        let restart = if self.config.isolated_run {
            Some(InstanceRestartList::isolate(self.store.as_ref(), &self.config.namespace).await?)
        } else {
            None
        };

        let result = self.run_workloads(&selected, &guard, outcomes).await;

        if let Some(restart) = restart {
            if let Err(e) = restart.restore(self.store.as_ref()).await {
                error!(error = %e, "failed to restore isolated instances");
                if result.is_ok() {
                    return Err(OrchestratorError::Isolation(e));
                }
            }
        }

        match &result {
            Ok(()) => info!(completed = outcomes.len(), "benchmark run finished"),
            Err(e) => error!(error = %e, "benchmark run aborted"),
        }
        result
    }

    fn begin_run(&self) -> Result<RunGuard<'_>, OrchestratorError> {
        let mut state = self.state.lock();
        if *state != RunState::Idle {
            warn!(state = ?*state, "run requested while another run is active");
            return Err(OrchestratorError::AlreadyRunning);
        }
        *state = RunState::Preparing;
        Ok(RunGuard { state: &self.state })
    }

    async fn run_workloads(
        &self,
        ids: &[&str],
        guard: &RunGuard<'_>,
        outcomes: &mut Vec<WorkloadOutcome>,
    ) -> Result<(), OrchestratorError> {
        let samplers = start_sampling(&self.measurement, self.probe.clone(), &self.config.sampler);

        let mut result = Ok(());
        for id in ids {
            guard.set(RunState::Running);
            match self.run_workload(id, guard).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    self.measurement.series.take(id);
                    self.remote.clear();
                    result = Err(e);
                    break;
                }
            }
        }

        self.measurement.marker.clear();
        self.measurement.monitoring.stop();
        samplers.join().await;
        debug!("monitoring stopped");
        result
    }

    async fn run_workload(
        &self,
        id: &str,
        guard: &RunGuard<'_>,
    ) -> Result<WorkloadOutcome, OrchestratorError> {
        let entry = self
            .registry
            .get(id)
            .ok_or_else(|| OrchestratorError::UnknownWorkload(id.to_string()))?;
        let ctx = self.context().for_workload(id);

        self.ensure_objects(&ctx).await?;
        self.measurement.series.init(id);
        info!(workload = id, "workload started");

        let progress = self.progress_bar(id);
        for epoch in 0..self.config.epochs {
            debug!(workload = id, epoch, "epoch started");
            let mut workload = entry.instantiate(ctx.clone());
            let failed = |phase| {
                move |source| OrchestratorError::Workload {
                    id: id.to_string(),
                    phase,
                    source,
                }
            };

            workload.prepare().await.map_err(failed(Phase::Prepare))?;

            self.measurement.marker.set(id);
            let timer = Timer::start();
            let executed = workload.execute().await;
            let elapsed = timer.stop();
            self.measurement.marker.clear();
            executed.map_err(failed(Phase::Execute))?;

            self.measurement.series.push_time(id, as_secs(elapsed));
            debug!(workload = id, epoch, elapsed_s = as_secs(elapsed), "epoch measured");

            workload.cleanup().await.map_err(failed(Phase::Cleanup))?;
            progress.inc(1);

            if epoch + 1 < self.config.epochs && !self.config.cooldown.is_zero() {
                tokio::time::sleep(self.config.cooldown).await;
            }
        }
        progress.finish_and_clear();

        guard.set(RunState::Aggregating);
        let series = self.measurement.series.take(id).unwrap_or_default();
        let mut summary = reduce_series(
            series.view(),
            self.config.iterations,
            1,
            self.config.formula,
        );
        let remote = self.remote.take();
        summary.secondaries =
            aggregate_secondaries(&remote, self.config.iterations, self.config.formula);

        let json = serde_json::to_string(&summary).map_err(HostError::from)?;
        self.store
            .set_state(&self.summary_id(id), StateValue::new(json, true))
            .await?;

        info!(
            workload = id,
            time_mean = summary.time_mean,
            actions_per_second = summary.actions_per_second_mean,
            secondaries = remote.len(),
            "workload finished"
        );
        Ok(WorkloadOutcome {
            id: id.to_string(),
            summary,
            epoch_times: series.time,
        })
    }

    /// Context shared by every workload of this run
    fn context(&self) -> WorkloadContext {
        let ctx = WorkloadContext::new(
            self.store.clone(),
            self.config.namespace.clone(),
            self.config.iterations,
        );
        match &self.messenger {
            Some(messenger) => ctx.with_messenger(messenger.clone(), self.config.secondaries.clone()),
            None => WorkloadContext {
                secondaries: self.config.secondaries.clone(),
                ..ctx
            },
        }
    }

    /// Container and auxiliary objects of a workload, created once
    async fn ensure_objects(&self, ctx: &WorkloadContext) -> Result<(), HostError> {
        let scope = ctx.scope();
        let id = &ctx.workload_id;
        self.store
            .set_object_not_exists(&scope, StoreObject::channel(id))
            .await?;
        self.store
            .set_object_not_exists(
                &format!("{scope}.summary"),
                StoreObject::state("summary", "json").with_common("role", "json"),
            )
            .await?;
        self.store
            .set_object_not_exists(&format!("{scope}.testStates"), StoreObject::folder("testStates"))
            .await?;
        self.store
            .set_object_not_exists(
                &format!("{scope}.testObjects"),
                StoreObject::folder("testObjects"),
            )
            .await?;
        Ok(())
    }

    fn progress_bar(&self, id: &str) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(u64::from(self.config.epochs));
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        pb.set_message(id.to_string());
        pb
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("config", &self.config)
            .field("workloads", &self.registry.len())
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use storebench_core::{FixedProbe, MemoryStore, Workload};

    fn config(epochs: u32) -> OrchestratorConfig {
        OrchestratorConfig {
            iterations: 100,
            epochs,
            cooldown: Duration::ZERO,
            ..Default::default()
        }
    }

    fn orchestrator(registry: WorkloadRegistry, store: Arc<MemoryStore>) -> Orchestrator {
        Orchestrator::new(config(2), registry, store)
            .with_probe(Arc::new(FixedProbe::new(10.0, 2048.0)))
    }

    /// Fails in the given phase; `Phase::Setup` never occurs, so that one succeeds
    struct Failing(Phase);

    #[async_trait]
    impl Workload for Failing {
        async fn prepare(&mut self) -> Result<(), WorkloadError> {
            self.fail(Phase::Prepare)
        }
        async fn execute(&mut self) -> Result<(), WorkloadError> {
            self.fail(Phase::Execute)
        }
        async fn cleanup(&mut self) -> Result<(), WorkloadError> {
            self.fail(Phase::Cleanup)
        }
    }

    impl Failing {
        fn fail(&self, phase: Phase) -> Result<(), WorkloadError> {
            if self.0 == phase {
                Err(WorkloadError::Invalid(format!("{phase} failed")))
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_persists_summary() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = orchestrator(WorkloadRegistry::builtin(), store.clone());

        let outcomes = orchestrator
            .run_selected(&["idle".to_string()])
            .await
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        let summary = &outcomes[0].summary;
        assert!(summary.time_mean >= 0.1);
        assert_eq!(summary.cpu_mean, 10.0);
        assert_eq!(summary.mem_mean, 2048.0);
        assert!(summary.secondaries.is_none());

        let persisted = store
            .get_state("benchmark.0.idle.summary")
            .await
            .unwrap()
            .unwrap();
        assert!(persisted.ack);
        let parsed: SummaryState =
            serde_json::from_str(persisted.val.as_str().unwrap()).unwrap();
        assert_eq!(&parsed, summary);

        for id in [
            "benchmark.0.idle",
            "benchmark.0.idle.summary",
            "benchmark.0.idle.testStates",
            "benchmark.0.idle.testObjects",
        ] {
            assert!(store.get_object(id).await.unwrap().is_some(), "{id}");
        }
        assert!(orchestrator.is_idle());
        assert!(orchestrator.measurement().series.is_empty());
        assert!(!orchestrator.measurement().monitoring.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_time_entry_per_epoch() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = Orchestrator::new(config(3), WorkloadRegistry::builtin(), store)
            .with_probe(Arc::new(FixedProbe::new(10.0, 2048.0)));

        let outcomes = orchestrator
            .run_selected(&["idle".to_string()])
            .await
            .unwrap();
        let times = &outcomes[0].epoch_times;
        assert_eq!(times.len(), 3);
        assert!(times.iter().all(|t| *t >= 0.1), "{times:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_only_between_epochs() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = Orchestrator::new(
            OrchestratorConfig {
                cooldown: Duration::from_secs(30),
                ..config(2)
            },
            WorkloadRegistry::builtin(),
            store,
        )
        .with_probe(Arc::new(FixedProbe::new(10.0, 2048.0)));

        let start = tokio::time::Instant::now();
        orchestrator
            .run_selected(&["idle".to_string()])
            .await
            .unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(30));
        assert!(elapsed < Duration::from_secs(60), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_existing_objects_untouched() {
        let store = Arc::new(MemoryStore::new());
        let custom = StoreObject::channel("custom").with_common("role", "kept");
        store
            .set_object("benchmark.0.idle", custom.clone())
            .await
            .unwrap();

        let orchestrator = orchestrator(WorkloadRegistry::builtin(), store.clone());
        orchestrator
            .run_selected(&["idle".to_string()])
            .await
            .unwrap();
        assert_eq!(
            store.get_object("benchmark.0.idle").await.unwrap(),
            Some(custom)
        );
    }

    #[tokio::test]
    async fn test_unknown_workload_rejected_before_start() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = orchestrator(WorkloadRegistry::builtin(), store.clone());
        let err = orchestrator
            .run_selected(&["idle".to_string(), "nope".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownWorkload(id) if id == "nope"));
        assert_eq!(store.object_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_writes_no_summary() {
        for phase in [Phase::Prepare, Phase::Execute, Phase::Cleanup] {
            let store = Arc::new(MemoryStore::new());
            let mut registry = WorkloadRegistry::empty();
            registry.register("broken", "fails", move |_| Box::new(Failing(phase)));
            let orchestrator = orchestrator(registry, store.clone());

            let err = orchestrator
                .run_selected(&["broken".to_string()])
                .await
                .unwrap_err();
            assert_eq!(err.failed_workload(), Some(("broken", phase)));
            assert!(
                store
                    .get_state("benchmark.0.broken.summary")
                    .await
                    .unwrap()
                    .is_none()
            );
            assert!(orchestrator.is_idle());
            assert!(orchestrator.measurement().marker.is_idle());
        }
    }

    #[tokio::test]
    async fn test_completed_outcomes_kept_on_failure() {
        let store = Arc::new(MemoryStore::new());
        let mut registry = WorkloadRegistry::empty();
        registry.register("a", "ok", |_| Box::new(Failing(Phase::Setup)));
        registry.register("b", "fails", |_| Box::new(Failing(Phase::Execute)));
        let orchestrator = orchestrator(registry, store);

        let mut outcomes = Vec::new();
        let result = orchestrator
            .run_collecting(&["a".to_string(), "b".to_string()], &mut outcomes)
            .await;
        assert!(result.is_err());
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].id, "a");
    }

    #[tokio::test]
    async fn test_remote_reports_attached_then_cleared() {
        let store = Arc::new(MemoryStore::new());
        let orchestrator = orchestrator(WorkloadRegistry::builtin(), store);
        orchestrator.remote().merge(
            "benchmark.1",
            MonitoringReport {
                time: vec![0.5],
                cpu_stats: vec![10.0, 20.0],
                mem_stats: vec![1.0],
                event_loop_lags: vec![0.0],
            },
        );

        let outcomes = orchestrator
            .run_selected(&["setStates".to_string()])
            .await
            .unwrap();
        let secondaries = outcomes[0].summary.secondaries.as_ref().unwrap();
        assert_eq!(secondaries["benchmark.1"].cpu_mean, 15.0);
        assert_eq!(secondaries["benchmark.1"].actions_per_second_mean, 200.0);
        assert!(orchestrator.remote().is_empty());
    }

    #[test]
    fn test_remote_merge_concatenates() {
        let remote = RemoteMonitoring::new();
        let report = MonitoringReport {
            time: vec![1.0],
            cpu_stats: vec![1.0],
            mem_stats: vec![1.0],
            event_loop_lags: vec![1.0],
        };
        remote.merge("benchmark.1", report.clone());
        remote.merge("benchmark.1", report);
        let entries = remote.take();
        assert_eq!(entries["benchmark.1"].cpu_stats, vec![1.0, 1.0]);
        assert!(remote.is_empty());
    }
}
