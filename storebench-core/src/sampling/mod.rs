//! Background Sampling
//!
//! Two samplers run while a benchmark measures: a resource sampler polling
//! CPU and memory of the host process, and a lag sampler measuring how late
//! the runtime wakes timers. Both append to a shared [`SeriesStore`] under the
//! key held by the [`ActiveMarker`].
//!
//! Each call to [`start_sampling`] opens a new monitoring generation. A sampler
//! exits once monitoring stops or its generation is superseded, so restarting
//! quickly never leaves two samplers of the same kind appending.

mod lag;
mod marker;
mod resource;
mod series;

pub use lag::spawn_lag_sampler;
pub use marker::ActiveMarker;
pub use resource::run_resource_sampler;
pub use series::{SampleSeries, SeriesStore};

use crate::probe::ResourceProbe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Default resource sampling period
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(100);

/// Default lag sampler target interval
pub const DEFAULT_LAG_INTERVAL: Duration = Duration::from_millis(50);

/// Monitoring flag with a generation counter
#[derive(Debug, Default)]
pub struct Monitoring {
    active: AtomicBool,
    generation: AtomicU64,
}

impl Monitoring {
    /// Activate and open a new generation, returning it
    pub fn start(&self) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.active.store(true, Ordering::SeqCst);
        generation
    }

    /// Deactivate
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// Whether monitoring is on (any generation)
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Whether monitoring is on and `generation` is the current one
    pub fn is_active_for(&self, generation: u64) -> bool {
        self.is_active() && self.generation.load(Ordering::SeqCst) == generation
    }
}

/// State shared between the orchestrator, the protocol handler and the samplers
#[derive(Debug, Default)]
pub struct Measurement {
    /// Workload currently executing
    pub marker: ActiveMarker,
    /// Whether the samplers keep running
    pub monitoring: Monitoring,
    /// Collected series, keyed by workload id or `"secondary"`
    pub series: SeriesStore,
}

impl Measurement {
    /// Idle marker, inactive monitoring, no series
    pub fn new() -> Self {
        Self::default()
    }
}

/// Sampler timing and target process
#[derive(Debug, Clone)]
pub struct SamplerConfig {
    /// Resource sampling period
    pub interval: Duration,
    /// Lag sampler target interval
    pub lag_interval: Duration,
    /// Process to probe
    pub pid: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_SAMPLE_INTERVAL,
            lag_interval: DEFAULT_LAG_INTERVAL,
            pid: std::process::id(),
        }
    }
}

/// Handles of one monitoring generation's samplers
pub struct Samplers {
    generation: u64,
    resource: JoinHandle<()>,
    lag: JoinHandle<()>,
}

impl Samplers {
    /// Generation these samplers belong to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for both samplers to exit (call after stopping monitoring)
    pub async fn join(self) {
        if let Err(e) = self.resource.await {
            tracing::warn!(error = %e, "resource sampler task failed");
        }
        if let Err(e) = self.lag.await {
            tracing::warn!(error = %e, "lag sampler task failed");
        }
    }
}

/// Activate monitoring and spawn both samplers on the current runtime
pub fn start_sampling(
    measurement: &Arc<Measurement>,
    probe: Arc<dyn ResourceProbe>,
    config: &SamplerConfig,
) -> Samplers {
    let generation = measurement.monitoring.start();
    tracing::debug!(generation, "monitoring started");

    let resource = tokio::spawn(run_resource_sampler(
        measurement.clone(),
        probe,
        config.pid,
        config.interval,
        generation,
    ));

    let active = measurement.clone();
    let sink = measurement.clone();
    let lag = spawn_lag_sampler(
        config.lag_interval,
        move || active.monitoring.is_active_for(generation),
        move |lag_ms| {
            if let Some(key) = sink.marker.get() {
                sink.series.push_lag(&key, lag_ms);
            }
        },
    );

    Samplers {
        generation,
        resource,
        lag,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FixedProbe;

    fn config() -> SamplerConfig {
        SamplerConfig {
            interval: Duration::from_millis(100),
            lag_interval: Duration::from_millis(50),
            pid: 1,
        }
    }

    #[test]
    fn test_generations() {
        let monitoring = Monitoring::default();
        assert!(!monitoring.is_active());
        let first = monitoring.start();
        let second = monitoring.start();
        assert_ne!(first, second);
        assert!(!monitoring.is_active_for(first));
        assert!(monitoring.is_active_for(second));
        monitoring.stop();
        assert!(!monitoring.is_active_for(second));
    }

    #[tokio::test(start_paused = true)]
    async fn test_samples_attributed_to_marker() {
        let measurement = Arc::new(Measurement::new());
        let probe = Arc::new(FixedProbe::new(25.0, 1024.0));

        measurement.series.init("idle");
        measurement.marker.set("idle");
        let samplers = start_sampling(&measurement, probe.clone(), &config());

        tokio::time::sleep(Duration::from_millis(1000)).await;
        measurement.marker.clear();
        measurement.monitoring.stop();
        samplers.join().await;

        let series = measurement.series.take("idle").unwrap();
        assert!(series.cpu.len() >= 9, "got {} cpu samples", series.cpu.len());
        assert_eq!(series.cpu.len(), series.mem.len());
        assert!(series.cpu.iter().all(|&c| c == 25.0));
        assert!(series.mem.iter().all(|&m| m == 1024.0));
        assert!(series.lag.len() >= 19);
        assert!(series.lag.iter().all(|&l| l >= 0.0));
        assert!(probe.calls() >= 9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_samples_without_marker() {
        let measurement = Arc::new(Measurement::new());
        let probe = Arc::new(FixedProbe::new(1.0, 1.0));

        let samplers = start_sampling(&measurement, probe, &config());
        tokio::time::sleep(Duration::from_millis(500)).await;
        measurement.monitoring.stop();
        samplers.join().await;

        assert!(measurement.series.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_supersedes_old_samplers() {
        let measurement = Arc::new(Measurement::new());
        let probe = Arc::new(FixedProbe::new(1.0, 1.0));

        let first = start_sampling(&measurement, probe.clone(), &config());
        let second = start_sampling(&measurement, probe.clone(), &config());
        assert!(second.generation() > first.generation());

        // The first generation exits on its own while the second keeps running.
        first.join().await;
        assert!(measurement.monitoring.is_active());

        measurement.marker.set("k");
        tokio::time::sleep(Duration::from_millis(1000)).await;
        measurement.marker.clear();
        measurement.monitoring.stop();
        second.join().await;

        let series = measurement.series.take("k").unwrap();
        // A single resource sampler at 100ms yields about ten samples.
        assert!(series.cpu.len() <= 11, "got {} cpu samples", series.cpu.len());
    }
}
