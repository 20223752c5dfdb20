//! Sample Series Storage
//!
//! Keyed accumulators for the four parallel series. Samplers append, the
//! orchestrator takes a key's series out for reduction.

use crate::probe::ResourceSample;
use fxhash::FxHashMap;
use parking_lot::Mutex;
use storebench_ipc::MonitoringReport;
use storebench_stats::SeriesView;

/// Four parallel series collected for one key
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    /// Elapsed seconds per epoch (or per measuring session)
    pub time: Vec<f64>,
    /// CPU usage samples in percent
    pub cpu: Vec<f64>,
    /// Memory samples in bytes
    pub mem: Vec<f64>,
    /// Scheduler lag samples in milliseconds
    pub lag: Vec<f64>,
}

impl SampleSeries {
    /// Borrow for reduction
    pub fn view(&self) -> SeriesView<'_> {
        SeriesView {
            time: &self.time,
            cpu: &self.cpu,
            mem: &self.mem,
            lag: &self.lag,
        }
    }

    /// Convert into the wire report sent to a primary
    pub fn into_report(self) -> MonitoringReport {
        MonitoringReport {
            time: self.time,
            cpu_stats: self.cpu,
            mem_stats: self.mem,
            event_loop_lags: self.lag,
        }
    }
}

/// Series for every key currently being measured
#[derive(Debug, Default)]
pub struct SeriesStore {
    inner: Mutex<FxHashMap<String, SampleSeries>>,
}

impl SeriesStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh, empty series for `key` (discarding any previous one)
    pub fn init(&self, key: &str) {
        self.inner
            .lock()
            .insert(key.to_string(), SampleSeries::default());
    }

    /// Append a resource reading
    pub fn push_resource(&self, key: &str, sample: ResourceSample) {
        let mut inner = self.inner.lock();
        let series = inner.entry(key.to_string()).or_default();
        series.cpu.push(sample.cpu);
        series.mem.push(sample.memory);
    }

    /// Append a scheduler lag reading in milliseconds
    pub fn push_lag(&self, key: &str, lag_ms: f64) {
        self.inner
            .lock()
            .entry(key.to_string())
            .or_default()
            .lag
            .push(lag_ms);
    }

    /// Append an epoch duration in seconds
    pub fn push_time(&self, key: &str, secs: f64) {
        self.inner
            .lock()
            .entry(key.to_string())
            .or_default()
            .time
            .push(secs);
    }

    /// Copy of the series for `key`
    pub fn snapshot(&self, key: &str) -> Option<SampleSeries> {
        self.inner.lock().get(key).cloned()
    }

    /// Remove and return the series for `key`
    pub fn take(&self, key: &str) -> Option<SampleSeries> {
        self.inner.lock().remove(key)
    }

    /// Drop every series
    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Number of keys held
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether no key is held
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}
