//! Summary Statistics
//!
//! Reduces the series collected for one workload into a `SummaryState`:
//! - time, cpu, memory and scheduler lag reduced to mean / population std
//! - every field rounded to two decimals
//! - throughput (actions per second) derived from the configured iteration count
//!
//! Remote instances are reduced the same way, with their throughput divided by
//! the number of reporting instances since the workload is split evenly between them.

use crate::stats::{mean, round2, std};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Borrowed view over the four parallel series of one measurement key
#[derive(Debug, Clone, Copy, Default)]
pub struct SeriesView<'a> {
    /// Elapsed seconds per epoch
    pub time: &'a [f64],
    /// CPU usage samples in percent
    pub cpu: &'a [f64],
    /// Resident memory samples in bytes
    pub mem: &'a [f64],
    /// Scheduler lag samples in milliseconds
    pub lag: &'a [f64],
}

/// Series accumulated from one remote instance's monitoring reports
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteSeries {
    /// Elapsed seconds per measuring session
    pub time: Vec<f64>,
    /// CPU usage samples in percent
    pub cpu_stats: Vec<f64>,
    /// Memory samples in bytes
    pub mem_stats: Vec<f64>,
    /// Scheduler lag samples in milliseconds
    pub event_loop_lags: Vec<f64>,
}

impl RemoteSeries {
    /// Append another report's samples (concatenation, no deduplication)
    pub fn merge(&mut self, other: RemoteSeries) {
        self.time.extend(other.time);
        self.cpu_stats.extend(other.cpu_stats);
        self.mem_stats.extend(other.mem_stats);
        self.event_loop_lags.extend(other.event_loop_lags);
    }

    /// Borrow as a `SeriesView` for reduction
    pub fn view(&self) -> SeriesView<'_> {
        SeriesView {
            time: &self.time,
            cpu: &self.cpu_stats,
            mem: &self.mem_stats,
            lag: &self.event_loop_lags,
        }
    }
}

/// How `actionsPerSecondStd` is derived from the time series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThroughputFormula {
    /// `iterations / timeStd`, kept for compatibility with published summaries
    #[default]
    Compatible,
    /// First-order propagated spread: `iterations * timeStd / timeMean^2`
    Derived,
}

/// Persisted summary of one workload across all epochs
///
/// Serialized with camelCase keys. NaN fields (empty series) serialize as
/// `null` and read back as NaN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryState {
    /// Mean elapsed seconds per epoch
    #[serde(deserialize_with = "nan_from_null")]
    pub time_mean: f64,
    /// Population std of elapsed seconds
    #[serde(deserialize_with = "nan_from_null")]
    pub time_std: f64,
    /// Mean CPU usage in percent
    #[serde(deserialize_with = "nan_from_null")]
    pub cpu_mean: f64,
    /// Population std of CPU usage
    #[serde(deserialize_with = "nan_from_null")]
    pub cpu_std: f64,
    /// Mean memory in bytes
    #[serde(deserialize_with = "nan_from_null")]
    pub mem_mean: f64,
    /// Population std of memory
    #[serde(deserialize_with = "nan_from_null")]
    pub mem_std: f64,
    /// Mean scheduler lag in milliseconds
    #[serde(deserialize_with = "nan_from_null")]
    pub event_loop_lag_mean: f64,
    /// Population std of scheduler lag
    #[serde(deserialize_with = "nan_from_null")]
    pub event_loop_lag_std: f64,
    /// Iterations divided by mean epoch time
    #[serde(deserialize_with = "nan_from_null")]
    pub actions_per_second_mean: f64,
    /// Throughput spread, see `ThroughputFormula`
    #[serde(deserialize_with = "nan_from_null")]
    pub actions_per_second_std: f64,
    /// Per-secondary summaries keyed by instance id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondaries: Option<BTreeMap<String, SummaryState>>,
}

fn nan_from_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// Reduce one key's series to a `SummaryState`.
///
/// `split` is the number of instances the workload was divided between
/// (1 for the local instance); throughput is divided by it.
pub fn reduce_series(
    series: SeriesView<'_>,
    iterations: u64,
    split: usize,
    formula: ThroughputFormula,
) -> SummaryState {
    let time_mean = mean(series.time);
    let time_std = std(series.time);
    let iterations = iterations as f64;
    let split = split.max(1) as f64;

    let actions_per_second_mean = iterations / time_mean / split;
    let actions_per_second_std = match formula {
        ThroughputFormula::Compatible if time_std != 0.0 => iterations / time_std / split,
        ThroughputFormula::Derived if time_std != 0.0 && time_mean != 0.0 => {
            iterations * time_std / time_mean.powi(2) / split
        }
        _ => 0.0,
    };

    SummaryState {
        time_mean: round2(time_mean),
        time_std: round2(time_std),
        cpu_mean: round2(mean(series.cpu)),
        cpu_std: round2(std(series.cpu)),
        mem_mean: round2(mean(series.mem)),
        mem_std: round2(std(series.mem)),
        event_loop_lag_mean: round2(mean(series.lag)),
        event_loop_lag_std: round2(std(series.lag)),
        actions_per_second_mean: round2(actions_per_second_mean),
        actions_per_second_std: round2(actions_per_second_std),
        secondaries: None,
    }
}

/// Reduce every reporting remote instance.
///
/// Returns `None` when nothing was reported so the persisted summary carries
/// no `secondaries` key at all.
pub fn aggregate_secondaries(
    remotes: &BTreeMap<String, RemoteSeries>,
    iterations: u64,
    formula: ThroughputFormula,
) -> Option<BTreeMap<String, SummaryState>> {
    if remotes.is_empty() {
        return None;
    }

    let split = remotes.len();
    Some(
        remotes
            .iter()
            .map(|(id, series)| {
                (
                    id.clone(),
                    reduce_series(series.view(), iterations, split, formula),
                )
            })
            .collect(),
    )
}

impl SummaryState {
    /// Whether every scalar field is a real number
    pub fn is_complete(&self) -> bool {
        [
            self.time_mean,
            self.time_std,
            self.cpu_mean,
            self.cpu_std,
            self.mem_mean,
            self.mem_std,
            self.event_loop_lag_mean,
            self.event_loop_lag_std,
            self.actions_per_second_mean,
            self.actions_per_second_std,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}
