#![warn(missing_docs)]
//! StoreBench Statistical Engine
//!
//! Reduces the series collected during a run to summary statistics:
//! - Arithmetic mean and population standard deviation
//! - Two-decimal rounding (half away from zero)
//! - Per-workload `SummaryState` with throughput derived from iterations
//! - Aggregation of series reported by secondary instances

mod stats;
mod summary;

pub use stats::{mean, round2, std};
pub use summary::{
    RemoteSeries, SeriesView, SummaryState, ThroughputFormula, aggregate_secondaries,
    reduce_series,
};
