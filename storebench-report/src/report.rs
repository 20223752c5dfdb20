//! Report Data Structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storebench_stats::SummaryState;

/// Complete run report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Run metadata
    pub meta: ReportMeta,
    /// One entry per planned or skipped workload, in plan order
    pub results: Vec<WorkloadReportResult>,
    /// Status tally
    pub summary: ReportSummary,
}

impl Report {
    /// Result for one workload id
    pub fn result(&self, id: &str) -> Option<&WorkloadReportResult> {
        self.results.iter().find(|r| r.id == id)
    }
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// JSON schema version
    pub schema_version: u32,
    /// StoreBench version
    pub version: String,
    /// Report generation time
    pub timestamp: DateTime<Utc>,
    /// Instance id that ran the benchmark (`benchmark.0`)
    pub instance: String,
    /// Host the run executed on
    pub system: SystemInfo,
    /// Effective run settings
    pub config: ReportConfig,
}

/// Run configuration captured in report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Operations per epoch
    pub iterations: u64,
    /// Timed repetitions per workload
    pub epochs: u32,
    /// Pause between epochs
    pub cooldown_ms: u64,
    /// Resource sampler period
    pub sample_interval_ms: u64,
    /// Lag sampler period
    pub lag_interval_ms: u64,
    /// Whether other instances were disabled during the run
    pub isolated_run: bool,
    /// Secondary instance ids
    pub secondaries: Vec<String>,
    /// `compatible` or `derived`
    pub throughput_formula: String,
}

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// Operating system version
    pub os_version: String,
    /// CPU brand string
    pub cpu: String,
    /// Logical core count
    pub cpu_cores: u32,
    /// Total memory in GiB
    pub memory_gb: f64,
}

/// Individual workload result in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadReportResult {
    /// Workload id
    pub id: String,
    /// Outcome
    pub status: WorkloadStatus,
    /// Persisted summary, present when every epoch completed
    pub summary: Option<SummaryState>,
    /// Present when the workload failed
    pub failure: Option<FailureInfo>,
}

/// Workload outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadStatus {
    /// Every epoch ran and the summary was persisted
    Completed,
    /// A phase returned an error
    Failed,
    /// Not run
    Skipped,
}

/// Failure information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureInfo {
    /// Phase that failed (`prepare`, `execute`, `cleanup`, `setup`)
    pub phase: String,
    /// Error message
    pub message: String,
}

/// Report summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Number of results
    pub total_workloads: usize,
    /// Completed workloads
    pub completed: usize,
    /// Failed workloads
    pub failed: usize,
    /// Skipped workloads
    pub skipped: usize,
    /// Wall-clock duration of the run
    pub total_duration_ms: f64,
}

impl ReportSummary {
    /// Tally results
    pub fn from_results(results: &[WorkloadReportResult], total_duration_ms: f64) -> Self {
        let count = |status| results.iter().filter(|r| r.status == status).count();
        Self {
            total_workloads: results.len(),
            completed: count(WorkloadStatus::Completed),
            failed: count(WorkloadStatus::Failed),
            skipped: count(WorkloadStatus::Skipped),
            total_duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, status: WorkloadStatus) -> WorkloadReportResult {
        WorkloadReportResult {
            id: id.to_string(),
            status,
            summary: None,
            failure: None,
        }
    }

    #[test]
    fn test_summary_counts() {
        let results = vec![
            result("idle", WorkloadStatus::Completed),
            result("setStates", WorkloadStatus::Completed),
            result("delStates", WorkloadStatus::Failed),
            result("setObjects", WorkloadStatus::Skipped),
        ];
        let summary = ReportSummary::from_results(&results, 12.5);
        assert_eq!(summary.total_workloads, 4);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.skipped, 1);
    }
}
