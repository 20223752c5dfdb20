//! Run Reporting
//!
//! Turns the outcome of one orchestrator run into a [`Report`]: completed
//! workloads carry their persisted summary, the workload that aborted the run
//! carries its failure, and everything that never ran is marked skipped.

mod formatting;
mod metadata;

pub use formatting::format_human_output;
pub use metadata::{build_report_meta, collect_system_info};

use crate::orchestrator::{OrchestratorError, Phase, WorkloadOutcome};
use crate::planner::ExecutionPlan;
use storebench_report::{
    FailureInfo, Report, ReportMeta, ReportSummary, WorkloadReportResult, WorkloadStatus,
};

/// Assemble the report of one run.
///
/// `plan.workloads` is the run order; `plan.skipped` lists workloads that
/// were never scheduled.
pub fn build_report(
    meta: ReportMeta,
    plan: &ExecutionPlan,
    outcomes: &[WorkloadOutcome],
    error: Option<&OrchestratorError>,
    total_duration_ms: f64,
) -> Report {
    let failed = error.map(|e| match e.failed_workload() {
        Some((id, phase)) => (Some(id.to_string()), phase.to_string()),
        None => (None, Phase::Setup.to_string()),
    });
    // A run-level failure is charged to the first workload that has no summary.
    let first_pending = plan
        .workloads
        .iter()
        .find(|id| !outcomes.iter().any(|o| &o.id == *id))
        .cloned();

    let mut results = Vec::with_capacity(plan.workloads.len() + plan.skipped.len());
    for id in &plan.workloads {
        if let Some(outcome) = outcomes.iter().find(|o| &o.id == id) {
            results.push(WorkloadReportResult {
                id: id.clone(),
                status: WorkloadStatus::Completed,
                summary: Some(outcome.summary.clone()),
                failure: None,
            });
            continue;
        }

        let failure = match (&failed, error) {
            (Some((Some(failed_id), phase)), Some(e)) if failed_id == id => Some(FailureInfo {
                phase: phase.clone(),
                message: e.to_string(),
            }),
            (Some((None, phase)), Some(e)) if first_pending.as_ref() == Some(id) => {
                Some(FailureInfo {
                    phase: phase.clone(),
                    message: e.to_string(),
                })
            }
            _ => None,
        };
        let status = if failure.is_some() {
            WorkloadStatus::Failed
        } else {
            WorkloadStatus::Skipped
        };
        results.push(WorkloadReportResult {
            id: id.clone(),
            status,
            summary: None,
            failure,
        });
    }

    results.extend(plan.skipped.iter().map(|id| WorkloadReportResult {
        id: id.clone(),
        status: WorkloadStatus::Skipped,
        summary: None,
        failure: None,
    }));

    let summary = ReportSummary::from_results(&results, total_duration_ms);
    Report {
        meta,
        results,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::OrchestratorConfig;
    use storebench_core::{HostError, WorkloadError};
    use storebench_stats::{SeriesView, ThroughputFormula, reduce_series};

    fn plan(workloads: &[&str], skipped: &[&str]) -> ExecutionPlan {
        ExecutionPlan {
            workloads: workloads.iter().map(|s| s.to_string()).collect(),
            skipped: skipped.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn outcome(id: &str) -> WorkloadOutcome {
        WorkloadOutcome {
            id: id.to_string(),
            summary: reduce_series(
                SeriesView {
                    time: &[0.5],
                    cpu: &[1.0],
                    mem: &[2.0],
                    lag: &[0.0],
                },
                100,
                1,
                ThroughputFormula::Compatible,
            ),
            epoch_times: vec![0.5],
        }
    }

    fn meta() -> ReportMeta {
        build_report_meta(&OrchestratorConfig::default())
    }

    #[test]
    fn test_completed_run() {
        let report = build_report(
            meta(),
            &plan(&["idle", "setStates"], &["secondaryStates"]),
            &[outcome("idle"), outcome("setStates")],
            None,
            10.0,
        );
        assert_eq!(report.summary.completed, 2);
        assert_eq!(report.summary.skipped, 1);
        assert_eq!(report.summary.failed, 0);
        let idle = report.result("idle").unwrap();
        assert_eq!(idle.summary.as_ref().unwrap().actions_per_second_mean, 200.0);
    }

    #[test]
    fn test_workload_failure() {
        let error = OrchestratorError::Workload {
            id: "setStates".to_string(),
            phase: Phase::Execute,
            source: WorkloadError::Invalid("boom".to_string()),
        };
        let report = build_report(
            meta(),
            &plan(&["idle", "setStates", "setObjects"], &[]),
            &[outcome("idle")],
            Some(&error),
            10.0,
        );
        let failed = report.result("setStates").unwrap();
        assert_eq!(failed.status, WorkloadStatus::Failed);
        assert_eq!(failed.failure.as_ref().unwrap().phase, "execute");
        assert_eq!(
            report.result("setObjects").unwrap().status,
            WorkloadStatus::Skipped
        );
        assert_eq!(report.summary.completed, 1);
        assert_eq!(report.summary.failed, 1);
    }

    #[test]
    fn test_run_level_failure_charged_to_first_pending() {
        let error = OrchestratorError::Store(HostError::Unavailable("disk full".to_string()));
        let report = build_report(
            meta(),
            &plan(&["idle", "setStates"], &[]),
            &[outcome("idle")],
            Some(&error),
            10.0,
        );
        let failed = report.result("setStates").unwrap();
        assert_eq!(failed.status, WorkloadStatus::Failed);
        assert_eq!(failed.failure.as_ref().unwrap().phase, "setup");
    }
}
