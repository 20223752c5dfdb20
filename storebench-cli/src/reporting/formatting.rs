//! Output Formatting
//!
//! Human-readable rendering of a run report: one block per workload with
//! status icon (✓/✗/⊘), timing, throughput, resource and lag statistics,
//! followed by a per-secondary table when secondaries reported.

use storebench_report::{Report, WorkloadStatus};
use storebench_stats::SummaryState;

/// Format a report for terminal display
pub fn format_human_output(report: &Report) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("StoreBench Results\n");
    output.push_str(&"=".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "  instance: {}  iterations: {}  epochs: {}\n\n",
        report.meta.instance, report.meta.config.iterations, report.meta.config.epochs
    ));

    for result in &report.results {
        let status_icon = match result.status {
            WorkloadStatus::Completed => "✓",
            WorkloadStatus::Failed => "✗",
            WorkloadStatus::Skipped => "⊘",
        };
        output.push_str(&format!("  {} {}\n", status_icon, result.id));

        if let Some(summary) = &result.summary {
            push_summary(&mut output, summary);

            if let Some(secondaries) = &summary.secondaries {
                let width = secondaries.keys().map(|k| k.len()).max().unwrap_or(12);
                output.push_str(&format!(
                    "      {:<width$}  {:>12}  {:>10}  {:>12}\n",
                    "secondary",
                    "actions/s",
                    "cpu %",
                    "mem MB",
                    width = width
                ));
                for (instance, remote) in secondaries {
                    output.push_str(&format!(
                        "      {:<width$}  {:>12}  {:>10}  {:>12}\n",
                        instance,
                        number(remote.actions_per_second_mean),
                        number(remote.cpu_mean),
                        number(remote.mem_mean / 1024.0 / 1024.0),
                        width = width
                    ));
                }
            }
        }

        if let Some(failure) = &result.failure {
            output.push_str(&format!(
                "      error ({}): {}\n",
                failure.phase, failure.message
            ));
        }

        output.push('\n');
    }

    output.push_str("Summary\n");
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "  Total: {}  Completed: {}  Failed: {}  Skipped: {}\n",
        report.summary.total_workloads,
        report.summary.completed,
        report.summary.failed,
        report.summary.skipped
    ));
    output.push_str(&format!(
        "  Duration: {:.2} ms\n",
        report.summary.total_duration_ms
    ));

    output
}

fn push_summary(output: &mut String, summary: &SummaryState) {
    output.push_str(&format!(
        "      time: {} s ± {} s  throughput: {} ± {} actions/s\n",
        number(summary.time_mean),
        number(summary.time_std),
        number(summary.actions_per_second_mean),
        number(summary.actions_per_second_std)
    ));
    output.push_str(&format!(
        "      cpu: {} % ± {}  mem: {} MB ± {}\n",
        number(summary.cpu_mean),
        number(summary.cpu_std),
        number(summary.mem_mean / 1024.0 / 1024.0),
        number(summary.mem_std / 1024.0 / 1024.0)
    ));
    output.push_str(&format!(
        "      lag: {} ms ± {} ms\n",
        number(summary.event_loop_lag_mean),
        number(summary.event_loop_lag_std)
    ));
}

/// Two decimals, or `-` when the statistic is undefined
fn number(value: f64) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{:.2}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::OrchestratorConfig;
    use crate::reporting::build_report_meta;
    use storebench_report::{FailureInfo, ReportSummary, WorkloadReportResult};
    use storebench_stats::{SeriesView, ThroughputFormula, reduce_series};

    fn report() -> Report {
        let summary = reduce_series(
            SeriesView {
                time: &[0.5, 0.5],
                cpu: &[10.0, 20.0],
                mem: &[1048576.0, 1048576.0],
                lag: &[],
            },
            100,
            1,
            ThroughputFormula::Compatible,
        );
        let results = vec![
            WorkloadReportResult {
                id: "idle".to_string(),
                status: WorkloadStatus::Completed,
                summary: Some(summary),
                failure: None,
            },
            WorkloadReportResult {
                id: "setStates".to_string(),
                status: WorkloadStatus::Failed,
                summary: None,
                failure: Some(FailureInfo {
                    phase: "prepare".to_string(),
                    message: "store unavailable".to_string(),
                }),
            },
        ];
        let summary = ReportSummary::from_results(&results, 42.0);
        Report {
            meta: build_report_meta(&OrchestratorConfig::default()),
            results,
            summary,
        }
    }

    #[test]
    fn test_format_human_output() {
        let output = format_human_output(&report());
        assert!(output.contains("✓ idle"));
        assert!(output.contains("throughput: 200.00"));
        assert!(output.contains("mem: 1.00 MB"));
        assert!(output.contains("lag: - ms"));
        assert!(output.contains("✗ setStates"));
        assert!(output.contains("error (prepare): store unavailable"));
        assert!(output.contains("Completed: 1  Failed: 1"));
    }
}
