#![warn(missing_docs)]
//! StoreBench Report - Run Reports
//!
//! Collects the per-workload summaries of one run together with run
//! metadata. Output formats:
//! - JSON (machine-readable, written next to the persisted summaries)
//! - Human (terminal output, rendered by the CLI)

mod json;
mod report;

pub use json::{SCHEMA_VERSION, generate_json_report, parse_json_report};
pub use report::{
    FailureInfo, Report, ReportConfig, ReportMeta, ReportSummary, SystemInfo,
    WorkloadReportResult, WorkloadStatus,
};

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable terminal output
    #[default]
    Human,
    /// JSON with full schema
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}
