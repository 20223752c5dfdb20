//! Report Metadata
//!
//! Host details come from `sysinfo`; fields it cannot determine on the
//! current platform fall back to "Unknown" or 0.

use crate::orchestrator::OrchestratorConfig;
use chrono::Utc;
use storebench_report::{ReportConfig, ReportMeta, SCHEMA_VERSION, SystemInfo};
use storebench_stats::ThroughputFormula;
use sysinfo::System;

/// Build report metadata for a run with `config`
pub fn build_report_meta(config: &OrchestratorConfig) -> ReportMeta {
    let formula = match config.formula {
        ThroughputFormula::Compatible => "compatible",
        ThroughputFormula::Derived => "derived",
    };

    ReportMeta {
        schema_version: SCHEMA_VERSION,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        instance: config.namespace.clone(),
        system: collect_system_info(),
        config: ReportConfig {
            iterations: config.iterations,
            epochs: config.epochs,
            cooldown_ms: config.cooldown.as_millis() as u64,
            sample_interval_ms: config.sampler.interval.as_millis() as u64,
            lag_interval_ms: config.sampler.lag_interval.as_millis() as u64,
            isolated_run: config.isolated_run,
            secondaries: config.secondaries.clone(),
            throughput_formula: formula.to_string(),
        },
    }
}

/// Describe the host
pub fn collect_system_info() -> SystemInfo {
    let mut system = System::new();
    system.refresh_cpu();
    system.refresh_memory();

    let cpu = system
        .cpus()
        .first()
        .map(|c| c.brand().trim().to_string())
        .filter(|brand| !brand.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());
    let cpu_cores = match system.cpus().len() {
        0 => std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1),
        n => n as u32,
    };

    SystemInfo {
        os: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
        os_version: System::os_version().unwrap_or_else(|| std::env::consts::ARCH.to_string()),
        cpu,
        cpu_cores,
        memory_gb: system.total_memory() as f64 / 1024.0 / 1024.0 / 1024.0,
    }
}
