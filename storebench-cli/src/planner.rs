//! Workload Planner
//!
//! Builds the execution plan by filtering workloads.
//!
//! Filtering options:
//! - Regex pattern matching on workload ID
//! - Regex exclusion on workload ID
//! - Distributed workloads are skipped when no secondary is configured
//!
//! Ordering: the registry's mapping order (ascending ID).

use storebench_core::WorkloadRegistry;

/// Execution plan for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    /// Workloads to run, in order
    pub workloads: Vec<String>,
    /// Workloads left out because they need secondaries
    pub skipped: Vec<String>,
}

/// Build execution plan from the registry
pub fn build_plan(
    registry: &WorkloadRegistry,
    filter: Option<&regex::Regex>,
    exclude: Option<&regex::Regex>,
    has_secondaries: bool,
) -> ExecutionPlan {
    let mut plan = ExecutionPlan::default();

    for entry in registry.iter() {
        if let Some(re) = filter {
            if !re.is_match(&entry.id) {
                continue;
            }
        }
        if let Some(re) = exclude {
            if re.is_match(&entry.id) {
                continue;
            }
        }
        if entry.distributed && !has_secondaries {
            plan.skipped.push(entry.id.clone());
            continue;
        }
        plan.workloads.push(entry.id.clone());
    }

    plan
}
