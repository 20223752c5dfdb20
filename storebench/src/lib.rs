#![warn(missing_docs)]
//! # StoreBench
//!
//! Benchmark harness for state and object store platforms.
//!
//! StoreBench runs named workloads against a store, samples CPU, memory and
//! scheduler lag while they execute, and persists a statistical summary per
//! workload under the instance namespace:
//! - **Workloads**: three-phase prepare / execute / cleanup contract, timed per epoch
//! - **Sampling**: resource and lag samplers attributing readings to the active workload
//! - **Isolated runs**: other enabled instances are disabled for the run and restored after
//! - **Distributed runs**: a primary drives load on secondaries and merges their measurements
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use storebench::prelude::*;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let orchestrator = Orchestrator::new(
//!     OrchestratorConfig::default(),
//!     WorkloadRegistry::builtin(),
//!     Arc::new(MemoryStore::new()),
//! );
//! for outcome in orchestrator.run().await? {
//!     println!("{}: {} actions/s", outcome.id, outcome.summary.actions_per_second_mean);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Workloads
//!
//! ```ignore
//! struct Noop;
//!
//! #[async_trait::async_trait]
//! impl Workload for Noop {
//!     async fn execute(&mut self) -> Result<(), WorkloadError> {
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = WorkloadRegistry::builtin();
//! registry.register("noop", "does nothing", |_| Box::new(Noop));
//! ```

// Re-export core types
pub use storebench_core::{
    HostError, Measurement, MemoryStore, ObjectKind, ResourceProbe, ResourceSample,
    SamplerConfig, StateChange, StateStore, StateValue, StoreObject, SysinfoProbe, Workload,
    WorkloadContext, WorkloadError, WorkloadRegistry,
};

// Re-export protocol types
pub use storebench_ipc::{
    Ack, Command, LoadAction, LoadRequest, LocalBus, Messenger, MonitoringReport, TcpMessenger,
};

// Re-export orchestration
pub use storebench_cli::{
    Dispatcher, Instance, Orchestrator, OrchestratorConfig, OrchestratorError, Role,
    StoreBenchConfig, WorkloadOutcome,
};

// Re-export reports and statistics
pub use storebench_report::{Report, WorkloadStatus};
pub use storebench_stats::{SummaryState, ThroughputFormula, mean, round2, std};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        MemoryStore, Orchestrator, OrchestratorConfig, StateStore, Workload, WorkloadContext,
        WorkloadError, WorkloadRegistry,
    };
}

/// Run the StoreBench command-line interface.
///
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     storebench::run()
/// }
/// ```
pub use storebench_cli::run;
