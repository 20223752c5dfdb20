#![warn(missing_docs)]
//! StoreBench Core - Measurement Runtime
//!
//! This crate provides what runs inside a benchmarking instance:
//! - the host store seen through the async [`StateStore`] trait
//! - process resource probes
//! - background samplers for CPU, memory and scheduler lag
//! - the three-phase [`Workload`] contract and the built-in workloads

mod error;
mod host;
mod measure;
mod memory;
mod probe;
pub mod sampling;
mod workload;
pub mod workloads;

pub use error::{HostError, WorkloadError};
pub use host::{ObjectKind, StateChange, StateStore, StateValue, StoreObject, pattern_matches};
pub use measure::{Timer, as_millis, as_secs};
pub use memory::MemoryStore;
pub use probe::{FixedProbe, ResourceProbe, ResourceSample, SysinfoProbe};
pub use sampling::{
    ActiveMarker, Measurement, Monitoring, SampleSeries, SamplerConfig, Samplers, SeriesStore,
    start_sampling,
};
pub use workload::{
    Workload, WorkloadContext, WorkloadDef, WorkloadEntry, WorkloadFactory, WorkloadRegistry,
};

/// Anchor to prevent LTO from stripping inventory entries
#[used]
#[doc(hidden)]
pub static REGISTRY_ANCHOR: fn() = || {
    for _ in inventory::iter::<WorkloadDef> {}
};
