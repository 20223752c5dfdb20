//! Process Resource Probes
//!
//! Reads CPU usage and resident memory of a process. The default probe uses
//! `sysinfo`; `FixedProbe` returns constant readings for deterministic tests.

use crate::error::HostError;
use async_trait::async_trait;
use parking_lot::Mutex;
use sysinfo::{Pid, System};

/// One resource reading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSample {
    /// CPU usage in percent (may exceed 100 on multi-core hosts)
    pub cpu: f64,
    /// Resident memory in bytes
    pub memory: f64,
}

/// Source of per-process resource readings
#[async_trait]
pub trait ResourceProbe: Send + Sync {
    /// Current reading for the process `pid`
    async fn sample(&self, pid: u32) -> Result<ResourceSample, HostError>;
}

/// Probe backed by `sysinfo`
///
/// CPU usage is computed by sysinfo between two refreshes, so the first
/// reading of a process is 0.
pub struct SysinfoProbe {
    system: Mutex<System>,
}

impl SysinfoProbe {
    /// Create a probe with an empty process table
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceProbe for SysinfoProbe {
    async fn sample(&self, pid: u32) -> Result<ResourceSample, HostError> {
        let sys_pid = Pid::from_u32(pid);
        let mut system = self.system.lock();
        if !system.refresh_process(sys_pid) {
            return Err(HostError::ProcessNotFound(pid));
        }
        let process = system
            .process(sys_pid)
            .ok_or(HostError::ProcessNotFound(pid))?;
        Ok(ResourceSample {
            cpu: process.cpu_usage() as f64,
            memory: process.memory() as f64,
        })
    }
}

/// Probe returning a fixed reading and counting calls
#[derive(Debug)]
pub struct FixedProbe {
    sample: ResourceSample,
    calls: Mutex<u64>,
}

impl FixedProbe {
    /// Probe that always reports `cpu` percent and `memory` bytes
    pub fn new(cpu: f64, memory: f64) -> Self {
        Self {
            sample: ResourceSample { cpu, memory },
            calls: Mutex::new(0),
        }
    }

    /// Number of readings served so far
    pub fn calls(&self) -> u64 {
        *self.calls.lock()
    }
}

#[async_trait]
impl ResourceProbe for FixedProbe {
    async fn sample(&self, _pid: u32) -> Result<ResourceSample, HostError> {
        tokio::task::yield_now().await;
        *self.calls.lock() += 1;
        Ok(self.sample)
    }
}
