//! Resource Sampler
//!
//! Polls a [`ResourceProbe`] for the host process while monitoring is active
//! and appends readings under the key the marker names at the time the probe
//! returns.

use super::Measurement;
use crate::probe::ResourceProbe;
use std::sync::Arc;
use tokio::time::Duration;

/// Run the sampling loop until monitoring stops or a newer session starts
pub async fn run_resource_sampler(
    measurement: Arc<Measurement>,
    probe: Arc<dyn ResourceProbe>,
    pid: u32,
    interval: Duration,
    generation: u64,
) {
    while measurement.monitoring.is_active_for(generation) {
        match probe.sample(pid).await {
            Ok(sample) => {
                if let Some(key) = measurement.marker.get() {
                    measurement.series.push_resource(&key, sample);
                }
            }
            Err(e) => {
                tracing::warn!(pid, error = %e, "resource probe failed, skipping sample");
            }
        }
        tokio::time::sleep(interval).await;
    }
    tracing::trace!(generation, "resource sampler stopped");
}
