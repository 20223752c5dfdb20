//! Active Test Marker
//!
//! Names the key that samples are currently attributed to. The orchestrator
//! sets it right before `execute()` and clears it right after; samplers read
//! it when they append. Reads and writes are single short critical sections
//! and no ordering with the sampler ticks is implied: a sample taken while the
//! marker flips may be dropped or attributed to the neighbouring key.

use parking_lot::Mutex;
use std::sync::Arc;

/// Shared cell holding the key under measurement, if any
#[derive(Debug, Default)]
pub struct ActiveMarker {
    current: Mutex<Option<Arc<str>>>,
}

impl ActiveMarker {
    /// Marker with nothing under measurement
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute subsequent samples to `key`
    pub fn set(&self, key: &str) {
        *self.current.lock() = Some(Arc::from(key));
    }

    /// Stop attributing samples
    pub fn clear(&self) {
        *self.current.lock() = None;
    }

    /// Key under measurement, `None` when idle
    pub fn get(&self) -> Option<Arc<str>> {
        self.current.lock().clone()
    }

    /// Whether `key` is under measurement
    pub fn is(&self, key: &str) -> bool {
        self.current.lock().as_deref() == Some(key)
    }

    /// Whether nothing is under measurement
    pub fn is_idle(&self) -> bool {
        self.current.lock().is_none()
    }
}
