//! Scheduler Lag Sampler
//!
//! Sleeps for a target interval and reports how late the wake-up was. Blocking
//! work on the runtime thread shows up as lag. The task re-arms after every
//! reading while `is_active` holds, so one last reading may arrive after
//! deactivation.

use crate::measure::as_millis;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

/// Spawn a lag sampler on the current runtime
///
/// `on_lag` receives `max(0, actual - interval)` in milliseconds.
pub fn spawn_lag_sampler<A, F>(interval: Duration, is_active: A, mut on_lag: F) -> JoinHandle<()>
where
    A: Fn() -> bool + Send + 'static,
    F: FnMut(f64) + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            let start = Instant::now();
            tokio::time::sleep(interval).await;
            let lag = start.elapsed().saturating_sub(interval);
            on_lag(as_millis(lag));
            if !is_active() {
                break;
            }
        }
    })
}
