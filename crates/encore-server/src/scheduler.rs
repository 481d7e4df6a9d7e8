use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::MissedTickBehavior;

use crate::registry::SessionRegistry;

/// Tick period. Well below the emission threshold, so cadence is set by the
/// threshold and not by tick granularity.
pub const TICK_PERIOD: Duration = Duration::from_millis(1);

/// Drive all registered sessions until the process exits.
///
/// Sessions advance by measured wall-clock time between passes, not the
/// nominal period, so scheduling jitter does not distort playback speed.
pub async fn run(registry: Arc<SessionRegistry>) {
    let mut ticker = tokio::time::interval(TICK_PERIOD);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last = Instant::now();
    loop {
        ticker.tick().await;
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;
        registry.advance_all(dt).await;
    }
}
