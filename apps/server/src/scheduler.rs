//! Background maintenance tasks.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::main_lib::AppState;

/// Periodically drop idle rate-limiter entries.
///
/// Runs once per rate-limit window; a client is dropped after two idle windows.
pub fn start_rate_limit_sweeper(state: Arc<AppState>) -> JoinHandle<()> {
    let period = state.rate_limiter.config().window;
    tokio::spawn(async move {
        info!(period = ?period, "Rate limiter sweeper started");

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let dropped = state.rate_limiter.sweep().await;
            if dropped > 0 {
                debug!(dropped, "Swept idle rate-limit entries");
            }
        }
    })
}
