use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use corral_domain::HibernationSweeper;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Periodic driver for the hibernation sweep.
///
/// Ticks on a fixed interval and runs each sweep on the blocking pool so
/// the serving runtime never waits on the store. A failing sweep is logged
/// and the next tick runs as usual.
pub struct HibernationMonitor {
    sweeper: Arc<HibernationSweeper>,
    sweep_interval: Duration,
}

impl HibernationMonitor {
    pub fn new(sweeper: Arc<HibernationSweeper>, sweep_interval: Duration) -> Self {
        Self {
            sweeper,
            sweep_interval,
        }
    }

    /// Run the sweep loop until the token fires.
    pub async fn run(self, cancellation_token: CancellationToken) -> anyhow::Result<()> {
        info!(
            interval_ms = self.sweep_interval.as_millis() as u64,
            "Hibernation monitor started"
        );
        let mut interval = tokio::time::interval(self.sweep_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancellation_token.cancelled() => {
                    info!("Hibernation monitor received cancellation signal");
                    break;
                }
                _ = interval.tick() => {
                    let sweeper = self.sweeper.clone();
                    let now_ms = Utc::now().timestamp_millis();
                    match tokio::task::spawn_blocking(move || sweeper.sweep_once(now_ms)).await {
                        Ok(Ok(flipped)) => {
                            if flipped > 0 {
                                debug!(flipped, "Hibernation sweep finished");
                            }
                        }
                        Ok(Err(e)) => error!(error = %e, "Hibernation sweep failed"),
                        Err(e) => error!(error = %e, "Hibernation sweep task failed"),
                    }
                }
            }
        }

        Ok(())
    }
}
