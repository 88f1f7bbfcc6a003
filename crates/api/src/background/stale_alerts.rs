//! Periodic staleness check on the active-alert table.
//!
//! When evaluation cycles keep failing (upstream outage, storage trouble),
//! alert rows stop being refreshed and their `last_updated_at` ages. This
//! job counts rows older than a multiple of the cycle interval and logs a
//! warning so operators notice the data is no longer live.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use rackwatch_db::repositories::AlertRepo;

/// An alert is considered stale after this many missed cycles.
const STALE_AFTER_CYCLES: i64 = 10;

/// How often the staleness check runs.
const CHECK_INTERVAL: Duration = Duration::from_secs(300); // 5 minutes

/// Run the staleness-check loop until `cancel` is triggered.
pub async fn run(pool: PgPool, cycle_interval_secs: u64, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = CHECK_INTERVAL.as_secs(),
        stale_after_cycles = STALE_AFTER_CYCLES,
        "Stale-alert check started"
    );

    let mut interval = tokio::time::interval(CHECK_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Stale-alert check stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now()
                    - chrono::Duration::seconds(cycle_interval_secs as i64 * STALE_AFTER_CYCLES);
                match AlertRepo::count_stale(&pool, cutoff).await {
                    Ok(0) => {
                        tracing::debug!("Stale-alert check: all alerts current");
                    }
                    Ok(stale) => {
                        tracing::warn!(
                            stale,
                            "Active alerts have not been refreshed recently; evaluation may be failing"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Stale-alert check failed");
                    }
                }
            }
        }
    }
}
