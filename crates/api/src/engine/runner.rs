//! The evaluation loop: a single-flight ticker around [`run_cycle`].
//!
//! Runs on its own task. Ticks that fire while a cycle is still in progress
//! are dropped (`MissedTickBehavior::Skip`), never queued, so at most one
//! cycle runs at a time. Shutdown is cooperative via a cancellation token.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use rackwatch_db::DbPool;

use super::evaluator::{run_cycle, CycleError};
use super::neng::NengClient;
use super::snapshot::SnapshotCell;

/// Run the evaluation loop until `cancel` is triggered.
pub async fn run(
    pool: DbPool,
    client: NengClient,
    cell: SnapshotCell,
    interval_secs: u64,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs, "Evaluation loop started");

    let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut cycle: u64 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Evaluation loop stopping");
                break;
            }
            _ = interval.tick() => {
                cycle += 1;
                match run_cycle(&pool, &client, &cell, cycle).await {
                    Ok(report) => {
                        tracing::info!(
                            cycle,
                            pdus = report.pdus,
                            suppressed_racks = report.suppressed_racks,
                            opened = report.outcome.opened,
                            refreshed = report.outcome.refreshed,
                            closed = report.outcome.closed,
                            "Evaluation cycle complete"
                        );
                    }
                    Err(CycleError::Fetch(e)) => {
                        // Active alerts stay untouched; the snapshot keeps
                        // serving the previous data flagged stale.
                        tracing::warn!(cycle, error = %e, "Upstream fetch failed, skipping reconciliation");
                        cell.mark_stale();
                    }
                    Err(CycleError::Database(e)) => {
                        tracing::error!(cycle, error = %e, "Evaluation cycle aborted on storage error");
                    }
                }
            }
        }
    }
}
