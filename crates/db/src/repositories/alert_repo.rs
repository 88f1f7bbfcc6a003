//! Repository for the `active_critical_alerts` table.
//!
//! The reconciler applies its plan here in a single transaction, in
//! open -> refresh -> close order so a persisting alert never has a visible
//! gap. `alert_started_at` is only ever written on open; refreshes touch
//! `last_updated_at` and the measurement/location columns.

use std::collections::HashSet;

use sqlx::PgPool;

use rackwatch_core::reconcile::{AlertKey, DesiredAlert, ReconcilePlan};
use rackwatch_core::types::Timestamp;

use crate::models::alert::{ActiveAlert, AlertFilter, ReconcileOutcome};

/// Column list for `active_critical_alerts` queries.
const COLUMNS: &str = "\
    id, pdu_id, rack_id, name, country, site, dc, phase, chain, node, serial, \
    alert_type, metric_type, alert_reason, alert_value, alert_field, \
    threshold_exceeded, alert_started_at, last_updated_at";

/// Provides reads and the transactional plan application for active alerts.
pub struct AlertRepo;

impl AlertRepo {
    // ── Queries ──────────────────────────────────────────────────────────

    /// List alerts matching the optional filters, most recent first.
    pub async fn list(pool: &PgPool, filter: &AlertFilter) -> Result<Vec<ActiveAlert>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM active_critical_alerts \
             WHERE ($1::text IS NULL OR metric_type = $1) \
               AND ($2::text IS NULL OR site = $2) \
               AND ($3::text IS NULL OR dc = $3) \
             ORDER BY alert_started_at DESC"
        );
        sqlx::query_as::<_, ActiveAlert>(&query)
            .bind(&filter.metric_type)
            .bind(&filter.site)
            .bind(&filter.dc)
            .fetch_all(pool)
            .await
    }

    /// The set of persisted alert keys, as consumed by the planner.
    pub async fn current_keys(pool: &PgPool) -> Result<HashSet<AlertKey>, sqlx::Error> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT pdu_id, metric_type, alert_reason FROM active_critical_alerts",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(pdu_id, metric_type, alert_reason)| AlertKey {
                pdu_id,
                metric_type,
                alert_reason,
            })
            .collect())
    }

    /// Count alerts whose `last_updated_at` is older than `cutoff`.
    ///
    /// Rows age like this when evaluation cycles keep failing; the
    /// housekeeping job surfaces the count as a warning.
    pub async fn count_stale(pool: &PgPool, cutoff: Timestamp) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM active_critical_alerts WHERE last_updated_at < $1",
        )
        .bind(cutoff)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }

    // ── Plan application ─────────────────────────────────────────────────

    /// Apply a reconciliation plan in one transaction.
    ///
    /// Open uses the table's unique key as an upsert target so that two
    /// racing applications converge instead of failing; the conflict arm
    /// deliberately leaves `alert_started_at` untouched.
    pub async fn apply_plan(
        pool: &PgPool,
        plan: &ReconcilePlan,
        now: Timestamp,
    ) -> Result<ReconcileOutcome, sqlx::Error> {
        let mut outcome = ReconcileOutcome::default();
        if plan.is_empty() {
            return Ok(outcome);
        }

        let mut tx = pool.begin().await?;

        for alert in &plan.to_open {
            Self::upsert_one(&mut tx, alert, now).await?;
            outcome.opened += 1;
        }

        for alert in &plan.to_refresh {
            let result = sqlx::query(
                "UPDATE active_critical_alerts SET
                    rack_id = $4, name = $5, country = $6, site = $7, dc = $8,
                    phase = $9, chain = $10, node = $11, serial = $12,
                    alert_value = $13, alert_field = $14, threshold_exceeded = $15,
                    last_updated_at = $16
                 WHERE pdu_id = $1 AND metric_type = $2 AND alert_reason = $3",
            )
            .bind(&alert.key.pdu_id)
            .bind(&alert.key.metric_type)
            .bind(&alert.key.alert_reason)
            .bind(&alert.rack_id)
            .bind(&alert.name)
            .bind(&alert.country)
            .bind(&alert.site)
            .bind(&alert.dc)
            .bind(&alert.phase)
            .bind(&alert.chain)
            .bind(&alert.node)
            .bind(&alert.serial)
            .bind(alert.alert_value)
            .bind(&alert.alert_field)
            .bind(alert.threshold_exceeded)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            outcome.refreshed += result.rows_affected();
        }

        for key in &plan.to_close {
            let result = sqlx::query(
                "DELETE FROM active_critical_alerts \
                 WHERE pdu_id = $1 AND metric_type = $2 AND alert_reason = $3",
            )
            .bind(&key.pdu_id)
            .bind(&key.metric_type)
            .bind(&key.alert_reason)
            .execute(&mut *tx)
            .await?;
            outcome.closed += result.rows_affected();
        }

        tx.commit().await?;
        tracing::debug!(
            opened = outcome.opened,
            refreshed = outcome.refreshed,
            closed = outcome.closed,
            "Alert reconciliation plan applied"
        );
        Ok(outcome)
    }

    /// Insert one desired alert, converging on the unique key.
    async fn upsert_one(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        alert: &DesiredAlert,
        now: Timestamp,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO active_critical_alerts (
                pdu_id, rack_id, name, country, site, dc, phase, chain, node, serial,
                metric_type, alert_reason, alert_value, alert_field, threshold_exceeded,
                alert_started_at, last_updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16)
             ON CONFLICT (pdu_id, metric_type, alert_reason) DO UPDATE SET
                rack_id = EXCLUDED.rack_id,
                name = EXCLUDED.name,
                country = EXCLUDED.country,
                site = EXCLUDED.site,
                dc = EXCLUDED.dc,
                phase = EXCLUDED.phase,
                chain = EXCLUDED.chain,
                node = EXCLUDED.node,
                serial = EXCLUDED.serial,
                alert_value = EXCLUDED.alert_value,
                alert_field = EXCLUDED.alert_field,
                threshold_exceeded = EXCLUDED.threshold_exceeded,
                last_updated_at = EXCLUDED.last_updated_at",
        )
        .bind(&alert.key.pdu_id)
        .bind(&alert.rack_id)
        .bind(&alert.name)
        .bind(&alert.country)
        .bind(&alert.site)
        .bind(&alert.dc)
        .bind(&alert.phase)
        .bind(&alert.chain)
        .bind(&alert.node)
        .bind(&alert.serial)
        .bind(&alert.key.metric_type)
        .bind(&alert.key.alert_reason)
        .bind(alert.alert_value)
        .bind(&alert.alert_field)
        .bind(alert.threshold_exceeded)
        .bind(now)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
