//! Repository for the `maintenance_entries` and `maintenance_rack_details`
//! tables.
//!
//! Start operations run in a transaction so an entry never exists without
//! its detail rows. The global unique constraint on detail `rack_id` is the
//! backstop for the one-active-entry-per-rack invariant; callers pre-check
//! with [`MaintenanceRepo::is_rack_suppressed`] to report a clean conflict.

use std::collections::HashSet;

use sqlx::PgPool;

use crate::models::maintenance::{
    ChainRackCandidate, ChainStartOutcome, MaintenanceEntry, MaintenanceEntryWithDetails,
    MaintenanceRackDetail, StartChainMaintenance, StartIndividualMaintenance,
    ENTRY_TYPE_CHAIN, ENTRY_TYPE_INDIVIDUAL_RACK,
};

/// Column list for `maintenance_entries` queries.
const ENTRY_COLUMNS: &str =
    "id, entry_type, rack_id, chain, site, dc, reason, started_by, started_at";

/// Column list for `maintenance_rack_details` queries.
const DETAIL_COLUMNS: &str = "id, entry_id, rack_id, country, site, dc, chain, created_at";

/// Provides the suppression-registry operations.
pub struct MaintenanceRepo;

impl MaintenanceRepo {
    // ── Queries ──────────────────────────────────────────────────────────

    /// Whether the rack appears in any detail row.
    pub async fn is_rack_suppressed(pool: &PgPool, rack_id: &str) -> Result<bool, sqlx::Error> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM maintenance_rack_details WHERE rack_id = $1")
                .bind(rack_id)
                .fetch_optional(pool)
                .await?;
        Ok(row.is_some())
    }

    /// The set of all suppressed rack ids, read fresh each evaluation cycle.
    pub async fn suppressed_set(pool: &PgPool) -> Result<HashSet<String>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT rack_id FROM maintenance_rack_details")
                .fetch_all(pool)
                .await?;
        Ok(rows.into_iter().map(|(rack_id,)| rack_id).collect())
    }

    /// List all entries with their detail rows, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<MaintenanceEntryWithDetails>, sqlx::Error> {
        let entries_query =
            format!("SELECT {ENTRY_COLUMNS} FROM maintenance_entries ORDER BY started_at DESC");
        let entries = sqlx::query_as::<_, MaintenanceEntry>(&entries_query)
            .fetch_all(pool)
            .await?;

        let details_query = format!(
            "SELECT {DETAIL_COLUMNS} FROM maintenance_rack_details ORDER BY entry_id, rack_id"
        );
        let details = sqlx::query_as::<_, MaintenanceRackDetail>(&details_query)
            .fetch_all(pool)
            .await?;

        let mut by_entry: std::collections::HashMap<i64, Vec<MaintenanceRackDetail>> =
            std::collections::HashMap::new();
        for detail in details {
            by_entry.entry(detail.entry_id).or_default().push(detail);
        }

        Ok(entries
            .into_iter()
            .map(|entry| {
                let racks = by_entry.remove(&entry.id).unwrap_or_default();
                MaintenanceEntryWithDetails { entry, racks }
            })
            .collect())
    }

    // ── Start operations ─────────────────────────────────────────────────

    /// Create an individual-rack entry with its single detail row.
    pub async fn start_individual(
        pool: &PgPool,
        input: &StartIndividualMaintenance,
    ) -> Result<MaintenanceEntry, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let entry_query = format!(
            "INSERT INTO maintenance_entries (entry_type, rack_id, chain, site, dc, reason, started_by)
             VALUES ($1, $2, NULL, $3, $4, $5, $6)
             RETURNING {ENTRY_COLUMNS}"
        );
        let entry = sqlx::query_as::<_, MaintenanceEntry>(&entry_query)
            .bind(ENTRY_TYPE_INDIVIDUAL_RACK)
            .bind(&input.rack_id)
            .bind(&input.site)
            .bind(&input.dc)
            .bind(&input.reason)
            .bind(&input.started_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO maintenance_rack_details (entry_id, rack_id, country, site, dc, chain)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(entry.id)
        .bind(&input.rack_id)
        .bind(&input.country)
        .bind(&input.site)
        .bind(&input.dc)
        .bind(&input.chain)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(entry)
    }

    /// Create a chain entry covering the candidate racks that are not yet
    /// suppressed.
    ///
    /// Membership is a snapshot: the candidates are whatever racks matched
    /// `(chain, site, dc)` at start time, and no entry re-evaluates them
    /// later. Candidates already in maintenance are skipped, not an error.
    pub async fn start_chain(
        pool: &PgPool,
        input: &StartChainMaintenance,
        candidates: &[ChainRackCandidate],
    ) -> Result<ChainStartOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let candidate_ids: Vec<String> =
            candidates.iter().map(|c| c.rack_id.clone()).collect();
        let existing: Vec<(String,)> = sqlx::query_as(
            "SELECT rack_id FROM maintenance_rack_details WHERE rack_id = ANY($1)",
        )
        .bind(&candidate_ids)
        .fetch_all(&mut *tx)
        .await?;
        let existing: HashSet<String> = existing.into_iter().map(|(r,)| r).collect();

        let (to_add, skipped): (Vec<_>, Vec<_>) = candidates
            .iter()
            .partition(|c| !existing.contains(&c.rack_id));
        let skipped: Vec<String> = skipped.into_iter().map(|c| c.rack_id.clone()).collect();

        if to_add.is_empty() {
            tx.rollback().await?;
            return Ok(ChainStartOutcome::AllAlreadyInMaintenance { skipped });
        }

        let entry_query = format!(
            "INSERT INTO maintenance_entries (entry_type, rack_id, chain, site, dc, reason, started_by)
             VALUES ($1, NULL, $2, $3, $4, $5, $6)
             RETURNING {ENTRY_COLUMNS}"
        );
        let entry = sqlx::query_as::<_, MaintenanceEntry>(&entry_query)
            .bind(ENTRY_TYPE_CHAIN)
            .bind(&input.chain)
            .bind(&input.site)
            .bind(&input.dc)
            .bind(&input.reason)
            .bind(&input.started_by)
            .fetch_one(&mut *tx)
            .await?;

        let mut added = Vec::with_capacity(to_add.len());
        for candidate in to_add {
            sqlx::query(
                "INSERT INTO maintenance_rack_details (entry_id, rack_id, country, site, dc, chain)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(entry.id)
            .bind(&candidate.rack_id)
            .bind(&candidate.country)
            .bind(&candidate.site)
            .bind(&candidate.dc)
            .bind(&candidate.chain)
            .execute(&mut *tx)
            .await?;
            added.push(candidate.rack_id.clone());
        }

        tx.commit().await?;
        Ok(ChainStartOutcome::Started {
            entry,
            added,
            skipped,
        })
    }

    // ── End operations ───────────────────────────────────────────────────

    /// Delete an entry; its detail rows go with it (FK cascade).
    ///
    /// Returns `false` when no entry with that id exists.
    pub async fn end_entry(pool: &PgPool, entry_id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM maintenance_entries WHERE id = $1")
            .bind(entry_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove a single rack from maintenance.
    ///
    /// Deletes its detail row; when the parent entry has no remaining
    /// details, the parent goes too (no orphan entries). Returns `false`
    /// when the rack was not in maintenance.
    pub async fn end_rack(pool: &PgPool, rack_id: &str) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let deleted: Option<(i64,)> = sqlx::query_as(
            "DELETE FROM maintenance_rack_details WHERE rack_id = $1 RETURNING entry_id",
        )
        .bind(rack_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((entry_id,)) = deleted else {
            tx.rollback().await?;
            return Ok(false);
        };

        let (remaining,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM maintenance_rack_details WHERE entry_id = $1",
        )
        .bind(entry_id)
        .fetch_one(&mut *tx)
        .await?;

        if remaining == 0 {
            sqlx::query("DELETE FROM maintenance_entries WHERE id = $1")
                .bind(entry_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}
