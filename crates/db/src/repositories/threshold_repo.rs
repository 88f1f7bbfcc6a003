//! Repository for the `threshold_configs` and `rack_threshold_overrides`
//! tables.
//!
//! Key and value validation happens in `rackwatch-core` before these
//! methods are called; everything here is persistence only. Upserts are
//! idempotent by design (`ON CONFLICT ... DO UPDATE`).

use std::collections::HashMap;

use sqlx::PgPool;

use crate::models::threshold::{RackThresholdOverride, ThresholdConfig, UpsertThresholdEntry};

/// Column list for `threshold_configs` queries.
const GLOBAL_COLUMNS: &str = "id, key, value, unit, description, created_at, updated_at";

/// Column list for `rack_threshold_overrides` queries.
const OVERRIDE_COLUMNS: &str = "id, rack_id, key, value, unit, description, created_at, updated_at";

/// Provides CRUD operations for both threshold scopes.
pub struct ThresholdRepo;

impl ThresholdRepo {
    // ── Global scope ─────────────────────────────────────────────────────

    /// List all global threshold entries ordered by key.
    pub async fn list_global(pool: &PgPool) -> Result<Vec<ThresholdConfig>, sqlx::Error> {
        let query = format!("SELECT {GLOBAL_COLUMNS} FROM threshold_configs ORDER BY key ASC");
        sqlx::query_as::<_, ThresholdConfig>(&query)
            .fetch_all(pool)
            .await
    }

    /// Upsert one global entry.
    pub async fn upsert_global(
        pool: &PgPool,
        entry: &UpsertThresholdEntry,
    ) -> Result<ThresholdConfig, sqlx::Error> {
        let query = format!(
            "INSERT INTO threshold_configs (key, value, unit, description)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                unit = COALESCE(EXCLUDED.unit, threshold_configs.unit),
                description = COALESCE(EXCLUDED.description, threshold_configs.description),
                updated_at = NOW()
             RETURNING {GLOBAL_COLUMNS}"
        );
        sqlx::query_as::<_, ThresholdConfig>(&query)
            .bind(&entry.key)
            .bind(entry.value)
            .bind(&entry.unit)
            .bind(&entry.description)
            .fetch_one(pool)
            .await
    }

    // ── Rack scope ───────────────────────────────────────────────────────

    /// List the overrides for one rack ordered by key.
    pub async fn list_for_rack(
        pool: &PgPool,
        rack_id: &str,
    ) -> Result<Vec<RackThresholdOverride>, sqlx::Error> {
        let query = format!(
            "SELECT {OVERRIDE_COLUMNS} FROM rack_threshold_overrides \
             WHERE rack_id = $1 ORDER BY key ASC"
        );
        sqlx::query_as::<_, RackThresholdOverride>(&query)
            .bind(rack_id)
            .fetch_all(pool)
            .await
    }

    /// List every override row (engine bulk read, one query per cycle).
    pub async fn list_all_overrides(
        pool: &PgPool,
    ) -> Result<Vec<RackThresholdOverride>, sqlx::Error> {
        let query = format!(
            "SELECT {OVERRIDE_COLUMNS} FROM rack_threshold_overrides ORDER BY rack_id, key"
        );
        sqlx::query_as::<_, RackThresholdOverride>(&query)
            .fetch_all(pool)
            .await
    }

    /// Upsert one override for a rack.
    pub async fn upsert_for_rack(
        pool: &PgPool,
        rack_id: &str,
        entry: &UpsertThresholdEntry,
    ) -> Result<RackThresholdOverride, sqlx::Error> {
        let query = format!(
            "INSERT INTO rack_threshold_overrides (rack_id, key, value, unit, description)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (rack_id, key) DO UPDATE SET
                value = EXCLUDED.value,
                unit = COALESCE(EXCLUDED.unit, rack_threshold_overrides.unit),
                description = COALESCE(EXCLUDED.description, rack_threshold_overrides.description),
                updated_at = NOW()
             RETURNING {OVERRIDE_COLUMNS}"
        );
        sqlx::query_as::<_, RackThresholdOverride>(&query)
            .bind(rack_id)
            .bind(&entry.key)
            .bind(entry.value)
            .bind(&entry.unit)
            .bind(&entry.description)
            .fetch_one(pool)
            .await
    }

    /// Delete every override for a rack, returning how many rows existed.
    ///
    /// Zero means the rack had no overrides; the caller decides whether
    /// that is a 404.
    pub async fn delete_for_rack(pool: &PgPool, rack_id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM rack_threshold_overrides WHERE rack_id = $1")
            .bind(rack_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    // ── Effective-resolution inputs ──────────────────────────────────────

    /// The global scope as a bare `key -> value` map.
    pub async fn global_value_map(pool: &PgPool) -> Result<HashMap<String, f64>, sqlx::Error> {
        let rows = Self::list_global(pool).await?;
        Ok(rows.into_iter().map(|t| (t.key, t.value)).collect())
    }

    /// All overrides grouped per rack as `rack_id -> key -> value`.
    pub async fn override_value_maps(
        pool: &PgPool,
    ) -> Result<HashMap<String, HashMap<String, f64>>, sqlx::Error> {
        let rows = Self::list_all_overrides(pool).await?;
        let mut maps: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for row in rows {
            maps.entry(row.rack_id).or_default().insert(row.key, row.value);
        }
        Ok(maps)
    }
}
