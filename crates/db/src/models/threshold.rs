//! Threshold configuration entity models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use rackwatch_core::types::{DbId, Timestamp};

/// A global threshold entry (`threshold_configs` row).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ThresholdConfig {
    pub id: DbId,
    pub key: String,
    pub value: f64,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A per-rack threshold override (`rack_threshold_overrides` row).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RackThresholdOverride {
    pub id: DbId,
    pub rack_id: String,
    pub key: String,
    pub value: f64,
    pub unit: Option<String>,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for upserting one threshold entry in either scope.
///
/// `unit` and `description` are informational only; they never influence
/// evaluation.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertThresholdEntry {
    pub key: String,
    pub value: f64,
    pub unit: Option<String>,
    pub description: Option<String>,
}

impl UpsertThresholdEntry {
    /// Bare `key -> value` upsert with no annotations.
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value,
            unit: None,
            description: None,
        }
    }
}

/// The two threshold scopes for one rack, as served by the read API.
#[derive(Debug, Clone, Serialize)]
pub struct RackThresholds {
    pub global: Vec<ThresholdConfig>,
    pub rack_specific: Vec<RackThresholdOverride>,
}
