//! Active-alert entity model and query DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use rackwatch_core::types::{DbId, Timestamp};

/// A live critical alert (`active_critical_alerts` row).
///
/// At most one row exists per `(pdu_id, metric_type, alert_reason)`; the
/// reconciler relies on that key for idempotence.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ActiveAlert {
    pub id: DbId,
    pub pdu_id: String,
    pub rack_id: String,
    pub name: String,
    pub country: String,
    pub site: String,
    pub dc: String,
    pub phase: String,
    pub chain: String,
    pub node: String,
    pub serial: String,
    pub alert_type: String,
    pub metric_type: String,
    pub alert_reason: String,
    pub alert_value: Option<f64>,
    pub alert_field: String,
    pub threshold_exceeded: Option<f64>,
    pub alert_started_at: Timestamp,
    pub last_updated_at: Timestamp,
}

/// Filters accepted by the active-alert listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertFilter {
    pub metric_type: Option<String>,
    pub site: Option<String>,
    pub dc: Option<String>,
}

/// Counters summarising one applied reconciliation plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub opened: u64,
    pub refreshed: u64,
    pub closed: u64,
}
