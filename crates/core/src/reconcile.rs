//! Reconciliation planning for the active-alert table.
//!
//! Pure logic -- no database access. The caller supplies the cycle's desired
//! critical set and the currently persisted alert keys; the plan partitions
//! them into inserts, refreshes, and deletes. Application order (open ->
//! refresh -> close) is the applier's responsibility.

use std::collections::HashSet;

/// Identity of an active alert row: `(pdu_id, metric_type, alert_reason)`.
///
/// Mirrors the unique key on `active_critical_alerts`, which is what makes
/// reconciliation idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlertKey {
    pub pdu_id: String,
    pub metric_type: String,
    pub alert_reason: String,
}

/// One alert the current cycle wants to exist, with the location snapshot
/// and measurement details carried onto the row.
#[derive(Debug, Clone)]
pub struct DesiredAlert {
    pub key: AlertKey,
    pub rack_id: String,
    pub name: String,
    pub country: String,
    pub site: String,
    pub dc: String,
    pub phase: String,
    pub chain: String,
    pub node: String,
    pub serial: String,
    pub alert_value: Option<f64>,
    pub alert_field: String,
    pub threshold_exceeded: Option<f64>,
}

/// The three sub-sets a cycle applies to the alert table.
#[derive(Debug, Default)]
pub struct ReconcilePlan {
    /// Newly critical -- insert with a fresh `alert_started_at`.
    pub to_open: Vec<DesiredAlert>,
    /// Still critical -- touch `last_updated_at` and refresh values.
    pub to_refresh: Vec<DesiredAlert>,
    /// No longer critical (or suppressed) -- delete.
    pub to_close: Vec<AlertKey>,
}

impl ReconcilePlan {
    /// Whether the plan performs no writes at all.
    pub fn is_empty(&self) -> bool {
        self.to_open.is_empty() && self.to_refresh.is_empty() && self.to_close.is_empty()
    }
}

/// Diff the desired set against the persisted keys.
///
/// Duplicate desired keys are collapsed (first occurrence wins) so the plan
/// never violates the table's unique key.
pub fn plan(desired: Vec<DesiredAlert>, current: &HashSet<AlertKey>) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();
    let mut seen: HashSet<AlertKey> = HashSet::with_capacity(desired.len());

    for alert in desired {
        if !seen.insert(alert.key.clone()) {
            continue;
        }
        if current.contains(&alert.key) {
            plan.to_refresh.push(alert);
        } else {
            plan.to_open.push(alert);
        }
    }

    for key in current {
        if !seen.contains(key) {
            plan.to_close.push(key.clone());
        }
    }

    plan
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
