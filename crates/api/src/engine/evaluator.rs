//! One evaluation cycle: fetch, classify, reconcile, publish.

use std::collections::HashMap;

use chrono::Utc;

use rackwatch_core::classifier::{self, Classification, Severity};
use rackwatch_core::pdu::PduReading;
use rackwatch_core::reconcile::{self, AlertKey, DesiredAlert};
use rackwatch_core::threshold_keys::{layer_thresholds, EffectiveThresholds};
use rackwatch_db::models::alert::ReconcileOutcome;
use rackwatch_db::repositories::{AlertRepo, MaintenanceRepo, ThresholdRepo};
use rackwatch_db::DbPool;

use super::neng::{FetchError, NengClient};
use super::snapshot::{PduStatusView, RackSnapshot, SnapshotCell};

/// Why a cycle did not complete.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    /// The upstream batch was incomplete; reconciliation was skipped and
    /// the alert table left untouched.
    #[error("upstream fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// A storage operation failed; the cycle aborted and the next one
    /// will re-converge.
    #[error("storage error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Summary of one completed cycle, for logging.
#[derive(Debug)]
pub struct CycleReport {
    pub cycle: u64,
    pub pdus: usize,
    pub suppressed_racks: usize,
    pub outcome: ReconcileOutcome,
}

/// Run one full evaluation cycle.
///
/// The thresholds and the suppressed set are read fresh at cycle start, so
/// any mutation committed beforehand is observed here. The snapshot is
/// published only after the alert table has been updated -- `GET /racks`
/// always reflects the most recent *successful* cycle.
pub async fn run_cycle(
    pool: &DbPool,
    client: &NengClient,
    cell: &SnapshotCell,
    cycle: u64,
) -> Result<CycleReport, CycleError> {
    let readings = client.fetch_batch().await?;

    let global = ThresholdRepo::global_value_map(pool).await?;
    let overrides = ThresholdRepo::override_value_maps(pool).await?;
    let suppressed = MaintenanceRepo::suppressed_set(pool).await?;

    // Effective thresholds are identical for every PDU in a rack; resolve
    // each rack at most once.
    let mut effective_cache: HashMap<String, EffectiveThresholds> = HashMap::new();

    let mut views = Vec::with_capacity(readings.len());
    let mut desired = Vec::new();

    for reading in readings {
        let effective = effective_cache
            .entry(reading.rack_id.clone())
            .or_insert_with(|| layer_thresholds(&global, overrides.get(&reading.rack_id)));

        let classification = classifier::classify(&reading, effective);
        let in_maintenance = suppressed.contains(&reading.rack_id);

        if !in_maintenance {
            desired.extend(desired_alerts(&reading, &classification));
        }

        views.push(PduStatusView {
            status: classification.status,
            reasons: classification.reasons,
            in_maintenance,
            reading,
        });
    }

    let current = AlertRepo::current_keys(pool).await?;
    let plan = reconcile::plan(desired, &current);
    let outcome = AlertRepo::apply_plan(pool, &plan, Utc::now()).await?;

    let pdus = views.len();
    cell.publish(RackSnapshot {
        cycle,
        generated_at: Some(Utc::now()),
        stale: false,
        pdus: views,
    });

    Ok(CycleReport {
        cycle,
        pdus,
        suppressed_racks: suppressed.len(),
        outcome,
    })
}

/// Project a PDU's critical reasons into desired alert rows.
///
/// Warnings surface on the snapshot only; the alert table carries critical
/// reasons exclusively.
fn desired_alerts(reading: &PduReading, classification: &Classification) -> Vec<DesiredAlert> {
    classification
        .reasons
        .iter()
        .filter(|reason| reason.severity == Severity::Critical)
        .map(|reason| DesiredAlert {
            key: AlertKey {
                pdu_id: reading.pdu_id.clone(),
                metric_type: reason.metric.as_str().to_string(),
                alert_reason: reason.code.clone(),
            },
            rack_id: reading.rack_id.clone(),
            name: reading.name.clone(),
            country: reading.country.clone(),
            site: reading.site.clone(),
            dc: reading.dc.clone(),
            phase: reading.phase.as_str().to_string(),
            chain: reading.chain.clone(),
            node: reading.node.clone(),
            serial: reading.serial.clone(),
            alert_value: reason.value,
            alert_field: reason.field.to_string(),
            threshold_exceeded: reason.threshold,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rackwatch_core::pdu::Phase;
    use rackwatch_core::threshold_keys as keys;

    use super::*;

    fn make_reading(current: Option<f64>) -> PduReading {
        PduReading {
            pdu_id: "pdu-A".to_string(),
            rack_id: "rack-1".to_string(),
            name: "R1-PDU-A".to_string(),
            country: "DE".to_string(),
            site: "S1".to_string(),
            dc: "D1".to_string(),
            phase: Phase::SinglePhase,
            chain: "C1".to_string(),
            node: "N1".to_string(),
            serial: "SN".to_string(),
            gw_name: "gw".to_string(),
            gw_ip: "10.0.0.1".to_string(),
            current,
            voltage: None,
            power: None,
            temperature: None,
            sensor_temperature: None,
            sensor_humidity: None,
        }
    }

    fn amperage_thresholds() -> EffectiveThresholds {
        HashMap::from([
            (keys::CRITICAL_AMPERAGE_LOW_SINGLE_PHASE.to_string(), 1.0),
            (keys::WARNING_AMPERAGE_LOW_SINGLE_PHASE.to_string(), 2.0),
            (keys::WARNING_AMPERAGE_HIGH_SINGLE_PHASE.to_string(), 20.0),
            (keys::CRITICAL_AMPERAGE_HIGH_SINGLE_PHASE.to_string(), 25.0),
        ])
    }

    #[test]
    fn critical_reason_becomes_a_desired_alert() {
        let reading = make_reading(Some(26.0));
        let classification = classifier::classify(&reading, &amperage_thresholds());

        let desired = desired_alerts(&reading, &classification);
        assert_eq!(desired.len(), 1);

        let alert = &desired[0];
        assert_eq!(alert.key.pdu_id, "pdu-A");
        assert_eq!(alert.key.metric_type, "amperage");
        assert_eq!(
            alert.key.alert_reason,
            keys::CRITICAL_AMPERAGE_HIGH_SINGLE_PHASE
        );
        assert_eq!(alert.alert_value, Some(26.0));
        assert_eq!(alert.threshold_exceeded, Some(25.0));
        assert_eq!(alert.alert_field, "current");
    }

    #[test]
    fn warnings_do_not_become_alerts() {
        let reading = make_reading(Some(21.0));
        let classification = classifier::classify(&reading, &amperage_thresholds());
        assert!(!classification.reasons.is_empty());

        let desired = desired_alerts(&reading, &classification);
        assert!(desired.is_empty());
    }

    #[test]
    fn normal_reading_produces_nothing() {
        let reading = make_reading(Some(10.0));
        let classification = classifier::classify(&reading, &amperage_thresholds());
        assert!(desired_alerts(&reading, &classification).is_empty());
    }
}
