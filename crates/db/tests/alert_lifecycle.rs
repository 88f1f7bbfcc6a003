//! Integration tests for the active-alert lifecycle: open, refresh, close,
//! maintenance suppression, and reconciler idempotence.
//!
//! These drive the pure classifier/planner from `rackwatch-core` against
//! the real table, mirroring what the evaluation engine does each cycle.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use sqlx::PgPool;

use rackwatch_core::classifier::{classify, Severity};
use rackwatch_core::pdu::{PduReading, Phase};
use rackwatch_core::reconcile::{plan, AlertKey, DesiredAlert};
use rackwatch_core::threshold_keys::{self as keys, layer_thresholds, EffectiveThresholds};
use rackwatch_db::models::alert::AlertFilter;
use rackwatch_db::models::threshold::UpsertThresholdEntry;
use rackwatch_db::repositories::{AlertRepo, MaintenanceRepo, ThresholdRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn make_reading(pdu_id: &str, rack_id: &str, current: f64) -> PduReading {
    PduReading {
        pdu_id: pdu_id.to_string(),
        rack_id: rack_id.to_string(),
        name: format!("{rack_id}-{pdu_id}"),
        country: "DE".to_string(),
        site: "S1".to_string(),
        dc: "D1".to_string(),
        phase: Phase::SinglePhase,
        chain: "C1".to_string(),
        node: "N1".to_string(),
        serial: "SN-1".to_string(),
        gw_name: "gw-1".to_string(),
        gw_ip: "10.0.0.1".to_string(),
        current: Some(current),
        voltage: None,
        power: None,
        temperature: None,
        sensor_temperature: None,
        sensor_humidity: None,
    }
}

fn amperage_thresholds(critical_high: f64) -> EffectiveThresholds {
    HashMap::from([
        (keys::CRITICAL_AMPERAGE_LOW_SINGLE_PHASE.to_string(), 0.5),
        (keys::WARNING_AMPERAGE_LOW_SINGLE_PHASE.to_string(), 1.0),
        (keys::WARNING_AMPERAGE_HIGH_SINGLE_PHASE.to_string(), critical_high - 5.0),
        (keys::CRITICAL_AMPERAGE_HIGH_SINGLE_PHASE.to_string(), critical_high),
    ])
}

fn voltage_thresholds() -> EffectiveThresholds {
    HashMap::from([
        (keys::CRITICAL_VOLTAGE_LOW.to_string(), 200.0),
        (keys::WARNING_VOLTAGE_LOW.to_string(), 210.0),
        (keys::WARNING_VOLTAGE_HIGH.to_string(), 245.0),
        (keys::CRITICAL_VOLTAGE_HIGH.to_string(), 250.0),
    ])
}

/// Project a reading's critical reasons into desired alerts, the way the
/// evaluation engine does.
fn desired_for(reading: &PduReading, effective: &EffectiveThresholds) -> Vec<DesiredAlert> {
    classify(reading, effective)
        .reasons
        .into_iter()
        .filter(|r| r.severity == Severity::Critical)
        .map(|r| DesiredAlert {
            key: AlertKey {
                pdu_id: reading.pdu_id.clone(),
                metric_type: r.metric.as_str().to_string(),
                alert_reason: r.code.clone(),
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
            alert_value: r.value,
            alert_field: r.field.to_string(),
            threshold_exceeded: r.threshold,
        })
        .collect()
}

/// Run one reconciliation pass against the table.
async fn reconcile(
    pool: &PgPool,
    desired: Vec<DesiredAlert>,
    now: chrono::DateTime<chrono::Utc>,
) {
    let current = AlertRepo::current_keys(pool).await.expect("current keys");
    let plan = plan(desired, &current);
    AlertRepo::apply_plan(pool, &plan, now).await.expect("apply plan");
}

// ---------------------------------------------------------------------------
// Scenario: normal -> critical opens a row
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn normal_then_critical_opens_one_alert(pool: PgPool) {
    let thresholds = amperage_thresholds(25.0);

    // Cycle 1: 10 A is healthy, nothing opens.
    reconcile(&pool, desired_for(&make_reading("pdu-A", "rack-1", 10.0), &thresholds), Utc::now())
        .await;
    let alerts = AlertRepo::list(&pool, &AlertFilter::default()).await.expect("list");
    assert!(alerts.is_empty());

    // Cycle 2: 26 A crosses the critical-high bound.
    reconcile(&pool, desired_for(&make_reading("pdu-A", "rack-1", 26.0), &thresholds), Utc::now())
        .await;

    let alerts = AlertRepo::list(&pool, &AlertFilter::default()).await.expect("list");
    assert_eq!(alerts.len(), 1);

    let alert = &alerts[0];
    assert_eq!(alert.pdu_id, "pdu-A");
    assert_eq!(alert.metric_type, "amperage");
    assert_eq!(alert.alert_reason, keys::CRITICAL_AMPERAGE_HIGH_SINGLE_PHASE);
    assert_eq!(alert.alert_value, Some(26.0));
    assert_eq!(alert.threshold_exceeded, Some(25.0));
    assert_eq!(alert.alert_field, "current");
    assert_eq!(alert.alert_type, "critical");
}

// ---------------------------------------------------------------------------
// Scenario: a rack override wins over the global bound
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn override_wins_until_deleted(pool: PgPool) {
    for (key, value) in [
        (keys::CRITICAL_AMPERAGE_LOW_SINGLE_PHASE, 0.5),
        (keys::WARNING_AMPERAGE_LOW_SINGLE_PHASE, 1.0),
        (keys::WARNING_AMPERAGE_HIGH_SINGLE_PHASE, 20.0),
        (keys::CRITICAL_AMPERAGE_HIGH_SINGLE_PHASE, 25.0),
    ] {
        ThresholdRepo::upsert_global(&pool, &UpsertThresholdEntry::new(key, value))
            .await
            .expect("global upsert");
    }
    ThresholdRepo::upsert_for_rack(
        &pool,
        "rack-1",
        &UpsertThresholdEntry::new(keys::CRITICAL_AMPERAGE_HIGH_SINGLE_PHASE, 30.0),
    )
    .await
    .expect("override upsert");

    let reading = make_reading("pdu-A", "rack-1", 26.0);

    // With the override at 30, 26 A is only a warning -- no alert row.
    let global = ThresholdRepo::global_value_map(&pool).await.expect("global");
    let overrides = ThresholdRepo::override_value_maps(&pool).await.expect("overrides");
    let effective = layer_thresholds(&global, overrides.get("rack-1"));
    reconcile(&pool, desired_for(&reading, &effective), Utc::now()).await;
    assert!(AlertRepo::list(&pool, &AlertFilter::default())
        .await
        .expect("list")
        .is_empty());

    // Delete the override: the next cycle sees the global 25 and opens.
    ThresholdRepo::delete_for_rack(&pool, "rack-1").await.expect("delete override");
    let overrides = ThresholdRepo::override_value_maps(&pool).await.expect("overrides");
    let effective = layer_thresholds(&global, overrides.get("rack-1"));
    reconcile(&pool, desired_for(&reading, &effective), Utc::now()).await;

    let alerts = AlertRepo::list(&pool, &AlertFilter::default()).await.expect("list");
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].threshold_exceeded, Some(25.0));
}

// ---------------------------------------------------------------------------
// Scenario: continuous critical preserves alert_started_at
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_preserves_started_at(pool: PgPool) {
    let thresholds = amperage_thresholds(25.0);
    let reading = make_reading("pdu-A", "rack-1", 26.0);

    let t1 = Utc::now() - Duration::seconds(60);
    reconcile(&pool, desired_for(&reading, &thresholds), t1).await;

    let opened = AlertRepo::list(&pool, &AlertFilter::default()).await.expect("list");
    let started_at = opened[0].alert_started_at;

    // Still critical one cycle later: only last_updated_at moves.
    let t2 = Utc::now();
    reconcile(&pool, desired_for(&reading, &thresholds), t2).await;

    let refreshed = AlertRepo::list(&pool, &AlertFilter::default()).await.expect("list");
    assert_eq!(refreshed.len(), 1);
    assert_eq!(refreshed[0].alert_started_at, started_at);
    assert!(refreshed[0].last_updated_at > refreshed[0].alert_started_at);
}

// ---------------------------------------------------------------------------
// Scenario: maintenance suppression closes and reopening restarts
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn maintenance_closes_then_reopens_with_new_started_at(pool: PgPool) {
    use rackwatch_db::models::maintenance::StartIndividualMaintenance;

    let thresholds = amperage_thresholds(25.0);
    let reading = make_reading("pdu-A", "rack-1", 26.0);

    let t1 = Utc::now() - Duration::seconds(120);
    reconcile(&pool, desired_for(&reading, &thresholds), t1).await;
    let first_started = AlertRepo::list(&pool, &AlertFilter::default())
        .await
        .expect("list")[0]
        .alert_started_at;

    // Operator puts the rack into maintenance; the next cycle's desired set
    // excludes its PDUs and the row closes.
    MaintenanceRepo::start_individual(
        &pool,
        &StartIndividualMaintenance {
            rack_id: "rack-1".to_string(),
            country: "DE".to_string(),
            site: "S1".to_string(),
            dc: "D1".to_string(),
            chain: "C1".to_string(),
            reason: "breaker work".to_string(),
            started_by: "ops-jane".to_string(),
        },
    )
    .await
    .expect("start maintenance");

    let suppressed = MaintenanceRepo::suppressed_set(&pool).await.expect("set");
    let desired = if suppressed.contains("rack-1") {
        Vec::new()
    } else {
        desired_for(&reading, &thresholds)
    };
    reconcile(&pool, desired, Utc::now() - Duration::seconds(60)).await;
    assert!(AlertRepo::list(&pool, &AlertFilter::default())
        .await
        .expect("list")
        .is_empty());

    // Maintenance ends; the same reading reappears as a fresh alert.
    MaintenanceRepo::end_rack(&pool, "rack-1").await.expect("end maintenance");
    reconcile(&pool, desired_for(&reading, &thresholds), Utc::now()).await;

    let reopened = AlertRepo::list(&pool, &AlertFilter::default()).await.expect("list");
    assert_eq!(reopened.len(), 1);
    assert!(reopened[0].alert_started_at > first_started);
}

// ---------------------------------------------------------------------------
// Scenario: zero voltage means "no energy"
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn zero_voltage_opens_critical_low(pool: PgPool) {
    let mut reading = make_reading("pdu-B", "rack-2", 5.0);
    reading.current = None;
    reading.voltage = Some(0.0);

    // Only voltage thresholds configured; the unreadable current is ignored
    // because amperage has no bounds here.
    reconcile(&pool, desired_for(&reading, &voltage_thresholds()), Utc::now()).await;

    let alerts = AlertRepo::list(&pool, &AlertFilter::default()).await.expect("list");
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].alert_reason, keys::CRITICAL_VOLTAGE_LOW);
    assert_eq!(alerts[0].alert_value, Some(0.0));
    assert_eq!(alerts[0].metric_type, "voltage");
}

// ---------------------------------------------------------------------------
// Boundary: empty desired set closes everything
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn empty_batch_closes_all_alerts(pool: PgPool) {
    let thresholds = amperage_thresholds(25.0);
    reconcile(&pool, desired_for(&make_reading("pdu-A", "rack-1", 26.0), &thresholds), Utc::now())
        .await;
    reconcile(&pool, desired_for(&make_reading("pdu-B", "rack-2", 30.0), &thresholds), Utc::now())
        .await;
    assert_eq!(
        AlertRepo::list(&pool, &AlertFilter::default()).await.expect("list").len(),
        2
    );

    // A successful-but-empty fetch is a real zero-critical world.
    reconcile(&pool, Vec::new(), Utc::now()).await;
    assert!(AlertRepo::list(&pool, &AlertFilter::default())
        .await
        .expect("list")
        .is_empty());
}

// ---------------------------------------------------------------------------
// Idempotence: identical cycles converge to identical tables
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn identical_cycles_only_refresh(pool: PgPool) {
    let thresholds = amperage_thresholds(25.0);
    let reading = make_reading("pdu-A", "rack-1", 26.0);

    reconcile(&pool, desired_for(&reading, &thresholds), Utc::now()).await;
    let first = AlertRepo::list(&pool, &AlertFilter::default()).await.expect("list");

    reconcile(&pool, desired_for(&reading, &thresholds), Utc::now()).await;
    let second = AlertRepo::list(&pool, &AlertFilter::default()).await.expect("list");

    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(first[0].id, second[0].id, "the row must be updated, not replaced");
    assert_eq!(first[0].alert_started_at, second[0].alert_started_at);
    assert_eq!(first[0].alert_value, second[0].alert_value);
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_by_metric_site_and_dc(pool: PgPool) {
    let thresholds = amperage_thresholds(25.0);

    let mut in_site_2 = make_reading("pdu-C", "rack-3", 26.0);
    in_site_2.site = "S2".to_string();

    let mut desired = desired_for(&make_reading("pdu-A", "rack-1", 26.0), &thresholds);
    desired.extend(desired_for(&in_site_2, &thresholds));

    let mut no_volts = make_reading("pdu-B", "rack-2", 10.0);
    no_volts.voltage = Some(0.0);
    desired.extend(desired_for(&no_volts, &voltage_thresholds()));

    reconcile(&pool, desired, Utc::now()).await;

    let amperage_only = AlertRepo::list(
        &pool,
        &AlertFilter {
            metric_type: Some("amperage".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("list");
    assert_eq!(amperage_only.len(), 2);

    let site_2_only = AlertRepo::list(
        &pool,
        &AlertFilter {
            site: Some("S2".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("list");
    assert_eq!(site_2_only.len(), 1);
    assert_eq!(site_2_only[0].pdu_id, "pdu-C");

    let d1_voltage = AlertRepo::list(
        &pool,
        &AlertFilter {
            metric_type: Some("voltage".to_string()),
            dc: Some("D1".to_string()),
            ..Default::default()
        },
    )
    .await
    .expect("list");
    assert_eq!(d1_voltage.len(), 1);
    assert_eq!(d1_voltage[0].pdu_id, "pdu-B");
}
