//! Integration tests for the snapshot, sites, alert listing, and export
//! endpoints, plus the health check.

mod common;

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use tower::ServiceExt;

use rackwatch_api::engine::snapshot::{PduStatusView, RackSnapshot, SnapshotCell};
use rackwatch_core::classifier::{classify, PduStatus};
use rackwatch_core::pdu::{PduReading, Phase};
use rackwatch_core::threshold_keys as keys;

use common::{body_json, body_text, build_test_app, build_test_app_with_snapshot, get, post_auth, token_for};

fn make_reading(pdu_id: &str, site: &str) -> PduReading {
    PduReading {
        pdu_id: pdu_id.to_string(),
        rack_id: "rack-1".to_string(),
        name: format!("rack-1-{pdu_id}"),
        country: "DE".to_string(),
        site: site.to_string(),
        dc: "D1".to_string(),
        phase: Phase::SinglePhase,
        chain: "C1".to_string(),
        node: "N1".to_string(),
        serial: "SN-1".to_string(),
        gw_name: "gw-1".to_string(),
        gw_ip: "10.0.0.1".to_string(),
        current: Some(10.0),
        voltage: Some(230.0),
        power: Some(2300.0),
        temperature: Some(24.0),
        sensor_temperature: Some(24.0),
        sensor_humidity: Some(45.0),
    }
}

fn view(reading: PduReading) -> PduStatusView {
    let classification = classify(&reading, &Default::default());
    PduStatusView {
        status: classification.status,
        reasons: classification.reasons,
        in_maintenance: false,
        reading,
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn racks_before_first_cycle_is_empty_and_stale(pool: PgPool) {
    let app = build_test_app(pool).await;
    let response = get(app, "/api/v1/racks").await;
    assert_eq!(response.status(), StatusCode::OK);

    let etag = response
        .headers()
        .get("etag")
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert_eq!(etag, "\"cycle-0\"");

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["stale"], json!(true));
    assert_eq!(body["count"], json!(0));
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn racks_serves_the_published_snapshot(pool: PgPool) {
    let cell = SnapshotCell::new();
    cell.publish(RackSnapshot {
        cycle: 7,
        generated_at: Some(Utc::now()),
        stale: false,
        pdus: vec![view(make_reading("pdu-A", "S1")), view(make_reading("pdu-B", "S2"))],
    });

    let app = build_test_app_with_snapshot(pool, cell).await;
    let response = get(app, "/api/v1/racks").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["stale"], json!(false));
    assert_eq!(body["cycle"], json!(7));
    assert_eq!(body["count"], json!(2));
    assert_eq!(body["data"][0]["status"], json!("normal"));
    assert_eq!(body["data"][0]["in_maintenance"], json!(false));
    assert_eq!(body["data"][0]["pdu_id"], json!("pdu-A"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn racks_honours_if_none_match(pool: PgPool) {
    let cell = SnapshotCell::new();
    cell.publish(RackSnapshot {
        cycle: 7,
        generated_at: Some(Utc::now()),
        stale: false,
        pdus: Vec::new(),
    });

    let app = build_test_app_with_snapshot(pool, cell).await;
    let request = axum::http::Request::builder()
        .uri("/api/v1/racks")
        .header("if-none-match", "\"cycle-7\"")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn sites_lists_distinct_sites(pool: PgPool) {
    let cell = SnapshotCell::new();
    cell.publish(RackSnapshot {
        cycle: 1,
        generated_at: Some(Utc::now()),
        stale: false,
        pdus: vec![
            view(make_reading("pdu-A", "S2")),
            view(make_reading("pdu-B", "S1")),
            view(make_reading("pdu-C", "S2")),
        ],
    });

    let app = build_test_app_with_snapshot(pool, cell).await;
    let body = body_json(get(app, "/api/v1/sites").await).await;
    assert_eq!(body["data"], json!(["S1", "S2"]));
    assert_eq!(body["count"], json!(2));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn classified_pdu_carries_reasons_in_the_snapshot(pool: PgPool) {
    let thresholds = std::collections::HashMap::from([
        (keys::CRITICAL_VOLTAGE_LOW.to_string(), 200.0),
        (keys::WARNING_VOLTAGE_LOW.to_string(), 210.0),
        (keys::WARNING_VOLTAGE_HIGH.to_string(), 245.0),
        (keys::CRITICAL_VOLTAGE_HIGH.to_string(), 250.0),
    ]);
    let mut reading = make_reading("pdu-A", "S1");
    reading.voltage = Some(0.0);
    let classification = classify(&reading, &thresholds);
    assert_eq!(classification.status, PduStatus::Critical);

    let cell = SnapshotCell::new();
    cell.publish(RackSnapshot {
        cycle: 2,
        generated_at: Some(Utc::now()),
        stale: false,
        pdus: vec![PduStatusView {
            status: classification.status,
            reasons: classification.reasons,
            in_maintenance: false,
            reading,
        }],
    });

    let app = build_test_app_with_snapshot(pool, cell).await;
    let body = body_json(get(app, "/api/v1/racks").await).await;
    assert_eq!(body["data"][0]["status"], json!("critical"));
    assert_eq!(
        body["data"][0]["reasons"][0]["code"],
        json!("critical_voltage_low")
    );
    assert_eq!(body["data"][0]["reasons"][0]["severity"], json!("critical"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn active_alerts_endpoint_returns_envelope(pool: PgPool) {
    let app = build_test_app(pool).await;
    let response = get(app, "/api/v1/alerts/active?metric_type=amperage").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["count"], json!(0));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn export_requires_permission_and_returns_csv(pool: PgPool) {
    let app = build_test_app(pool.clone()).await;
    let response = post_auth(app, "/api/v1/export/alerts", &token_for("observer")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let app = build_test_app(pool).await;
    let response = post_auth(app, "/api/v1/export/alerts", &token_for("technician")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "text/csv"
    );

    let csv = body_text(response).await;
    assert!(csv.starts_with("pdu_id,rack_id,"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn health_reports_ok(pool: PgPool) {
    let app = build_test_app(pool).await;
    let response = get(app, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["db_healthy"], json!(true));
    assert_eq!(body["snapshot_cycle"], json!(0));
}
