//! Handlers for the live rack/PDU snapshot endpoints.
//!
//! These serve the most recent successful evaluation cycle straight from
//! the snapshot cell -- no database access on the hot path.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use rackwatch_core::types::Timestamp;

use crate::engine::snapshot::PduStatusView;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Response body for `GET /racks`: the standard envelope plus the snapshot
/// staleness marker and provenance.
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub success: bool,
    pub data: Vec<PduStatusView>,
    pub count: usize,
    /// True before the first successful cycle or after an upstream outage.
    pub stale: bool,
    pub cycle: u64,
    pub generated_at: Option<Timestamp>,
}

/// GET /racks
///
/// Current snapshot: every PDU with its status, reasons, and maintenance
/// flag. Sends an `ETag` derived from the cycle id; a matching
/// `If-None-Match` short-circuits to 304.
pub async fn get_racks(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let snapshot = state.snapshot.load();
    let etag = format!("\"cycle-{}\"", snapshot.cycle);

    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH) {
        if if_none_match.as_bytes() == etag.as_bytes() {
            return StatusCode::NOT_MODIFIED.into_response();
        }
    }

    let body = SnapshotResponse {
        success: true,
        count: snapshot.pdus.len(),
        data: snapshot.pdus.clone(),
        stale: snapshot.stale,
        cycle: snapshot.cycle,
        generated_at: snapshot.generated_at,
    };

    ([(header::ETAG, etag)], Json(body)).into_response()
}

/// GET /sites
///
/// Distinct sites observed in the latest snapshot (UI filter source).
pub async fn get_sites(State(state): State<AppState>) -> Json<ApiResponse<Vec<String>>> {
    let snapshot = state.snapshot.load();
    Json(ApiResponse::list(snapshot.sites()))
}
