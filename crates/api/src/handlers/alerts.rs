//! Handlers for the active-alert read and export endpoints.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

use rackwatch_db::models::alert::{ActiveAlert, AlertFilter};
use rackwatch_db::repositories::AlertRepo;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAlertExporter;
use crate::response::ApiResponse;
use crate::state::AppState;

/// GET /alerts/active?metric_type=&site=&dc=
///
/// The active-alert table, optionally filtered.
pub async fn list_active(
    State(state): State<AppState>,
    Query(filter): Query<AlertFilter>,
) -> AppResult<Json<ApiResponse<Vec<ActiveAlert>>>> {
    let alerts = AlertRepo::list(&state.pool, &filter).await?;
    Ok(Json(ApiResponse::list(alerts)))
}

/// POST /export/alerts
///
/// Produce a downloadable CSV snapshot of the active-alert table.
/// Requires export permission.
pub async fn export_alerts(
    State(state): State<AppState>,
    RequireAlertExporter(_user): RequireAlertExporter,
) -> AppResult<impl IntoResponse> {
    let alerts = AlertRepo::list(&state.pool, &AlertFilter::default()).await?;

    let mut csv_output = String::from(
        "pdu_id,rack_id,name,country,site,dc,phase,chain,node,serial,\
         metric_type,alert_reason,alert_value,alert_field,threshold_exceeded,\
         alert_started_at,last_updated_at\n",
    );
    for alert in &alerts {
        csv_output.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            alert.pdu_id,
            alert.rack_id,
            alert.name,
            alert.country,
            alert.site,
            alert.dc,
            alert.phase,
            alert.chain,
            alert.node,
            alert.serial,
            alert.metric_type,
            alert.alert_reason,
            alert.alert_value.map_or(String::new(), |v| v.to_string()),
            alert.alert_field,
            alert
                .threshold_exceeded
                .map_or(String::new(), |v| v.to_string()),
            alert.alert_started_at.to_rfc3339(),
            alert.last_updated_at.to_rfc3339(),
        ));
    }

    Ok(axum::response::Response::builder()
        .status(200)
        .header("Content-Type", "text/csv")
        .header(
            "Content-Disposition",
            "attachment; filename=\"active-alerts.csv\"",
        )
        .body(axum::body::Body::from(csv_output))
        .unwrap()
        .into_response())
}
