//! Route definitions for the active-alert endpoints.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::alerts;
use crate::state::AppState;

/// Alert routes.
///
/// ```text
/// GET  /alerts/active  -> list_active
/// POST /export/alerts  -> export_alerts (export permission)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/alerts/active", get(alerts::list_active))
        .route("/export/alerts", post(alerts::export_alerts))
}
