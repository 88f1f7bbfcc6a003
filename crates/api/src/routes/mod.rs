pub mod alerts;
pub mod health;
pub mod maintenance;
pub mod racks;
pub mod thresholds;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /racks                               latest snapshot (GET)
/// /sites                               distinct sites (GET)
///
/// /alerts/active                       active alerts, filterable (GET)
/// /export/alerts                       CSV export (POST, technician+)
///
/// /thresholds                          global thresholds (GET, PUT operator+)
/// /racks/{rack_id}/thresholds          rack scopes (GET; PUT/DELETE operator+)
///
/// /maintenance                         entries with details (GET)
/// /maintenance/rack                    start individual (POST, technician+)
/// /maintenance/chain                   start chain (POST, technician+)
/// /maintenance/import                  bulk import (POST, technician+)
/// /maintenance/entry/{id}              end entry (DELETE, technician+)
/// /maintenance/rack/{rack_id}          end rack (DELETE, technician+)
/// ```
///
/// Mutation authorization is enforced by extractor gates in the handlers;
/// read endpoints are open to the dashboard.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(racks::router())
        .merge(alerts::router())
        .merge(thresholds::router())
        .merge(maintenance::router())
}
