//! Route definitions for the live snapshot endpoints.

use axum::routing::get;
use axum::Router;

use crate::handlers::racks;
use crate::state::AppState;

/// Snapshot routes.
///
/// ```text
/// GET /racks -> get_racks
/// GET /sites -> get_sites
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/racks", get(racks::get_racks))
        .route("/sites", get(racks::get_sites))
}
