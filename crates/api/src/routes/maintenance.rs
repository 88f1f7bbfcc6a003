//! Route definitions for the maintenance registry endpoints.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::maintenance;
use crate::state::AppState;

/// Maintenance routes. Mutations require maintenance permission
/// (enforced by handler extractors).
///
/// ```text
/// GET    /maintenance                 -> list
/// POST   /maintenance/rack            -> start_rack
/// POST   /maintenance/chain           -> start_chain
/// POST   /maintenance/import          -> import (multipart)
/// DELETE /maintenance/entry/{id}      -> end_entry
/// DELETE /maintenance/rack/{rack_id}  -> end_rack
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/maintenance", get(maintenance::list))
        .route("/maintenance/rack", post(maintenance::start_rack))
        .route("/maintenance/chain", post(maintenance::start_chain))
        .route("/maintenance/import", post(maintenance::import))
        .route("/maintenance/entry/{id}", delete(maintenance::end_entry))
        .route("/maintenance/rack/{rack_id}", delete(maintenance::end_rack))
}
