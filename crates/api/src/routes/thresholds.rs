//! Route definitions for threshold configuration endpoints.

use axum::routing::get;
use axum::Router;

use crate::handlers::thresholds;
use crate::state::AppState;

/// Threshold routes.
///
/// ```text
/// GET    /thresholds                      -> list_global
/// PUT    /thresholds                      -> put_global (threshold editor)
/// GET    /racks/{rack_id}/thresholds      -> get_rack_thresholds
/// PUT    /racks/{rack_id}/thresholds      -> put_rack_thresholds (threshold editor)
/// DELETE /racks/{rack_id}/thresholds      -> delete_rack_thresholds (threshold editor)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/thresholds",
            get(thresholds::list_global).put(thresholds::put_global),
        )
        .route(
            "/racks/{rack_id}/thresholds",
            get(thresholds::get_rack_thresholds)
                .put(thresholds::put_rack_thresholds)
                .delete(thresholds::delete_rack_thresholds),
        )
}
