//! Handlers for threshold configuration endpoints.
//!
//! Bulk upserts validate the entire body against the closed key vocabulary
//! before touching the database, so an invalid request has no side effects.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::Json;

use rackwatch_core::error::CoreError;
use rackwatch_core::threshold_keys;
use rackwatch_db::models::threshold::{RackThresholds, ThresholdConfig, UpsertThresholdEntry};
use rackwatch_db::repositories::ThresholdRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireThresholdEditor;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Validate a `key -> value` body and convert it to upsert DTOs.
fn validate_entries(body: &HashMap<String, f64>) -> AppResult<Vec<UpsertThresholdEntry>> {
    if body.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Threshold body must contain at least one key".to_string(),
        )));
    }

    let mut entries = Vec::with_capacity(body.len());
    for (key, value) in body {
        threshold_keys::validate_key(key)?;
        threshold_keys::validate_value(key, *value)?;
        entries.push(UpsertThresholdEntry::new(key.clone(), *value));
    }
    // Deterministic write order for logs and tests.
    entries.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(entries)
}

/// GET /thresholds
///
/// All global threshold entries.
pub async fn list_global(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<ThresholdConfig>>>> {
    let thresholds = ThresholdRepo::list_global(&state.pool).await?;
    Ok(Json(ApiResponse::list(thresholds)))
}

/// PUT /thresholds
///
/// Bulk upsert of global thresholds; body is `{key: value, ...}` with
/// permitted keys only.
pub async fn put_global(
    State(state): State<AppState>,
    RequireThresholdEditor(_user): RequireThresholdEditor,
    Json(body): Json<HashMap<String, f64>>,
) -> AppResult<Json<ApiResponse<Vec<ThresholdConfig>>>> {
    let entries = validate_entries(&body)?;
    for entry in &entries {
        ThresholdRepo::upsert_global(&state.pool, entry).await?;
    }

    let thresholds = ThresholdRepo::list_global(&state.pool).await?;
    Ok(Json(ApiResponse::list(thresholds)))
}

/// GET /racks/{rack_id}/thresholds
///
/// Both scopes for a rack: the global entries and the rack's overrides.
pub async fn get_rack_thresholds(
    State(state): State<AppState>,
    Path(rack_id): Path<String>,
) -> AppResult<Json<ApiResponse<RackThresholds>>> {
    let global = ThresholdRepo::list_global(&state.pool).await?;
    let rack_specific = ThresholdRepo::list_for_rack(&state.pool, &rack_id).await?;
    Ok(Json(ApiResponse::new(RackThresholds {
        global,
        rack_specific,
    })))
}

/// PUT /racks/{rack_id}/thresholds
///
/// Bulk upsert of per-rack overrides.
pub async fn put_rack_thresholds(
    State(state): State<AppState>,
    RequireThresholdEditor(_user): RequireThresholdEditor,
    Path(rack_id): Path<String>,
    Json(body): Json<HashMap<String, f64>>,
) -> AppResult<Json<ApiResponse<RackThresholds>>> {
    let entries = validate_entries(&body)?;
    for entry in &entries {
        ThresholdRepo::upsert_for_rack(&state.pool, &rack_id, entry).await?;
    }

    let global = ThresholdRepo::list_global(&state.pool).await?;
    let rack_specific = ThresholdRepo::list_for_rack(&state.pool, &rack_id).await?;
    Ok(Json(ApiResponse::new(RackThresholds {
        global,
        rack_specific,
    })))
}

/// DELETE /racks/{rack_id}/thresholds
///
/// Reset a rack to the global thresholds by removing all its overrides.
/// 404 when the rack has none.
pub async fn delete_rack_thresholds(
    State(state): State<AppState>,
    RequireThresholdEditor(_user): RequireThresholdEditor,
    Path(rack_id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let deleted = ThresholdRepo::delete_for_rack(&state.pool, &rack_id).await?;
    if deleted == 0 {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "rack threshold overrides",
            id: rack_id,
        }));
    }

    tracing::info!(rack_id = %rack_id, deleted, "Rack threshold overrides reset");
    Ok(Json(ApiResponse::new(
        serde_json::json!({ "deleted": deleted }),
    )))
}
