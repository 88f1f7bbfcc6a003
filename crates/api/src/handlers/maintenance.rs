//! Handlers for the maintenance registry endpoints.
//!
//! Start operations suppress alerting for the covered racks from the next
//! evaluation cycle on; end operations lift the suppression the same way.
//! Chain membership is resolved from the latest snapshot at start time and
//! persisted -- racks joining the chain later are not auto-suppressed.

use std::collections::HashMap;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use rackwatch_core::error::CoreError;
use rackwatch_core::types::DbId;
use rackwatch_db::models::maintenance::{
    ChainRackCandidate, ChainStartOutcome, ChainStartSummary, ImportRowFailure, ImportSummary,
    MaintenanceEntry, MaintenanceEntryWithDetails, StartChainMaintenance,
    StartIndividualMaintenance,
};
use rackwatch_db::repositories::MaintenanceRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireMaintenanceOperator;
use crate::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for starting individual-rack maintenance.
///
/// The location fields are the caller's rack context (dashboards send what
/// they display); missing fields are backfilled from the latest snapshot.
#[derive(Debug, Deserialize)]
pub struct StartRackRequest {
    pub rack_id: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub site: Option<String>,
    #[serde(default)]
    pub dc: Option<String>,
    #[serde(default)]
    pub chain: Option<String>,
    pub reason: String,
}

/// Request body for starting chain maintenance.
#[derive(Debug, Deserialize)]
pub struct StartChainRequest {
    pub chain: String,
    pub site: String,
    pub dc: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /maintenance
///
/// All entries with their covered racks.
pub async fn list(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<MaintenanceEntryWithDetails>>>> {
    let entries = MaintenanceRepo::list(&state.pool).await?;
    Ok(Json(ApiResponse::list(entries)))
}

// ---------------------------------------------------------------------------
// Start
// ---------------------------------------------------------------------------

/// POST /maintenance/rack
///
/// Put a single rack into maintenance. Conflict when the rack is already
/// covered by any entry.
pub async fn start_rack(
    State(state): State<AppState>,
    RequireMaintenanceOperator(user): RequireMaintenanceOperator,
    Json(input): Json<StartRackRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<MaintenanceEntry>>)> {
    if input.rack_id.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "rack_id is required".to_string(),
        )));
    }

    if MaintenanceRepo::is_rack_suppressed(&state.pool, &input.rack_id).await? {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Rack '{}' is already in maintenance",
            input.rack_id
        ))));
    }

    let dto = individual_dto(&state, &input, &user.subject);
    let entry = MaintenanceRepo::start_individual(&state.pool, &dto).await?;

    tracing::info!(rack_id = %dto.rack_id, started_by = %user.subject, "Rack maintenance started");
    Ok((StatusCode::CREATED, Json(ApiResponse::new(entry))))
}

/// POST /maintenance/chain
///
/// Put every rack currently matching `(chain, site, dc)` into maintenance.
/// Membership comes from the latest snapshot; racks already in maintenance
/// are skipped and reported, zero matches is a validation error.
pub async fn start_chain(
    State(state): State<AppState>,
    RequireMaintenanceOperator(user): RequireMaintenanceOperator,
    Json(input): Json<StartChainRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ChainStartSummary>>)> {
    if input.chain.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "chain is required".to_string(),
        )));
    }

    let candidates = chain_candidates(&state, &input.chain, &input.site, &input.dc);
    let total = candidates.len();
    if total == 0 {
        return Err(AppError::Core(CoreError::Validation(format!(
            "No racks found for chain '{}' in {}/{}",
            input.chain, input.site, input.dc
        ))));
    }

    let dto = StartChainMaintenance {
        chain: input.chain,
        site: input.site,
        dc: input.dc,
        reason: input.reason,
        started_by: user.subject.clone(),
    };

    match MaintenanceRepo::start_chain(&state.pool, &dto, &candidates).await? {
        ChainStartOutcome::Started { added, skipped, .. } => {
            tracing::info!(
                chain = %dto.chain,
                added = added.len(),
                skipped = skipped.len(),
                started_by = %user.subject,
                "Chain maintenance started"
            );
            Ok((
                StatusCode::CREATED,
                Json(ApiResponse::new(ChainStartSummary {
                    added: added.len(),
                    skipped: skipped.len(),
                    total,
                })),
            ))
        }
        ChainStartOutcome::AllAlreadyInMaintenance { skipped } => {
            Err(AppError::Core(CoreError::Conflict(format!(
                "All {} racks of chain '{}' are already in maintenance",
                skipped.len(),
                dto.chain
            ))))
        }
    }
}

/// POST /maintenance/import
///
/// Bulk individual starts from an uploaded tabular file. Each line is
/// `rack_id[,reason]`; an optional header row is skipped. Per-row failures
/// never abort the batch -- the summary reports every outcome.
pub async fn import(
    State(state): State<AppState>,
    RequireMaintenanceOperator(user): RequireMaintenanceOperator,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<ImportSummary>>> {
    let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    else {
        return Err(AppError::BadRequest(
            "No file received in multipart upload".to_string(),
        ));
    };
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let content = String::from_utf8_lossy(&data).into_owned();

    let mut summary = ImportSummary::default();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        // Skip a header row if present.
        if index == 0 && line.to_ascii_lowercase().starts_with("rack_id") {
            continue;
        }

        summary.total += 1;
        let row = index + 1;

        let (rack_id, reason) = match line.split_once(',') {
            Some((rack_id, reason)) => (rack_id.trim(), reason.trim()),
            None => (line, ""),
        };

        if rack_id.is_empty() {
            summary.failed.push(ImportRowFailure {
                row,
                rack_id: String::new(),
                message: "rack_id is empty".to_string(),
            });
            continue;
        }

        match MaintenanceRepo::is_rack_suppressed(&state.pool, rack_id).await {
            Ok(true) => {
                summary.already_in_maintenance += 1;
                continue;
            }
            Ok(false) => {}
            Err(e) => {
                summary.failed.push(ImportRowFailure {
                    row,
                    rack_id: rack_id.to_string(),
                    message: e.to_string(),
                });
                continue;
            }
        }

        let request = StartRackRequest {
            rack_id: rack_id.to_string(),
            country: None,
            site: None,
            dc: None,
            chain: None,
            reason: reason.to_string(),
        };
        let dto = individual_dto(&state, &request, &user.subject);

        match MaintenanceRepo::start_individual(&state.pool, &dto).await {
            Ok(_) => summary.successful += 1,
            Err(e) => summary.failed.push(ImportRowFailure {
                row,
                rack_id: rack_id.to_string(),
                message: e.to_string(),
            }),
        }
    }

    tracing::info!(
        total = summary.total,
        successful = summary.successful,
        already_in_maintenance = summary.already_in_maintenance,
        failed = summary.failed.len(),
        started_by = %user.subject,
        "Maintenance import processed"
    );
    Ok(Json(ApiResponse::new(summary)))
}

// ---------------------------------------------------------------------------
// End
// ---------------------------------------------------------------------------

/// DELETE /maintenance/entry/{id}
///
/// End an entry; all its rack details go with it.
pub async fn end_entry(
    State(state): State<AppState>,
    RequireMaintenanceOperator(user): RequireMaintenanceOperator,
    Path(entry_id): Path<DbId>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let ended = MaintenanceRepo::end_entry(&state.pool, entry_id).await?;
    if !ended {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "maintenance entry",
            id: entry_id.to_string(),
        }));
    }

    tracing::info!(entry_id, ended_by = %user.subject, "Maintenance entry ended");
    Ok(Json(ApiResponse::new(
        serde_json::json!({ "entry_id": entry_id }),
    )))
}

/// DELETE /maintenance/rack/{rack_id}
///
/// Remove a single rack from maintenance. The parent entry ends too when
/// this was its last rack.
pub async fn end_rack(
    State(state): State<AppState>,
    RequireMaintenanceOperator(user): RequireMaintenanceOperator,
    Path(rack_id): Path<String>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let ended = MaintenanceRepo::end_rack(&state.pool, &rack_id).await?;
    if !ended {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "maintenance rack",
            id: rack_id,
        }));
    }

    tracing::info!(ended_by = %user.subject, "Rack maintenance ended");
    Ok(Json(ApiResponse::new(serde_json::json!({ "ended": true }))))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build the repository DTO, backfilling location context from the latest
/// snapshot when the request leaves it out.
fn individual_dto(
    state: &AppState,
    input: &StartRackRequest,
    started_by: &str,
) -> StartIndividualMaintenance {
    let snapshot = state.snapshot.load();
    let observed = snapshot
        .pdus
        .iter()
        .find(|p| p.reading.rack_id == input.rack_id)
        .map(|p| &p.reading);

    let pick = |explicit: &Option<String>, from_snapshot: Option<&String>| {
        explicit
            .clone()
            .or_else(|| from_snapshot.cloned())
            .unwrap_or_default()
    };

    StartIndividualMaintenance {
        rack_id: input.rack_id.clone(),
        country: pick(&input.country, observed.map(|r| &r.country)),
        site: pick(&input.site, observed.map(|r| &r.site)),
        dc: pick(&input.dc, observed.map(|r| &r.dc)),
        chain: pick(&input.chain, observed.map(|r| &r.chain)),
        reason: input.reason.clone(),
        started_by: started_by.to_string(),
    }
}

/// Distinct racks in the latest snapshot matching `(chain, site, dc)`.
fn chain_candidates(
    state: &AppState,
    chain: &str,
    site: &str,
    dc: &str,
) -> Vec<ChainRackCandidate> {
    let snapshot = state.snapshot.load();
    let mut by_rack: HashMap<String, ChainRackCandidate> = HashMap::new();

    for pdu in &snapshot.pdus {
        let reading = &pdu.reading;
        if reading.chain == chain && reading.site == site && reading.dc == dc {
            by_rack
                .entry(reading.rack_id.clone())
                .or_insert_with(|| ChainRackCandidate {
                    rack_id: reading.rack_id.clone(),
                    country: reading.country.clone(),
                    site: reading.site.clone(),
                    dc: reading.dc.clone(),
                    chain: reading.chain.clone(),
                });
        }
    }

    let mut candidates: Vec<ChainRackCandidate> = by_rack.into_values().collect();
    candidates.sort_by(|a, b| a.rack_id.cmp(&b.rack_id));
    candidates
}
