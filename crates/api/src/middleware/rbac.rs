//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does
//! not hold the required permission. The permission predicates live in
//! `rackwatch_core::roles`; gates run before any store access, so a denied
//! request has no side effects.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use rackwatch_core::error::CoreError;
use rackwatch_core::roles;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires a role that may edit threshold configuration
/// (administrator or operator). Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn edit(RequireThresholdEditor(user): RequireThresholdEditor) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireThresholdEditor(pub AuthUser);

impl FromRequestParts<AppState> for RequireThresholdEditor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !roles::can_edit_thresholds(&user.role) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Threshold configuration requires administrator or operator role".into(),
            )));
        }
        Ok(RequireThresholdEditor(user))
    }
}

/// Requires a role that may start or end maintenance
/// (administrator, operator, or technician).
pub struct RequireMaintenanceOperator(pub AuthUser);

impl FromRequestParts<AppState> for RequireMaintenanceOperator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !roles::can_manage_maintenance(&user.role) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Maintenance operations require administrator, operator, or technician role"
                    .into(),
            )));
        }
        Ok(RequireMaintenanceOperator(user))
    }
}

/// Requires a role that may export the active-alert table
/// (administrator, operator, or technician).
pub struct RequireAlertExporter(pub AuthUser);

impl FromRequestParts<AppState> for RequireAlertExporter {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !roles::can_export_alerts(&user.role) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Alert export requires administrator, operator, or technician role".into(),
            )));
        }
        Ok(RequireAlertExporter(user))
    }
}
