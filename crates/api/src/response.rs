//! Shared response envelope types for API handlers.
//!
//! Every success response uses `{ "success": true, "data": ..., "count"?: n }`;
//! error paths produce `{ "success": false, "message": ... }` via
//! [`crate::error::AppError`]. Use [`ApiResponse`] instead of ad-hoc
//! `serde_json::json!` so the shape stays consistent.

use serde::Serialize;

/// Standard success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a single payload.
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            count: None,
        }
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// Wrap a collection payload and set `count` to its length.
    pub fn list(data: Vec<T>) -> Self {
        let count = data.len();
        Self {
            success: true,
            data,
            count: Some(count),
        }
    }
}
