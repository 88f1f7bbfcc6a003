use std::sync::Arc;

use crate::config::ServerConfig;
use crate::engine::snapshot::SnapshotCell;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: rackwatch_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Latest evaluation-cycle snapshot (written by the engine, read by
    /// handlers via atomic pointer load).
    pub snapshot: SnapshotCell,
}
