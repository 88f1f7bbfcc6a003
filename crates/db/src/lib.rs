//! PostgreSQL persistence for rackwatch.
//!
//! Pool management, migrations, row models, and the repositories for the
//! threshold store, the maintenance registry, and the active-alert table.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Per-statement timeout applied to every connection.
const STATEMENT_TIMEOUT: &str = "5s";

/// Create a connection pool from a database URL.
///
/// Every connection gets a server-side statement timeout so a stuck query
/// cannot wedge a request handler or the evaluation loop.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(database_url)?
        .options([("statement_timeout", STATEMENT_TIMEOUT)]);

    PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
}

/// Verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
