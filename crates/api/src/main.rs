use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rackwatch_api::config::ServerConfig;
use rackwatch_api::engine::neng::NengClient;
use rackwatch_api::engine::snapshot::SnapshotCell;
use rackwatch_api::router::build_app_router;
use rackwatch_api::state::AppState;
use rackwatch_api::{background, engine};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rackwatch_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = rackwatch_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    rackwatch_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    rackwatch_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Snapshot cell (empty and stale until the first cycle) ---
    let snapshot = SnapshotCell::new();

    // --- Evaluation engine ---
    let engine_cancel = tokio_util::sync::CancellationToken::new();
    let engine_handle = tokio::spawn(engine::runner::run(
        pool.clone(),
        NengClient::new(&config.neng),
        snapshot.clone(),
        config.cycle_interval_secs,
        engine_cancel.clone(),
    ));
    tracing::info!("Evaluation engine started");

    // --- Background housekeeping ---
    let housekeeping_cancel = tokio_util::sync::CancellationToken::new();
    let housekeeping_handle = tokio::spawn(background::stale_alerts::run(
        pool.clone(),
        config.cycle_interval_secs,
        housekeeping_cancel.clone(),
    ));
    tracing::info!("Stale-alert housekeeping started");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        snapshot,
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Stop the evaluation loop first so no cycle starts mid-shutdown; an
    // in-progress cycle finishes at its next await point.
    engine_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(config.shutdown_timeout_secs), engine_handle)
        .await;
    tracing::info!("Evaluation engine stopped");

    housekeeping_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), housekeeping_handle).await;
    tracing::info!("Housekeeping stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
