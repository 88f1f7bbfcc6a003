// All functions in this module are shared test helpers. Not every test binary
// uses every helper, so we suppress dead_code warnings at the item level.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use rackwatch_api::auth::jwt::{generate_access_token, JwtConfig};
use rackwatch_api::config::{NengSettings, ServerConfig};
use rackwatch_api::engine::snapshot::SnapshotCell;
use rackwatch_api::router::build_app_router;
use rackwatch_api::state::AppState;

/// Build a test `ServerConfig` with safe defaults.
///
/// The NENG settings point at a dead localhost port -- integration tests
/// never run the evaluation loop, only the HTTP surface.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        cycle_interval_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests-minimum-length".to_string(),
        },
        neng: NengSettings {
            base_url: "http://127.0.0.1:9".to_string(),
            username: None,
            password: None,
        },
    }
}

/// Build the full application router with all middleware layers, using the
/// given database pool and an empty snapshot cell.
pub async fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_snapshot(pool, SnapshotCell::new()).await
}

/// Build the test app with a pre-populated snapshot cell (for endpoints
/// that read the latest evaluation snapshot).
pub async fn build_test_app_with_snapshot(pool: PgPool, snapshot: SnapshotCell) -> Router {
    let config = test_config();

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        snapshot,
    };

    build_app_router(state, &config)
}

/// Mint an access token for the given role.
pub fn token_for(role: &str) -> String {
    generate_access_token("test-operator", role, 15, &test_config().jwt)
        .expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// Shared HTTP test helpers
// ---------------------------------------------------------------------------

/// Collect the response body into a `serde_json::Value`.
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Collect the response body as a string (CSV exports).
pub async fn body_text(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// GET from the given URI.
pub async fn get(app: Router, uri: &str) -> axum::response::Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a JSON request with the given HTTP method and a Bearer token.
pub async fn send_json_auth(
    app: Router,
    method: Method,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> axum::response::Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST JSON with a Bearer token.
pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> axum::response::Response {
    send_json_auth(app, Method::POST, uri, body, token).await
}

/// PUT JSON with a Bearer token.
pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> axum::response::Response {
    send_json_auth(app, Method::PUT, uri, body, token).await
}

/// PUT JSON without authentication (401 paths).
pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> axum::response::Response {
    let request = Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST with a Bearer token and no body.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> axum::response::Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// DELETE the given URI with a Bearer token.
pub async fn delete_auth(app: Router, uri: &str, token: &str) -> axum::response::Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// POST a multipart file upload with a Bearer token.
pub async fn post_multipart_auth(
    app: Router,
    uri: &str,
    file_contents: &str,
    token: &str,
) -> axum::response::Response {
    let boundary = "rackwatch-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"racks.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {file_contents}\r\n\
         --{boundary}--\r\n"
    );
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap();
    app.oneshot(request).await.unwrap()
}
