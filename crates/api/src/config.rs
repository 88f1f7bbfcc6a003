use crate::auth::jwt::JwtConfig;

/// Default evaluation cadence in seconds.
const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 30;

/// Server configuration loaded from environment variables.
///
/// All fields except the NENG base URL and the JWT secret have defaults
/// suitable for local development. Missing required configuration is fatal
/// at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// Seconds between evaluation cycles (default: `30`).
    pub cycle_interval_secs: u64,
    /// JWT validation configuration (secret).
    pub jwt: JwtConfig,
    /// Upstream NENG connection settings.
    pub neng: NengSettings,
}

/// Connection settings for the upstream NENG inventory API.
#[derive(Debug, Clone)]
pub struct NengSettings {
    /// Base URL; `/device` and `/power` are appended per request.
    pub base_url: String,
    /// Optional basic-auth credentials.
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Required | Default                 |
    /// |-------------------------|----------|-------------------------|
    /// | `HOST`                  | no       | `0.0.0.0`               |
    /// | `PORT`                  | no       | `3000`                  |
    /// | `CORS_ORIGINS`          | no       | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`  | no       | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS` | no       | `30`                    |
    /// | `CYCLE_INTERVAL_SECS`   | no       | `30`                    |
    /// | `JWT_SECRET`            | **yes**  | --                      |
    /// | `NENG_BASE_URL`         | **yes**  | --                      |
    /// | `NENG_USERNAME`         | no       | --                      |
    /// | `NENG_PASSWORD`         | no       | --                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let cycle_interval_secs: u64 = std::env::var("CYCLE_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_CYCLE_INTERVAL_SECS.to_string())
            .parse()
            .expect("CYCLE_INTERVAL_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();
        let neng = NengSettings::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            cycle_interval_secs,
            jwt,
            neng,
        }
    }
}

impl NengSettings {
    /// Load NENG settings from environment variables.
    ///
    /// # Panics
    ///
    /// Panics if `NENG_BASE_URL` is not set -- there is nothing to monitor
    /// without an upstream.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("NENG_BASE_URL").expect("NENG_BASE_URL must be set in the environment");

        Self {
            base_url,
            username: std::env::var("NENG_USERNAME").ok(),
            password: std::env::var("NENG_PASSWORD").ok(),
        }
    }
}
