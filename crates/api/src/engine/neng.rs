//! HTTP client for the upstream NENG inventory API.
//!
//! NENG exposes two independent JSON-array endpoints -- `/device` (identity
//! and topology) and `/power` (live readings) -- each wrapped in a
//! `{code, data}` envelope. A batch is only complete when both succeed; a
//! partial batch must never reach the reconciler, so any failure after
//! retries fails the whole fetch.

use std::collections::HashMap;
use std::time::Duration;

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use rackwatch_core::pdu::{PduReading, Phase};

use crate::config::NengSettings;

/// Retry delays in seconds (exponential backoff: 1s, 2s; three attempts total).
const RETRY_DELAYS_SECS: [u64; 2] = [1, 2];

/// Maximum random jitter added to each backoff delay.
const MAX_JITTER_MS: u64 = 500;

/// HTTP request timeout for a single fetch attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for upstream fetch failures.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The underlying HTTP request failed (network, DNS, timeout, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("NENG returned HTTP {0}")]
    HttpStatus(u16),

    /// The response envelope carried a non-200 application code.
    #[error("NENG envelope code {0}")]
    EnvelopeCode(i64),
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// The `{code, data}` envelope both endpoints return.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Envelope<T> {
    code: i64,
    #[serde(default)]
    data: Vec<T>,
}

/// One entry from the `/device` endpoint (identity and topology).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NengDevice {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub rack_id: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub site: String,
    #[serde(default)]
    pub dc: String,
    #[serde(default)]
    pub phase: String,
    #[serde(default)]
    pub chain: String,
    #[serde(default)]
    pub node: String,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub gw_name: String,
    #[serde(default)]
    pub gw_ip: String,
}

/// One entry from the `/power` endpoint (live readings).
///
/// Measurement fields use the lenient decoder: anything that is not a
/// number (or numeric string) becomes `None` -- "unreadable", never zero.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NengPowerRecord {
    #[serde(deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_amps: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_volts: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_watts: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sensor_temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub sensor_humidity: Option<f64>,
}

/// Accept a JSON number or numeric string; anything else becomes `None`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accept a JSON string or number as a string identifier.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Fetches and joins PDU batches from NENG.
pub struct NengClient {
    client: reqwest::Client,
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl NengClient {
    /// Create a client with a pre-configured HTTP timeout.
    pub fn new(settings: &NengSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");

        Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            username: settings.username.clone(),
            password: settings.password.clone(),
        }
    }

    /// Fetch one complete batch of joined PDU readings.
    ///
    /// Both endpoints must succeed (with retries); otherwise the whole
    /// batch fails and the caller skips reconciliation for this cycle.
    pub async fn fetch_batch(&self) -> Result<Vec<PduReading>, FetchError> {
        let devices: Vec<NengDevice> = self.fetch_with_retry("device").await?;
        let power: Vec<NengPowerRecord> = self.fetch_with_retry("power").await?;
        Ok(join_batch(devices, power))
    }

    /// Fetch one endpoint, retrying with exponential backoff plus jitter.
    async fn fetch_with_retry<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Vec<T>, FetchError> {
        for (attempt, delay_secs) in RETRY_DELAYS_SECS.iter().enumerate() {
            match self.fetch_once(path).await {
                Ok(data) => return Ok(data),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        path,
                        error = %e,
                        "NENG fetch attempt failed, retrying"
                    );
                    let jitter = rand::rng().random_range(0..MAX_JITTER_MS);
                    tokio::time::sleep(Duration::from_millis(delay_secs * 1000 + jitter)).await;
                }
            }
        }

        // Final attempt after the last backoff.
        self.fetch_once(path).await.inspect_err(|e| {
            tracing::error!(path, error = %e, "NENG fetch failed after all retries");
        })
    }

    /// Execute a single GET and unwrap the `{code, data}` envelope.
    async fn fetch_once<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, FetchError> {
        let url = format!("{}/{path}", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(username) = &self.username {
            request = request.basic_auth(username, self.password.as_deref());
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let envelope: Envelope<T> = response.json().await?;
        if envelope.code != 200 {
            return Err(FetchError::EnvelopeCode(envelope.code));
        }
        Ok(envelope.data)
    }
}

/// Join device and power records by device id.
///
/// A record present in only one endpoint cannot be evaluated and is dropped
/// from the cycle.
pub fn join_batch(devices: Vec<NengDevice>, power: Vec<NengPowerRecord>) -> Vec<PduReading> {
    let mut power_by_id: HashMap<String, NengPowerRecord> =
        power.into_iter().map(|p| (p.id.clone(), p)).collect();

    let mut readings = Vec::with_capacity(devices.len());
    for device in devices {
        let Some(power) = power_by_id.remove(&device.id) else {
            tracing::debug!(device_id = %device.id, "Device has no power record, dropped");
            continue;
        };

        readings.push(PduReading {
            pdu_id: device.id,
            rack_id: device.rack_id,
            name: device.name,
            country: device.country,
            site: device.site,
            dc: device.dc,
            phase: Phase::parse(&device.phase),
            chain: device.chain,
            node: device.node,
            serial: device.serial,
            gw_name: device.gw_name,
            gw_ip: device.gw_ip,
            current: power.total_amps,
            voltage: power.total_volts,
            power: power.total_watts,
            temperature: power.temperature,
            sensor_temperature: power.sensor_temperature,
            sensor_humidity: power.sensor_humidity,
        });
    }
    readings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
