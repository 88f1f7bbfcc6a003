//! Threshold classification engine for PDU readings.
//!
//! Pure logic -- no database access. The caller is responsible for fetching
//! readings and resolving effective thresholds, then passing them in.
//!
//! Each metric is evaluated independently against four bounds
//! (critical-low, warning-low, warning-high, critical-high) using closed
//! intervals; the result is the union of reasons across metrics.

use serde::Serialize;

use crate::pdu::{PduReading, Phase};
use crate::threshold_keys::{self as keys, EffectiveThresholds};

/// Raw upstream field names recorded on alerts (`alert_field`).
pub const FIELD_CURRENT: &str = "current";
pub const FIELD_VOLTAGE: &str = "voltage";
pub const FIELD_TEMPERATURE: &str = "temperature";
pub const FIELD_SENSOR_HUMIDITY: &str = "sensorHumidity";

/// Severity of an emitted reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Critical,
}

/// The metric a reason belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Amperage,
    Voltage,
    Temperature,
    Humidity,
}

impl MetricType {
    /// Return the database string representation (`metric_type` column).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Amperage => "amperage",
            Self::Voltage => "voltage",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
        }
    }
}

/// Overall status of a PDU derived from its reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PduStatus {
    Normal,
    Warning,
    Critical,
}

/// A single violated bound (or anomaly) for one PDU metric.
#[derive(Debug, Clone, Serialize)]
pub struct Reason {
    /// Reason code -- the crossed threshold key (e.g.
    /// `critical_amperage_high_single_phase`) or
    /// `warning_amperage_invalid_reading`.
    pub code: String,
    pub severity: Severity,
    pub metric: MetricType,
    /// The observed value that triggered the reason; `None` for the
    /// invalid-reading anomaly.
    pub value: Option<f64>,
    /// The bound that was crossed; `None` for the invalid-reading anomaly.
    pub threshold: Option<f64>,
    /// Raw upstream field name the value came from.
    pub field: &'static str,
}

/// Classifier output for one PDU.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub status: PduStatus,
    pub reasons: Vec<Reason>,
}

// ---------------------------------------------------------------------------
// Bounds resolution
// ---------------------------------------------------------------------------

/// The four bounds for one metric, with the key names that defined them.
/// Key order: critical-low, warning-low, warning-high, critical-high.
struct Bounds {
    keys: [&'static str; 4],
    critical_low: f64,
    warning_low: f64,
    warning_high: f64,
    critical_high: f64,
}

/// Look up all four bounds for a metric.
///
/// Returns `None` (metric not evaluated) when any bound is absent. When
/// `require_positive` is set, bounds <= 0 also disable the metric; voltage
/// passes `false` because a lower bound of 0 stays meaningful there.
fn resolve_bounds(
    effective: &EffectiveThresholds,
    bound_keys: [&'static str; 4],
    require_positive: bool,
) -> Option<Bounds> {
    let mut values = [0.0_f64; 4];
    for (slot, key) in values.iter_mut().zip(bound_keys) {
        let value = *effective.get(key)?;
        if require_positive && value <= 0.0 {
            return None;
        }
        *slot = value;
    }
    Some(Bounds {
        keys: bound_keys,
        critical_low: values[0],
        warning_low: values[1],
        warning_high: values[2],
        critical_high: values[3],
    })
}

/// Compare a value against the bounds (closed intervals) and return the
/// crossed key, its severity, and the bound value.
fn check_bounds(value: f64, bounds: &Bounds) -> Option<(&'static str, Severity, f64)> {
    if value <= bounds.critical_low {
        Some((bounds.keys[0], Severity::Critical, bounds.critical_low))
    } else if value >= bounds.critical_high {
        Some((bounds.keys[3], Severity::Critical, bounds.critical_high))
    } else if value <= bounds.warning_low {
        Some((bounds.keys[1], Severity::Warning, bounds.warning_low))
    } else if value >= bounds.warning_high {
        Some((bounds.keys[2], Severity::Warning, bounds.warning_high))
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Classify a single PDU reading against its effective thresholds.
///
/// Deterministic and order-independent: the reason set is the union over
/// metrics, and the status is derived from reason severities alone.
pub fn classify(reading: &PduReading, effective: &EffectiveThresholds) -> Classification {
    let mut reasons = Vec::new();

    check_amperage(reading, effective, &mut reasons);
    check_voltage(reading, effective, &mut reasons);
    check_metric(
        reading.sensor_temperature,
        effective,
        [
            keys::CRITICAL_TEMPERATURE_LOW,
            keys::WARNING_TEMPERATURE_LOW,
            keys::WARNING_TEMPERATURE_HIGH,
            keys::CRITICAL_TEMPERATURE_HIGH,
        ],
        MetricType::Temperature,
        FIELD_TEMPERATURE,
        &mut reasons,
    );
    check_metric(
        reading.sensor_humidity,
        effective,
        [
            keys::CRITICAL_HUMIDITY_LOW,
            keys::WARNING_HUMIDITY_LOW,
            keys::WARNING_HUMIDITY_HIGH,
            keys::CRITICAL_HUMIDITY_HIGH,
        ],
        MetricType::Humidity,
        FIELD_SENSOR_HUMIDITY,
        &mut reasons,
    );

    let status = derive_status(&reasons);
    Classification { status, reasons }
}

/// Derive the overall PDU status from the reason set.
pub fn derive_status(reasons: &[Reason]) -> PduStatus {
    if reasons.iter().any(|r| r.severity == Severity::Critical) {
        PduStatus::Critical
    } else if reasons.is_empty() {
        PduStatus::Normal
    } else {
        PduStatus::Warning
    }
}

/// Amperage evaluation: phase-split keys, invalid-reading anomaly, and the
/// no-load exemption (a reading of exactly 0 A is legitimate, never
/// critical-low).
fn check_amperage(
    reading: &PduReading,
    effective: &EffectiveThresholds,
    reasons: &mut Vec<Reason>,
) {
    let bound_keys = match reading.phase {
        Phase::SinglePhase => [
            keys::CRITICAL_AMPERAGE_LOW_SINGLE_PHASE,
            keys::WARNING_AMPERAGE_LOW_SINGLE_PHASE,
            keys::WARNING_AMPERAGE_HIGH_SINGLE_PHASE,
            keys::CRITICAL_AMPERAGE_HIGH_SINGLE_PHASE,
        ],
        Phase::ThreePhase => [
            keys::CRITICAL_AMPERAGE_LOW_3_PHASE,
            keys::WARNING_AMPERAGE_LOW_3_PHASE,
            keys::WARNING_AMPERAGE_HIGH_3_PHASE,
            keys::CRITICAL_AMPERAGE_HIGH_3_PHASE,
        ],
        Phase::Unknown => return,
    };

    let Some(bounds) = resolve_bounds(effective, bound_keys, true) else {
        return;
    };

    let value = match reading.current {
        Some(value) => value,
        None => {
            reasons.push(Reason {
                code: keys::WARNING_AMPERAGE_INVALID_READING.to_string(),
                severity: Severity::Warning,
                metric: MetricType::Amperage,
                value: None,
                threshold: None,
                field: FIELD_CURRENT,
            });
            return;
        }
    };

    if value == 0.0 {
        return;
    }

    if let Some((code, severity, threshold)) = check_bounds(value, &bounds) {
        reasons.push(Reason {
            code: code.to_string(),
            severity,
            metric: MetricType::Amperage,
            value: Some(value),
            threshold: Some(threshold),
            field: FIELD_CURRENT,
        });
    }
}

/// Voltage evaluation. A reading of exactly 0 V means "no energy" and always
/// emits `critical_voltage_low` once the voltage bounds are configured, so a
/// configured lower bound of 0 stays meaningful here.
fn check_voltage(reading: &PduReading, effective: &EffectiveThresholds, reasons: &mut Vec<Reason>) {
    let bound_keys = [
        keys::CRITICAL_VOLTAGE_LOW,
        keys::WARNING_VOLTAGE_LOW,
        keys::WARNING_VOLTAGE_HIGH,
        keys::CRITICAL_VOLTAGE_HIGH,
    ];
    let Some(bounds) = resolve_bounds(effective, bound_keys, false) else {
        return;
    };
    let Some(value) = reading.voltage else {
        return;
    };

    let crossed = if value == 0.0 {
        Some((keys::CRITICAL_VOLTAGE_LOW, Severity::Critical, bounds.critical_low))
    } else {
        check_bounds(value, &bounds)
    };

    if let Some((code, severity, threshold)) = crossed {
        reasons.push(Reason {
            code: code.to_string(),
            severity,
            metric: MetricType::Voltage,
            value: Some(value),
            threshold: Some(threshold),
            field: FIELD_VOLTAGE,
        });
    }
}

/// Shared evaluation path for temperature and humidity.
fn check_metric(
    value: Option<f64>,
    effective: &EffectiveThresholds,
    bound_keys: [&'static str; 4],
    metric: MetricType,
    field: &'static str,
    reasons: &mut Vec<Reason>,
) {
    let Some(bounds) = resolve_bounds(effective, bound_keys, true) else {
        return;
    };
    let Some(value) = value else {
        return;
    };
    if let Some((code, severity, threshold)) = check_bounds(value, &bounds) {
        reasons.push(Reason {
            code: code.to_string(),
            severity,
            metric,
            value: Some(value),
            threshold: Some(threshold),
            field,
        });
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
