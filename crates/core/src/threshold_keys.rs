//! The closed threshold-key vocabulary and effective-threshold layering.
//!
//! Keys are the canonical names used in the `threshold_configs` and
//! `rack_threshold_overrides` tables, in alert reasons, and by the
//! classifier. Any key outside this set must be rejected on write.

use std::collections::HashMap;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Key constants
// ---------------------------------------------------------------------------

pub const CRITICAL_TEMPERATURE_LOW: &str = "critical_temperature_low";
pub const CRITICAL_TEMPERATURE_HIGH: &str = "critical_temperature_high";
pub const WARNING_TEMPERATURE_LOW: &str = "warning_temperature_low";
pub const WARNING_TEMPERATURE_HIGH: &str = "warning_temperature_high";

pub const CRITICAL_HUMIDITY_LOW: &str = "critical_humidity_low";
pub const CRITICAL_HUMIDITY_HIGH: &str = "critical_humidity_high";
pub const WARNING_HUMIDITY_LOW: &str = "warning_humidity_low";
pub const WARNING_HUMIDITY_HIGH: &str = "warning_humidity_high";

pub const CRITICAL_AMPERAGE_LOW_SINGLE_PHASE: &str = "critical_amperage_low_single_phase";
pub const CRITICAL_AMPERAGE_HIGH_SINGLE_PHASE: &str = "critical_amperage_high_single_phase";
pub const WARNING_AMPERAGE_LOW_SINGLE_PHASE: &str = "warning_amperage_low_single_phase";
pub const WARNING_AMPERAGE_HIGH_SINGLE_PHASE: &str = "warning_amperage_high_single_phase";

pub const CRITICAL_AMPERAGE_LOW_3_PHASE: &str = "critical_amperage_low_3_phase";
pub const CRITICAL_AMPERAGE_HIGH_3_PHASE: &str = "critical_amperage_high_3_phase";
pub const WARNING_AMPERAGE_LOW_3_PHASE: &str = "warning_amperage_low_3_phase";
pub const WARNING_AMPERAGE_HIGH_3_PHASE: &str = "warning_amperage_high_3_phase";

pub const CRITICAL_VOLTAGE_LOW: &str = "critical_voltage_low";
pub const CRITICAL_VOLTAGE_HIGH: &str = "critical_voltage_high";
pub const WARNING_VOLTAGE_LOW: &str = "warning_voltage_low";
pub const WARNING_VOLTAGE_HIGH: &str = "warning_voltage_high";

pub const CRITICAL_POWER_HIGH: &str = "critical_power_high";
pub const WARNING_POWER_HIGH: &str = "warning_power_high";

/// Synthetic reason emitted when the amperage reading is not a number.
/// Not a configurable threshold key.
pub const WARNING_AMPERAGE_INVALID_READING: &str = "warning_amperage_invalid_reading";

/// Every key the threshold store accepts.
pub const VALID_THRESHOLD_KEYS: &[&str] = &[
    CRITICAL_TEMPERATURE_LOW,
    CRITICAL_TEMPERATURE_HIGH,
    WARNING_TEMPERATURE_LOW,
    WARNING_TEMPERATURE_HIGH,
    CRITICAL_HUMIDITY_LOW,
    CRITICAL_HUMIDITY_HIGH,
    WARNING_HUMIDITY_LOW,
    WARNING_HUMIDITY_HIGH,
    CRITICAL_AMPERAGE_LOW_SINGLE_PHASE,
    CRITICAL_AMPERAGE_HIGH_SINGLE_PHASE,
    WARNING_AMPERAGE_LOW_SINGLE_PHASE,
    WARNING_AMPERAGE_HIGH_SINGLE_PHASE,
    CRITICAL_AMPERAGE_LOW_3_PHASE,
    CRITICAL_AMPERAGE_HIGH_3_PHASE,
    WARNING_AMPERAGE_LOW_3_PHASE,
    WARNING_AMPERAGE_HIGH_3_PHASE,
    CRITICAL_VOLTAGE_LOW,
    CRITICAL_VOLTAGE_HIGH,
    WARNING_VOLTAGE_LOW,
    WARNING_VOLTAGE_HIGH,
    CRITICAL_POWER_HIGH,
    WARNING_POWER_HIGH,
];

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Whether `key` belongs to the closed threshold vocabulary.
pub fn is_valid_key(key: &str) -> bool {
    VALID_THRESHOLD_KEYS.contains(&key)
}

/// Validate a threshold key, returning an error naming the offending key.
pub fn validate_key(key: &str) -> Result<(), CoreError> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Unknown threshold key: '{key}'"
        )))
    }
}

/// Validate a threshold value: must be a finite number >= 0.
pub fn validate_value(key: &str, value: f64) -> Result<(), CoreError> {
    if !value.is_finite() {
        return Err(CoreError::Validation(format!(
            "Threshold '{key}' must be a finite number, got {value}"
        )));
    }
    if value < 0.0 {
        return Err(CoreError::Validation(format!(
            "Threshold '{key}' must be >= 0, got {value}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Effective-threshold layering
// ---------------------------------------------------------------------------

/// A resolved `key -> value` threshold set for one rack.
///
/// Absence of a key means "do not evaluate that metric"; it is never
/// defaulted to zero.
pub type EffectiveThresholds = HashMap<String, f64>;

/// Layer a rack's overrides over the global threshold set.
///
/// The override value wins for every key it defines; keys present only in
/// the global set pass through; keys absent in both stay absent.
pub fn layer_thresholds(
    global: &HashMap<String, f64>,
    overrides: Option<&HashMap<String, f64>>,
) -> EffectiveThresholds {
    let mut effective = global.clone();
    if let Some(overrides) = overrides {
        for (key, value) in overrides {
            effective.insert(key.clone(), *value);
        }
    }
    effective
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
