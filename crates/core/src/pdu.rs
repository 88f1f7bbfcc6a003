//! PDU reading types produced by the upstream fetcher.

use serde::Serialize;

use crate::error::CoreError;

/// Electrical topology of a PDU.
///
/// Amperage thresholds are split by phase, so the classifier needs to know
/// which set applies. `Unknown` suppresses amperage evaluation entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    SinglePhase,
    ThreePhase,
    Unknown,
}

impl Phase {
    /// Return the database / API string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SinglePhase => "single_phase",
            Self::ThreePhase => "3_phase",
            Self::Unknown => "unknown",
        }
    }

    /// Map the upstream `phase` field to a [`Phase`].
    ///
    /// The upstream sends free-form labels; anything unrecognised maps to
    /// `Unknown`, which keeps amperage out of evaluation for that PDU.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "single" | "single-phase" | "single_phase" => Self::SinglePhase,
            "3" | "three" | "3-phase" | "3_phase" | "three-phase" | "three_phase" => {
                Self::ThreePhase
            }
            _ => Self::Unknown,
        }
    }

    /// Parse from the stored string representation, rejecting unknown input.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "single_phase" => Ok(Self::SinglePhase),
            "3_phase" => Ok(Self::ThreePhase),
            "unknown" => Ok(Self::Unknown),
            other => Err(CoreError::Validation(format!("Unknown phase: '{other}'"))),
        }
    }
}

/// One PDU's instantaneous state, joined from the upstream device and power
/// endpoints. Produced fresh every cycle and discarded after use.
///
/// Measurement fields are `None` when the upstream did not report a usable
/// number ("unreadable"), never zero.
#[derive(Debug, Clone, Serialize)]
pub struct PduReading {
    pub pdu_id: String,
    pub rack_id: String,
    pub name: String,
    pub country: String,
    pub site: String,
    pub dc: String,
    pub phase: Phase,
    pub chain: String,
    pub node: String,
    pub serial: String,
    pub gw_name: String,
    pub gw_ip: String,
    /// Total current draw in amps.
    pub current: Option<f64>,
    /// Line voltage in volts.
    pub voltage: Option<f64>,
    /// Derived power in watts.
    pub power: Option<f64>,
    /// PDU-reported ambient temperature in Celsius (informational).
    pub temperature: Option<f64>,
    /// External sensor temperature in Celsius (used for classification).
    pub sensor_temperature: Option<f64>,
    /// External sensor relative humidity in percent.
    pub sensor_humidity: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_parse_single() {
        assert_eq!(Phase::parse("1"), Phase::SinglePhase);
        assert_eq!(Phase::parse("Single"), Phase::SinglePhase);
        assert_eq!(Phase::parse("single-phase"), Phase::SinglePhase);
    }

    #[test]
    fn phase_parse_three() {
        assert_eq!(Phase::parse("3"), Phase::ThreePhase);
        assert_eq!(Phase::parse("three"), Phase::ThreePhase);
        assert_eq!(Phase::parse("3_phase"), Phase::ThreePhase);
    }

    #[test]
    fn phase_parse_unrecognised_is_unknown() {
        assert_eq!(Phase::parse(""), Phase::Unknown);
        assert_eq!(Phase::parse("2"), Phase::Unknown);
        assert_eq!(Phase::parse("dual"), Phase::Unknown);
    }

    #[test]
    fn phase_round_trips_through_as_str() {
        for phase in [Phase::SinglePhase, Phase::ThreePhase, Phase::Unknown] {
            assert_eq!(Phase::from_str(phase.as_str()).unwrap(), phase);
        }
    }

    #[test]
    fn phase_from_str_rejects_unknown_input() {
        assert!(Phase::from_str("two_phase").is_err());
    }
}
