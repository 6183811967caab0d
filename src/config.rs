//! Watering algorithm configuration.
//!
//! All tunable parameters for the irrigation controller. Values can be
//! overridden remotely (MQTT config message) and persist across power
//! cycles via NVS; see the configuration store for the locking and
//! persistence contract.
//!
//! Moisture thresholds are kept in raw ADC counts internally. The remote
//! protocol speaks normalized ratios instead, converted through the
//! calibration constants below.

use serde::{Deserialize, Serialize};

use core::fmt;

/// ADC counts read with the moisture probe dry, in air.
pub const MOISTURE_DRY_COUNTS: u16 = 720;
/// ADC counts read with the probe submerged in a glass of water.
pub const MOISTURE_WET_COUNTS: u16 = 2616;

/// Raw ADC counts → normalized moisture ratio (0.0 = dry calibration
/// point, 1.0 = wet). Readings outside the calibrated span map outside
/// [0, 1].
pub fn ratio_from_raw(raw: u16) -> f32 {
    (f32::from(raw) - f32::from(MOISTURE_DRY_COUNTS))
        / f32::from(MOISTURE_WET_COUNTS - MOISTURE_DRY_COUNTS)
}

/// Normalized moisture ratio → raw ADC counts (truncating, like the
/// calibration macro this mirrors).
pub fn raw_from_ratio(ratio: f32) -> u16 {
    (ratio * f32::from(MOISTURE_WET_COUNTS - MOISTURE_DRY_COUNTS)
        + f32::from(MOISTURE_DRY_COUNTS)) as u16
}

/// Why a candidate configuration failed the sanity check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigInvariant {
    /// `low_moisture < watered_moisture <= high_moisture` violated.
    ThresholdOrder,
    /// A period field is zero, or a remote update carried a period that
    /// does not fit the stored 16-bit seconds field.
    PeriodRange,
}

impl fmt::Display for ConfigInvariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThresholdOrder => {
                write!(f, "thresholds must satisfy low < watered <= high")
            }
            Self::PeriodRange => write!(f, "periods must be within 1..=65535 seconds"),
        }
    }
}

/// Durable irrigation parameters.
///
/// This is the only record that is ever serialized to NVS; runtime
/// status lives in [`crate::fsm::context::IrrigationStatus`] and always
/// starts fresh after a reboot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrrigationConfig {
    // --- Moisture thresholds (raw ADC counts) ---
    /// Below this the soil counts as dry (DRYING → DRY_HOLD).
    pub low_moisture: u16,
    /// Watering cycles continue until the soil rises back above this.
    pub watered_moisture: u16,
    /// At or above this the soil is saturated (PUMP_DELAY → WET_HOLD).
    pub high_moisture: u16,

    // --- Timing (seconds) ---
    /// Interval between sensor polls.
    pub polling_period_s: u16,
    /// Pump burst length within a watering cycle.
    pub pump_on_period_s: u16,
    /// Soak time between pump bursts.
    pub pump_off_period_s: u16,
    /// Dwell after saturation before returning to DRYING.
    pub wet_hold_period_s: u16,
    /// Dry confirmation dwell before watering starts.
    pub dry_hold_period_s: u16,
}

impl Default for IrrigationConfig {
    fn default() -> Self {
        Self {
            low_moisture: raw_from_ratio(0.80),
            watered_moisture: raw_from_ratio(0.92),
            high_moisture: raw_from_ratio(0.93),
            polling_period_s: 10,
            pump_on_period_s: 1,
            pump_off_period_s: 59,
            wet_hold_period_s: 30 * 60,
            dry_hold_period_s: 5 * 60,
        }
    }
}

impl IrrigationConfig {
    /// Sanity check shared by the remote protocol and the NVS load path.
    pub fn validate(&self) -> Result<(), ConfigInvariant> {
        if !(self.low_moisture < self.watered_moisture
            && self.watered_moisture <= self.high_moisture)
        {
            return Err(ConfigInvariant::ThresholdOrder);
        }
        if self.polling_period_s == 0
            || self.pump_on_period_s == 0
            || self.pump_off_period_s == 0
            || self.wet_hold_period_s == 0
            || self.dry_hold_period_s == 0
        {
            return Err(ConfigInvariant::PeriodRange);
        }
        Ok(())
    }
}
