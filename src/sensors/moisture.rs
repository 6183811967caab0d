//! Capacitive soil moisture probe.
//!
//! The probe sits in the pot and is read through ADC1 channel 4
//! (GPIO32) as a raw 12-bit count.  Counts *increase* with moisture;
//! the calibration anchors live in [`crate::config`]
//! ([`MOISTURE_DRY_COUNTS`](crate::config::MOISTURE_DRY_COUNTS) /
//! [`MOISTURE_WET_COUNTS`](crate::config::MOISTURE_WET_COUNTS)).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: one-shot ADC conversions via hw_init helpers.
//! On host/test: reads a sim atomic, settable from test code.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

/// Host-side stand-in, defaults to a damp-but-not-watered reading.
#[cfg(not(target_os = "espidf"))]
static SIM_MOISTURE_RAW: AtomicU16 = AtomicU16::new(2400);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_moisture_raw(raw: u16) {
    SIM_MOISTURE_RAW.store(raw, Ordering::Relaxed);
}

pub struct MoistureProbe {
    last_raw: u16,
}

impl MoistureProbe {
    pub fn new() -> Self {
        Self { last_raw: 0 }
    }

    /// One raw conversion.  Callers aggregate several of these through
    /// a median filter; a single read is too noisy to act on.
    pub fn read_raw(&mut self) -> u16 {
        self.last_raw = self.sample_once();
        self.last_raw
    }

    pub fn last_raw(&self) -> u16 {
        self.last_raw
    }

    #[cfg(target_os = "espidf")]
    fn sample_once(&self) -> u16 {
        hw_init::adc1_read(pins::MOISTURE_ADC_CHANNEL)
    }

    #[cfg(not(target_os = "espidf"))]
    fn sample_once(&self) -> u16 {
        SIM_MOISTURE_RAW.load(Ordering::Relaxed)
    }
}

impl Default for MoistureProbe {
    fn default() -> Self {
        Self::new()
    }
}
