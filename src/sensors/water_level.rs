//! Reservoir water level probe.
//!
//! An analog eTape-style strip in the reservoir, read through ADC1
//! channel 5 (GPIO33) as a raw 12-bit count.  The safety interlock
//! treats counts at or below
//! [`MIN_LEVEL_COUNTS`](crate::safety::MIN_LEVEL_COUNTS) as a dry
//! reservoir.
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

/// Host-side stand-in, defaults to a well-filled reservoir.
#[cfg(not(target_os = "espidf"))]
static SIM_LEVEL_RAW: AtomicU16 = AtomicU16::new(3000);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_level_raw(raw: u16) {
    SIM_LEVEL_RAW.store(raw, Ordering::Relaxed);
}

pub struct LevelProbe {
    last_raw: u16,
}

impl LevelProbe {
    pub fn new() -> Self {
        Self { last_raw: 0 }
    }

    /// One raw conversion.  Callers aggregate several of these through
    /// a median filter before the interlock looks at the value.
    pub fn read_raw(&mut self) -> u16 {
        self.last_raw = self.sample_once();
        self.last_raw
    }

    pub fn last_raw(&self) -> u16 {
        self.last_raw
    }

    #[cfg(target_os = "espidf")]
    fn sample_once(&self) -> u16 {
        hw_init::adc1_read(pins::LEVEL_ADC_CHANNEL)
    }

    #[cfg(not(target_os = "espidf"))]
    fn sample_once(&self) -> u16 {
        SIM_LEVEL_RAW.load(Ordering::Relaxed)
    }
}

impl Default for LevelProbe {
    fn default() -> Self {
        Self::new()
    }
}
