//! Sensor subsystem — analog probes and the aggregating poll cycle.
//!
//! A poll burst-reads each analog channel [`SAMPLES_PER_POLL`] times
//! and takes the median, so a single electrical spike cannot move the
//! value the state machine acts on.  The climate sensor is read once
//! per poll; it does its own retention on failed reads.

pub mod moisture;
pub mod water_level;

use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use crate::app::ports::{ClimatePort, SampleChannel, SamplePort};
use crate::fsm::context::SensorReading;
use crate::median::median9;

/// Raw conversions per channel per poll.  Sized for the 9-point median
/// network.
pub const SAMPLES_PER_POLL: usize = 9;

// ───────────────────────────────────────────────────────────────
// Bench override
// ───────────────────────────────────────────────────────────────

// Maintenance hook: when enabled, poll() reports these values instead
// of touching the ADC, so the controller can be walked through its
// states without a plant attached.
static OVERRIDE_ENABLED: AtomicBool = AtomicBool::new(false);
static OVERRIDE_MOISTURE: AtomicU16 = AtomicU16::new(0);
static OVERRIDE_LEVEL: AtomicU16 = AtomicU16::new(0);

/// Replace probe readings with fixed values until [`clear_override`].
pub fn override_readings(moisture_raw: u16, level_raw: u16) {
    OVERRIDE_MOISTURE.store(moisture_raw, Ordering::Relaxed);
    OVERRIDE_LEVEL.store(level_raw, Ordering::Relaxed);
    OVERRIDE_ENABLED.store(true, Ordering::Relaxed);
}

/// Return to live probe readings.
pub fn clear_override() {
    OVERRIDE_ENABLED.store(false, Ordering::Relaxed);
}

// ───────────────────────────────────────────────────────────────
// Poll cycle
// ───────────────────────────────────────────────────────────────

/// Run one full poll cycle and return the aggregated reading.
///
/// `now_us` stamps the reading; the caller decides when a poll is due.
pub fn poll(io: &mut (impl SamplePort + ClimatePort), now_us: u64) -> SensorReading {
    let (moisture_median, level_median) = if OVERRIDE_ENABLED.load(Ordering::Relaxed) {
        (
            OVERRIDE_MOISTURE.load(Ordering::Relaxed),
            OVERRIDE_LEVEL.load(Ordering::Relaxed),
        )
    } else {
        (
            median_of_burst(io, SampleChannel::Moisture),
            median_of_burst(io, SampleChannel::Level),
        )
    };

    let (temperature_c, humidity_pct) = io.read_climate();

    SensorReading {
        moisture_median,
        level_median,
        temperature_c,
        humidity_pct,
        sampled_at_us: now_us,
    }
}

fn median_of_burst(io: &mut impl SamplePort, channel: SampleChannel) -> u16 {
    let mut window = [0i32; SAMPLES_PER_POLL];
    for slot in &mut window {
        *slot = i32::from(io.sample(channel));
    }
    // The median of u16 inputs is one of them; the cast cannot truncate.
    median9(&mut window) as u16
}
