//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the analog probes, the climate sensor, and the pump driver,
//! exposing them through [`SamplePort`], [`ClimatePort`] and
//! [`ActuatorPort`].  This is the only module in the system that
//! touches actual hardware.  On non-espidf targets, the underlying
//! drivers use cfg-gated simulation stubs.

use crate::app::ports::{ActuatorPort, ClimatePort, SampleChannel, SamplePort};
use crate::drivers::dht::DhtSensor;
use crate::drivers::pump::PumpDriver;
use crate::sensors::moisture::MoistureProbe;
use crate::sensors::water_level::LevelProbe;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    moisture: MoistureProbe,
    level: LevelProbe,
    dht: DhtSensor,
    pump: PumpDriver,
}

impl HardwareAdapter {
    pub fn new() -> Self {
        Self {
            moisture: MoistureProbe::new(),
            level: LevelProbe::new(),
            dht: DhtSensor::new(),
            pump: PumpDriver::new(),
        }
    }

    pub fn pump_is_on(&self) -> bool {
        self.pump.is_on()
    }
}

impl Default for HardwareAdapter {
    fn default() -> Self {
        Self::new()
    }
}

// ── SamplePort implementation ─────────────────────────────────

impl SamplePort for HardwareAdapter {
    fn sample(&mut self, channel: SampleChannel) -> u16 {
        match channel {
            SampleChannel::Moisture => self.moisture.read_raw(),
            SampleChannel::Level => self.level.read_raw(),
        }
    }
}

// ── ClimatePort implementation ────────────────────────────────

impl ClimatePort for HardwareAdapter {
    fn read_climate(&mut self) -> (f32, f32) {
        self.dht.read()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl ActuatorPort for HardwareAdapter {
    fn set_pump(&mut self, on: bool) {
        self.pump.set(on);
    }
}
