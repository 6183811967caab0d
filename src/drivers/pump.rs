//! Watering pump driver (relay module).
//!
//! The relay input is **active-low**: driving GPIO18 low energizes the
//! pump, high parks it.  `hw_init` parks the line before the pin turns
//! into an output, so the pump cannot twitch across a reboot.
//!
//! ## Safety contract
//!
//! The pump must never run with the reservoir dry. Enforced by the
//! interlock at the actuation boundary; this driver is a dumb actuator.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the real GPIO via the hw_init helper.
//! On host/test: tracks state in-memory only.

use log::info;

use crate::drivers::hw_init;
use crate::pins;

pub struct PumpDriver {
    on: bool,
}

impl PumpDriver {
    pub fn new() -> Self {
        Self { on: false }
    }

    /// Command the pump. Redundant commands are absorbed here so the
    /// control loop can call this every tick.
    pub fn set(&mut self, on: bool) {
        if on == self.on {
            return;
        }
        info!("pump {}", if on { "ON" } else { "OFF" });
        // Active-low: energize by pulling the line down.
        hw_init::gpio_write(pins::PUMP_GPIO, !on);
        self.on = on;
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl Default for PumpDriver {
    fn default() -> Self {
        Self::new()
    }
}
