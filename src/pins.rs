//! GPIO / peripheral pin assignments for the plant-watering board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.
//!
//! Target is a plain ESP32 module; GPIO numbers below follow its ADC1
//! channel-to-pin mapping.

// ---------------------------------------------------------------------------
// Sensors — Analog (ADC1)
// ---------------------------------------------------------------------------

/// Capacitive soil-moisture probe — analog voltage.
/// ADC1 channel 4 (GPIO 32 on ESP32).
pub const MOISTURE_ADC_CHANNEL: u32 = 4;
pub const MOISTURE_ADC_GPIO: i32 = 32;

/// Reservoir water-level probe — analog voltage.
/// ADC1 channel 5 (GPIO 33 on ESP32).
pub const LEVEL_ADC_CHANNEL: u32 = 5;
pub const LEVEL_ADC_GPIO: i32 = 33;

// ---------------------------------------------------------------------------
// Sensors — Digital
// ---------------------------------------------------------------------------

/// DHT11 temperature/humidity sensor — single-wire data line with
/// external pull-up.
pub const DHT_GPIO: i32 = 19;

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Pump relay driver.  Active LOW: driving the pin low energises the
/// relay and runs the pump.
pub const PUMP_GPIO: i32 = 18;
