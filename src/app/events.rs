//! Outbound application events.
//!
//! The [`ControlService`](super::service::ControlService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them — log to serial, publish
//! on the telemetry topic, record in a test harness.

use serde::Serialize;

use crate::config::ratio_from_raw;
use crate::fsm::PlantState;
use crate::fsm::context::SensorReading;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, Copy)]
pub enum AppEvent {
    /// Periodic telemetry snapshot, one per completed poll cycle.
    Telemetry(TelemetrySnapshot),

    /// The watering state machine transitioned between states.
    StateChanged { from: PlantState, to: PlantState },

    /// The machine commanded the pump but the interlock vetoed it.
    PumpSuppressed { level_median: u16, enabled: bool },

    /// The control service has started (carries initial state).
    Started(PlantState),
}

/// A point-in-time telemetry snapshot suitable for logging or
/// transmission.
///
/// Field names are the wire format of the telemetry topic; dashboards
/// key on them.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TelemetrySnapshot {
    /// Moisture as a percentage of the dry→wet calibration span.
    #[serde(rename = "test")]
    pub moisture_pct: f32,
    pub temperature: f32,
    pub humidity: f32,
    /// Median raw water level reading, unconverted.
    pub water_available: u16,
    /// State ordinal, stable across releases.
    pub state: u8,
    pub sum_heap_free: u32,
}

impl TelemetrySnapshot {
    pub fn new(reading: &SensorReading, state: PlantState, heap_free: u32) -> Self {
        Self {
            moisture_pct: ratio_from_raw(reading.moisture_median) * 100.0,
            temperature: reading.temperature_c,
            humidity: reading.humidity_pct,
            water_available: reading.level_median,
            state: state as u8,
            sum_heap_free: heap_free,
        }
    }

    /// Wire JSON for the telemetry topic.
    pub fn to_json(&self) -> String {
        // A flat struct of finite numbers cannot fail to serialize.
        serde_json::to_string(self).unwrap_or_default()
    }
}
