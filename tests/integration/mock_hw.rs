//! Mock hardware and storage for integration tests.
//!
//! `BenchRig` plays the soil, the reservoir and the pump relay at once;
//! tests steer it by assigning the public fields between ticks.

use std::cell::{Cell, RefCell};

use plantwater::app::events::{AppEvent, TelemetrySnapshot};
use plantwater::app::ports::{
    ActuatorPort, ClimatePort, ConfigPort, EventSink, SampleChannel, SamplePort, StorageError,
};
use plantwater::config::IrrigationConfig;
use plantwater::fsm::PlantState;

// ── BenchRig ──────────────────────────────────────────────────

pub struct BenchRig {
    pub moisture: u16,
    pub level: u16,
    pub temperature_c: f32,
    pub humidity_pct: f32,
    /// Last commanded pump state.
    pub pump: bool,
    /// Every `set_pump` call in order.
    pub pump_history: Vec<bool>,
    pub samples_taken: usize,
}

#[allow(dead_code)]
impl BenchRig {
    /// Moist soil, full reservoir, mild room.
    pub fn new() -> Self {
        Self {
            moisture: 2400,
            level: 3000,
            temperature_c: 21.5,
            humidity_pct: 48.0,
            pump: false,
            pump_history: Vec::new(),
            samples_taken: 0,
        }
    }

    pub fn pump_ever_ran(&self) -> bool {
        self.pump_history.iter().any(|&on| on)
    }
}

impl Default for BenchRig {
    fn default() -> Self {
        Self::new()
    }
}

impl SamplePort for BenchRig {
    fn sample(&mut self, channel: SampleChannel) -> u16 {
        self.samples_taken += 1;
        match channel {
            SampleChannel::Moisture => self.moisture,
            SampleChannel::Level => self.level,
        }
    }
}

impl ClimatePort for BenchRig {
    fn read_climate(&mut self) -> (f32, f32) {
        (self.temperature_c, self.humidity_pct)
    }
}

impl ActuatorPort for BenchRig {
    fn set_pump(&mut self, on: bool) {
        self.pump = on;
        self.pump_history.push(on);
    }
}

// ── MemoryConfig ──────────────────────────────────────────────

/// In-memory stand-in for the NVS config record.
pub struct MemoryConfig {
    record: RefCell<Option<IrrigationConfig>>,
    pub fail_load: Cell<bool>,
    pub fail_save: Cell<bool>,
    pub saves: Cell<usize>,
}

#[allow(dead_code)]
impl MemoryConfig {
    pub fn empty() -> Self {
        Self {
            record: RefCell::new(None),
            fail_load: Cell::new(false),
            fail_save: Cell::new(false),
            saves: Cell::new(0),
        }
    }

    pub fn seeded(config: IrrigationConfig) -> Self {
        let port = Self::empty();
        port.record.replace(Some(config));
        port
    }

    pub fn stored(&self) -> Option<IrrigationConfig> {
        *self.record.borrow()
    }
}

impl ConfigPort for MemoryConfig {
    fn load(&self) -> Result<IrrigationConfig, StorageError> {
        if self.fail_load.get() {
            return Err(StorageError::Corrupted);
        }
        self.record.borrow().ok_or(StorageError::NotFound)
    }

    fn save(&self, config: &IrrigationConfig) -> Result<(), StorageError> {
        if self.fail_save.get() {
            return Err(StorageError::WriteFailed);
        }
        self.record.replace(Some(*config));
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

// ── EventLog ──────────────────────────────────────────────────

#[derive(Default)]
pub struct EventLog {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn telemetry_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::Telemetry(_)))
            .count()
    }

    pub fn last_telemetry(&self) -> Option<TelemetrySnapshot> {
        self.events.iter().rev().find_map(|e| match e {
            AppEvent::Telemetry(t) => Some(*t),
            _ => None,
        })
    }

    pub fn transitions(&self) -> Vec<(PlantState, PlantState)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::StateChanged { from, to } => Some((*from, *to)),
                _ => None,
            })
            .collect()
    }

    pub fn suppressions(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, AppEvent::PumpSuppressed { .. }))
            .count()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(*event);
    }
}
