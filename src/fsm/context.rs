//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: the latest aggregated sensor reading, the runtime status
//! record, the pump command output, a snapshot of the watering
//! configuration, and the tick's timestamp.

use crate::config::IrrigationConfig;
use crate::fsm::PlantState;

/// One microsecond-per-second, for period comparisons against the
/// configured second-resolution periods.
pub const SEC_IN_MICROS: u64 = 1_000_000;

// ---------------------------------------------------------------------------
// Aggregated sensor reading (written by the sensor hub once per poll)
// ---------------------------------------------------------------------------

/// One consolidated sensor snapshot, produced per poll cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SensorReading {
    /// Median of 9 raw moisture samples (ADC counts).
    pub moisture_median: u16,
    /// Median of 9 raw reservoir-level samples (ADC counts).
    pub level_median: u16,
    /// Air temperature from the climate sensor (°C).
    pub temperature_c: f32,
    /// Relative humidity from the climate sensor (%).
    pub humidity_pct: f32,
    /// Monotonic timestamp of the poll (µs).
    pub sampled_at_us: u64,
}

// ---------------------------------------------------------------------------
// Actuator commands (written by state handlers; applied by the service)
// ---------------------------------------------------------------------------

/// Pump intent written by state entry actions. The control service
/// applies it to the driver after each tick, subject to the safety
/// interlock.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActuatorCommands {
    pub pump_on: bool,
}

impl ActuatorCommands {
    /// Pump off — safe default.
    pub fn all_off() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Runtime status
// ---------------------------------------------------------------------------

/// Ephemeral controller status. Never serialized: a reboot always starts
/// from these defaults and re-runs initialization, whatever NVS holds.
#[derive(Debug, Clone, Copy)]
pub struct IrrigationStatus {
    pub state: PlantState,
    /// Timestamp of the last accepted transition (µs).
    pub state_entry_time_us: u64,
    /// Timestamp of the last completed sensor poll (µs).
    pub last_poll_time_us: u64,
    /// Most recent aggregate reading; guards evaluate against this.
    pub last_reading: SensorReading,
    /// False until the first tick has polled and parked the pump.
    pub initialized: bool,
}

impl Default for IrrigationStatus {
    fn default() -> Self {
        Self {
            state: PlantState::Drying,
            state_entry_time_us: 0,
            last_poll_time_us: 0,
            last_reading: SensorReading::default(),
            initialized: false,
        }
    }
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    /// Timestamp of the current tick (µs). Set by the service before
    /// each guard evaluation.
    pub now_us: u64,
    /// Runtime status, mutated exclusively through the FSM.
    pub status: IrrigationStatus,
    /// Pump intent for this tick.
    pub commands: ActuatorCommands,
    /// Configuration snapshot taken at the top of the tick, so one tick
    /// never sees a half-applied remote update.
    pub config: IrrigationConfig,
}

impl FsmContext {
    pub fn new(config: IrrigationConfig) -> Self {
        Self {
            now_us: 0,
            status: IrrigationStatus::default(),
            commands: ActuatorCommands::all_off(),
            config,
        }
    }

    /// Microseconds spent in the current state.
    pub fn elapsed_in_state_us(&self) -> u64 {
        self.now_us.saturating_sub(self.status.state_entry_time_us)
    }

    /// True once the current state has outlasted `period_s` seconds.
    pub fn state_older_than(&self, period_s: u16) -> bool {
        self.elapsed_in_state_us() > u64::from(period_s) * SEC_IN_MICROS
    }

    /// Latest moisture median, raw ADC counts.
    pub fn moisture(&self) -> u16 {
        self.status.last_reading.moisture_median
    }
}
