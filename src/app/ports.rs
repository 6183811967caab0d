//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlService (domain)
//! ```
//!
//! Driven adapters (ADC sampling, climate sensor, pump, event sinks,
//! NVS) implement these traits. The
//! [`ControlService`](super::service::ControlService) consumes them via
//! generics, so the domain core never touches hardware directly.

use crate::config::IrrigationConfig;

// ───────────────────────────────────────────────────────────────
// Sampling port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// The two raw analog channels the aggregator polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleChannel {
    Moisture,
    Level,
}

/// Read-side port: one raw ADC conversion on the given channel.
///
/// Acquisition is assumed infallible — a wedged ADC is a driver-level
/// problem, not something the aggregation layer can recover from.
pub trait SamplePort {
    fn sample(&mut self, channel: SampleChannel) -> u16;
}

/// Read-side port for the air temperature / humidity sensor, queried
/// once per poll cycle.
pub trait ClimatePort {
    /// Returns `(temperature_c, humidity_pct)`.
    fn read_climate(&mut self) -> (f32, f32);
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command the pump.
/// Implementations must tolerate redundant calls (OFF while already
/// OFF is a no-op).
pub trait ActuatorPort {
    fn set_pump(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go (serial log, MQTT
/// telemetry topic, test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration persistence port (domain ↔ NVS)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the durable watering configuration.
///
/// Only [`IrrigationConfig`] crosses this boundary — runtime status is
/// ephemeral by design and must never be serialized.
pub trait ConfigPort {
    /// Load the stored configuration.
    /// Returns [`StorageError::NotFound`] on first boot; the caller
    /// substitutes compiled-in defaults.
    fn load(&self) -> Result<IrrigationConfig, StorageError>;

    /// Persist the configuration atomically (write + commit).
    fn save(&self, config: &IrrigationConfig) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist (first boot).
    NotFound,
    /// Stored blob failed deserialization or the sanity check.
    Corrupted,
    /// Encoding the record for storage failed.
    SerializeFailed,
    /// The backing store rejected the write.
    WriteFailed,
    /// The write landed but the commit did not.
    CommitFailed,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "no stored record"),
            Self::Corrupted => write!(f, "stored record corrupted"),
            Self::SerializeFailed => write!(f, "record serialization failed"),
            Self::WriteFailed => write!(f, "storage write failed"),
            Self::CommitFailed => write!(f, "storage commit failed"),
        }
    }
}
