//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! The MQTT adapter implements the same trait for the telemetry topic.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogEventSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | moisture={:.1}% | T={:.1}\u{00b0}C RH={:.1}% | level={} | state={} | heap={}",
                    t.moisture_pct,
                    t.temperature,
                    t.humidity,
                    t.water_available,
                    t.state,
                    t.sum_heap_free,
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {from} -> {to}");
            }
            AppEvent::PumpSuppressed {
                level_median,
                enabled,
            } => {
                warn!(
                    "PUMP | suppressed (level={level_median}, enabled={enabled}); refill the reservoir"
                );
            }
            AppEvent::Started(state) => {
                info!("START | initial_state={state}");
            }
        }
    }
}
