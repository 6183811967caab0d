//! Control service — the hexagonal core.
//!
//! [`ControlService`] owns the watering FSM and its context.  Each call
//! to [`tick`](ControlService::tick) runs one control cycle; all I/O
//! flows through port traits injected at the call site, making the
//! entire service testable with mock adapters.
//!
//! ```text
//!  SamplePort ──▶ ┌────────────────────────┐ ──▶ EventSink
//! ClimatePort ──▶ │     ControlService     │
//! ActuatorPort ◀──│  poll · FSM · interlock│
//!                 └────────────────────────┘
//! ```

use std::sync::Arc;

use log::{debug, info};

use crate::fsm::context::{ActuatorCommands, FsmContext, IrrigationStatus, SEC_IN_MICROS};
use crate::fsm::{Fsm, PlantState};
use crate::safety;
use crate::sensors;
use crate::store::ConfigStore;

use super::events::{AppEvent, TelemetrySnapshot};
use super::ports::{ActuatorPort, ClimatePort, EventSink, SamplePort};

// ───────────────────────────────────────────────────────────────
// ControlService
// ───────────────────────────────────────────────────────────────

/// Orchestrates one poll/decide/actuate cycle per tick.
pub struct ControlService {
    fsm: Fsm,
    ctx: FsmContext,
    store: Arc<ConfigStore>,
    /// Free-heap probe for telemetry; injected so host tests can pin it.
    heap_probe: fn() -> u32,
    /// Rising-edge tracker so suppression is reported once per episode.
    suppressing: bool,
}

impl ControlService {
    pub fn new(store: Arc<ConfigStore>, heap_probe: fn() -> u32) -> Self {
        let ctx = FsmContext::new(store.snapshot());
        Self {
            fsm: Fsm::new(),
            ctx,
            store,
            heap_probe,
            suppressing: false,
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: refresh config → poll (if due) → FSM →
    /// interlocked pump drive.
    ///
    /// `now_us` is the monotonic uptime; the caller ticks at roughly
    /// 100 ms but nothing here depends on the exact cadence.  The `io`
    /// parameter satisfies all three hardware-facing ports, avoiding a
    /// double mutable borrow while keeping the boundary explicit.
    pub fn tick(
        &mut self,
        now_us: u64,
        io: &mut (impl SamplePort + ClimatePort + ActuatorPort),
        sink: &mut impl EventSink,
    ) {
        self.ctx.now_us = now_us;
        // Per-tick snapshot: a config update landing mid-cycle is
        // picked up on the next tick, never halfway through this one.
        self.ctx.config = self.store.snapshot();

        if !self.ctx.status.initialized {
            self.initialize(now_us, io, sink);
        } else if self.ctx.status.state != PlantState::Alarm && self.poll_due(now_us) {
            // ALARM freezes the poll cadence along with the machine.
            self.poll_cycle(now_us, io, sink);
        }

        let before = self.ctx.status.state;
        self.fsm.tick(&mut self.ctx);
        let after = self.ctx.status.state;
        if after != before {
            sink.emit(&AppEvent::StateChanged {
                from: before,
                to: after,
            });
        }

        self.drive_pump(io, sink);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> PlantState {
        self.ctx.status.state
    }

    pub fn status(&self) -> &IrrigationStatus {
        &self.ctx.status
    }

    // ── Internal ──────────────────────────────────────────────

    /// First tick after power-up: take an unconditional baseline poll
    /// and start the machine in `DRYING` with the pump parked.
    fn initialize(
        &mut self,
        now_us: u64,
        io: &mut (impl SamplePort + ClimatePort),
        sink: &mut impl EventSink,
    ) {
        let reading = sensors::poll(io, now_us);
        self.ctx.status.last_reading = reading;
        self.ctx.status.last_poll_time_us = now_us;
        self.ctx.status.state = PlantState::Drying;
        self.ctx.status.state_entry_time_us = now_us;
        self.ctx.status.initialized = true;
        self.ctx.commands = ActuatorCommands::all_off();

        info!(
            "controller started in {} (moisture={}, level={})",
            PlantState::Drying,
            reading.moisture_median,
            reading.level_median
        );
        sink.emit(&AppEvent::Started(PlantState::Drying));
        self.emit_telemetry(sink);
    }

    fn poll_due(&self, now_us: u64) -> bool {
        let elapsed = now_us.saturating_sub(self.ctx.status.last_poll_time_us);
        elapsed > u64::from(self.ctx.config.polling_period_s) * SEC_IN_MICROS
    }

    fn poll_cycle(
        &mut self,
        now_us: u64,
        io: &mut (impl SamplePort + ClimatePort),
        sink: &mut impl EventSink,
    ) {
        let reading = sensors::poll(io, now_us);
        debug!(
            "poll: moisture={} level={} temp={:.1} hum={:.1}",
            reading.moisture_median,
            reading.level_median,
            reading.temperature_c,
            reading.humidity_pct
        );
        self.ctx.status.last_reading = reading;
        self.ctx.status.last_poll_time_us = now_us;
        self.emit_telemetry(sink);
    }

    fn emit_telemetry(&self, sink: &mut impl EventSink) {
        let snapshot = TelemetrySnapshot::new(
            &self.ctx.status.last_reading,
            self.ctx.status.state,
            (self.heap_probe)(),
        );
        sink.emit(&AppEvent::Telemetry(snapshot));
    }

    /// Translate the FSM's pump command into a port call, vetoed by the
    /// safety interlock.  Suppression is reported on its rising edge
    /// only, re-armed once the veto clears.
    fn drive_pump(&mut self, io: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        let wanted = self.ctx.commands.pump_on;
        let level = self.ctx.status.last_reading.level_median;

        if wanted && !safety::pump_permitted(level) {
            io.set_pump(false);
            if !self.suppressing {
                self.suppressing = true;
                sink.emit(&AppEvent::PumpSuppressed {
                    level_median: level,
                    enabled: safety::pump_enabled(),
                });
            }
        } else {
            self.suppressing = false;
            io.set_pump(wanted);
        }
    }
}
