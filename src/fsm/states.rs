//! Concrete state handler functions and table builder.
//!
//! Each state is a pair of plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap. Guards are evaluated in the order written; the
//! first satisfied guard wins the tick.
//!
//! ```text
//!              [moisture < low]              [dwell elapsed]
//!   DRYING ───────────────────▶ DRY_HOLD ───────────────────▶ PUMP_DELAY
//!     ▲  ▲                         │                          │      │
//!     │  └──[moisture recovered]───┘          [soak elapsed]  │      │
//!     │                                            ┌──────────┘      │
//!     │                                            ▼    [saturated]  │
//!     │                                        PUMP_ON               │
//!     │                                            │                 │
//!     │                             [burst done]   │                 │
//!     │                                            ▼                 ▼
//!     └────────[hold elapsed]──────────────────── WET_HOLD ◀─────────┘
//!                                                   │
//!                              [moisture ≤ watered] └──▶ PUMP_DELAY
//!
//!   Any illegal transition request ──▶ ALARM (sink; pump parked)
//! ```
//!
//! Entering PUMP_ON is the only place a pump-ON intent is issued; every
//! other entry parks the pump. The service applies the intent through
//! the reservoir interlock afterwards.

use super::context::FsmContext;
use super::{PlantState, StateDescriptor};
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table. Row order must match the `PlantState`
/// discriminants.
pub fn build_state_table() -> [StateDescriptor; PlantState::COUNT] {
    [
        // Index 0 — DRYING
        StateDescriptor {
            id: PlantState::Drying,
            name: "DRYING",
            on_enter: Some(drying_enter),
            on_update: drying_update,
        },
        // Index 1 — PUMP_DELAY
        StateDescriptor {
            id: PlantState::PumpDelay,
            name: "PUMP_DELAY",
            on_enter: Some(pump_delay_enter),
            on_update: pump_delay_update,
        },
        // Index 2 — PUMP_ON
        StateDescriptor {
            id: PlantState::PumpOn,
            name: "PUMP_ON",
            on_enter: Some(pump_on_enter),
            on_update: pump_on_update,
        },
        // Index 3 — WET_HOLD
        StateDescriptor {
            id: PlantState::WetHold,
            name: "WET_HOLD",
            on_enter: Some(wet_hold_enter),
            on_update: wet_hold_update,
        },
        // Index 4 — DRY_HOLD
        StateDescriptor {
            id: PlantState::DryHold,
            name: "DRY_HOLD",
            on_enter: Some(dry_hold_enter),
            on_update: dry_hold_update,
        },
        // Index 5 — ALARM
        StateDescriptor {
            id: PlantState::Alarm,
            name: "ALARM",
            on_enter: Some(alarm_enter),
            on_update: alarm_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  DRYING — soil moist enough, monitoring only
// ═══════════════════════════════════════════════════════════════════════════

fn drying_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_on = false;
    info!("DRYING: monitoring, moisture={}", ctx.moisture());
}

fn drying_update(ctx: &mut FsmContext) -> Option<PlantState> {
    if ctx.moisture() < ctx.config.low_moisture {
        return Some(PlantState::DryHold);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  DRY_HOLD — confirming the dry reading before committing to watering
// ═══════════════════════════════════════════════════════════════════════════

fn dry_hold_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_on = false;
    info!(
        "DRY_HOLD: moisture={} below {}, confirming for {}s",
        ctx.moisture(),
        ctx.config.low_moisture,
        ctx.config.dry_hold_period_s
    );
}

fn dry_hold_update(ctx: &mut FsmContext) -> Option<PlantState> {
    // Recovery beats the dwell timer: a transient dip must not water.
    if ctx.moisture() > ctx.config.low_moisture {
        return Some(PlantState::Drying);
    }
    if ctx.state_older_than(ctx.config.dry_hold_period_s) {
        return Some(PlantState::PumpDelay);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  PUMP_DELAY — soak pause between bursts, watching for saturation
// ═══════════════════════════════════════════════════════════════════════════

fn pump_delay_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_on = false;
    info!("PUMP_DELAY: soaking for {}s", ctx.config.pump_off_period_s);
}

fn pump_delay_update(ctx: &mut FsmContext) -> Option<PlantState> {
    if ctx.moisture() >= ctx.config.high_moisture {
        return Some(PlantState::WetHold);
    }
    if ctx.state_older_than(ctx.config.pump_off_period_s) {
        return Some(PlantState::PumpOn);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  PUMP_ON — fixed-length pump burst
// ═══════════════════════════════════════════════════════════════════════════

fn pump_on_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_on = true;
    info!("PUMP_ON: burst for {}s", ctx.config.pump_on_period_s);
}

fn pump_on_update(ctx: &mut FsmContext) -> Option<PlantState> {
    if ctx.state_older_than(ctx.config.pump_on_period_s) {
        return Some(PlantState::PumpDelay);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  WET_HOLD — saturated; wait for the water to spread before monitoring
// ═══════════════════════════════════════════════════════════════════════════

fn wet_hold_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_on = false;
    info!(
        "WET_HOLD: moisture={} at saturation, holding {}s",
        ctx.moisture(),
        ctx.config.wet_hold_period_s
    );
}

fn wet_hold_update(ctx: &mut FsmContext) -> Option<PlantState> {
    // Moisture falling back under "watered" means the soak was shallow;
    // resume the watering cycle rather than calling it done.
    if ctx.moisture() <= ctx.config.watered_moisture {
        return Some(PlantState::PumpDelay);
    }
    if ctx.state_older_than(ctx.config.wet_hold_period_s) {
        return Some(PlantState::Drying);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  ALARM — latched fault, no way out
// ═══════════════════════════════════════════════════════════════════════════

fn alarm_enter(ctx: &mut FsmContext) {
    ctx.commands.pump_on = false;
    warn!("ALARM: controller latched, pump parked; power-cycle to clear");
}

fn alarm_update(_ctx: &mut FsmContext) -> Option<PlantState> {
    // Sink state: no guards, no exit.
    None
}
