//! Function-pointer finite state machine for the watering cycle.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  StateTable                                              │
//! │  ┌────────────┬───────────┬───────────────────────────┐  │
//! │  │ PlantState │ on_enter  │ on_update                 │  │
//! │  ├────────────┼───────────┼───────────────────────────┤  │
//! │  │ Drying     │ fn(ctx)   │ fn(ctx) -> Option<next>   │  │
//! │  │ PumpDelay  │ fn(ctx)   │ fn(ctx) -> Option<next>   │  │
//! │  │ PumpOn     │ fn(ctx)   │ fn(ctx) -> Option<next>   │  │
//! │  │ WetHold    │ fn(ctx)   │ fn(ctx) -> Option<next>   │  │
//! │  │ DryHold    │ fn(ctx)   │ fn(ctx) -> Option<next>   │  │
//! │  │ Alarm      │ fn(ctx)   │ fn(ctx) -> Option<next>   │  │
//! │  └────────────┴───────────┴───────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Each tick the engine calls `on_update` for the current state; a
//! returned `Some(next)` becomes a transition *request*. Every request
//! is validated against the per-state allow-list: a request not in the
//! list latches [`PlantState::Alarm`], which has an empty list of its
//! own and therefore can never be left. Accepted transitions (including
//! the one into Alarm) reset `state_entry_time` and run the target's
//! `on_enter`, which is where pump intents are issued.

pub mod context;
pub mod states;

use context::FsmContext;
use core::fmt;
use log::{info, warn};

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Watering-cycle states. Discriminants are the telemetry wire ordinals;
/// they also index the state table, so keep both in sync with
/// [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PlantState {
    /// Soil moist, pump off, waiting for it to dry out.
    Drying = 0,
    /// Soak pause between pump bursts of a watering cycle.
    PumpDelay = 1,
    /// Pump burst in progress.
    PumpOn = 2,
    /// Soil saturated; dwell before resuming normal monitoring.
    WetHold = 3,
    /// Soil reads dry; confirming it stays dry before watering.
    DryHold = 4,
    /// Latched fault: an illegal transition was requested.
    Alarm = 5,
}

impl PlantState {
    /// Total number of states — used to size the table array.
    pub const COUNT: usize = 6;

    /// Convert a table index back to a `PlantState`. Panics on
    /// out-of-range in debug builds; returns `Alarm` in release.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Drying,
            1 => Self::PumpDelay,
            2 => Self::PumpOn,
            3 => Self::WetHold,
            4 => Self::DryHold,
            5 => Self::Alarm,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Alarm
            }
        }
    }

    /// The transitions legal from this state. Mirrors the guard table in
    /// [`states`] by construction; `Alarm`'s empty set is what makes it
    /// a sink.
    pub fn allowed_transitions(self) -> &'static [PlantState] {
        match self {
            Self::Drying => &[Self::DryHold],
            Self::DryHold => &[Self::PumpDelay, Self::Drying],
            Self::PumpDelay => &[Self::PumpOn, Self::WetHold],
            Self::PumpOn => &[Self::PumpDelay],
            Self::WetHold => &[Self::Drying, Self::PumpDelay],
            Self::Alarm => &[],
        }
    }

    pub fn allows(self, to: PlantState) -> bool {
        self.allowed_transitions().contains(&to)
    }
}

impl fmt::Display for PlantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Drying => "DRYING",
            Self::PumpDelay => "PUMP_DELAY",
            Self::PumpOn => "PUMP_ON",
            Self::WetHold => "WET_HOLD",
            Self::DryHold => "DRY_HOLD",
            Self::Alarm => "ALARM",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` actions, run once per accepted transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Signature for the per-tick guard evaluation.
/// Returns `Some(next)` to request a transition, or `None` to stay.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<PlantState>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

/// Static descriptor for a single FSM state.
/// Stored in a fixed-size array — no heap, no `dyn`.
pub struct StateDescriptor {
    pub id: PlantState,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// The finite state machine engine. Owns the state table; all mutable
/// state lives in the [`FsmContext`] threaded through each call.
pub struct Fsm {
    /// Fixed-size table indexed by `PlantState as usize`.
    table: [StateDescriptor; PlantState::COUNT],
}

impl Fsm {
    pub fn new() -> Self {
        Self {
            table: states::build_state_table(),
        }
    }

    /// Evaluate the current state's guards once. `ctx.now_us` must be
    /// set by the caller beforehand.
    pub fn tick(&self, ctx: &mut FsmContext) {
        let current = ctx.status.state;
        if let Some(next) = (self.table[current as usize].on_update)(ctx) {
            self.change_state(next, ctx);
        }
    }

    /// Request a transition to `to`.
    ///
    /// The request is checked against the current state's allow-list; a
    /// request outside the list latches `Alarm` instead. Either way the
    /// accepted target's entry time is stamped and its `on_enter` runs,
    /// so re-latching `Alarm` also refreshes its entry time.
    pub fn change_state(&self, to: PlantState, ctx: &mut FsmContext) {
        let from = ctx.status.state;
        let target = if from.allows(to) {
            to
        } else {
            warn!("illegal transition {from} -> {to}, raising ALARM");
            PlantState::Alarm
        };

        info!("state {from} -> {target}");
        ctx.status.state = target;
        ctx.status.state_entry_time_us = ctx.now_us;

        if let Some(enter) = self.table[target as usize].on_enter {
            enter(ctx);
        }
    }

    pub fn state_name(&self, state: PlantState) -> &'static str {
        self.table[state as usize].name
    }
}

impl Default for Fsm {
    fn default() -> Self {
        Self::new()
    }
}
