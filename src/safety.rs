//! Pump safety interlock.
//!
//! The interlock runs at the **actuation boundary**, after the state
//! machine has produced its command for the tick.  State logic stays
//! oblivious to water availability; whatever the machine asks for, the
//! pump only energizes when the reservoir reading clears the dry
//! threshold and the maintenance switch is on.
//!
//! Suppression does not disturb the state machine.  `PUMP_ON` keeps
//! timing out into `PUMP_DELAY` as usual; the plant just receives no
//! water until the reservoir is refilled.

use std::sync::atomic::{AtomicBool, Ordering};

/// Raw level counts at or below which the reservoir is treated as dry.
pub const MIN_LEVEL_COUNTS: u16 = 2048;

/// Maintenance kill switch.  Defaults to enabled; clearing it parks the
/// pump regardless of state machine demand.
static PUMP_ENABLED: AtomicBool = AtomicBool::new(true);

pub fn set_pump_enabled(on: bool) {
    PUMP_ENABLED.store(on, Ordering::Relaxed);
}

pub fn pump_enabled() -> bool {
    PUMP_ENABLED.load(Ordering::Relaxed)
}

/// Whether the pump may energize given the latest median level reading.
///
/// The level comparison is strict: a reading of exactly
/// [`MIN_LEVEL_COUNTS`] still counts as dry.
pub fn pump_permitted(level_median: u16) -> bool {
    level_median > MIN_LEVEL_COUNTS && pump_enabled()
}
