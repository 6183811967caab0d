//! PlantWater firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod fsm;
pub mod median;
pub mod protocol;
pub mod safety;
pub mod sensors;
pub mod store;

pub mod error;
pub mod pins;

// ESP-IDF-facing modules; the hardware implementations inside are
// guarded by cfg attributes so host builds see only the sim halves.
pub mod adapters;
pub mod drivers;
