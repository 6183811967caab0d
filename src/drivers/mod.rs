//! Actuator drivers, hardware initialisation, and peripheral helpers.

pub mod dht;
pub mod hw_init;
pub mod pump;
