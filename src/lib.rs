//! Tick-driven simulator for residential water supply networks.
//!
//! Tanks are refilled by hysteresis-controlled pumps and drained by metered
//! consumers; every tick publishes a [`sim::types::Snapshot`] with levels,
//! flows, power draw and running bills.

pub mod config;
pub mod devices;
pub mod io;
/// Synthetic and replayed sensor readings.
pub mod sensor;
/// Simulation engine, control, billing and clock modules.
pub mod sim;

#[cfg(feature = "api")]
pub mod api;
#[cfg(feature = "tui")]
pub mod tui;
