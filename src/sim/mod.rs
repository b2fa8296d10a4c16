/// Usage metering and tariffs.
pub mod billing;
/// Simulation clock for tick pacing and cancellation.
pub mod clock;
pub mod command;
pub mod controller;
pub mod distributor;
pub mod engine;
pub mod power;
/// Post-hoc run statistics.
pub mod summary;
pub mod types;
