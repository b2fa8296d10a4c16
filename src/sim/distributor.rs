//! Per-tick consumption distribution.

use crate::devices::types::non_negative;

use super::types::WateringMode;

/// Flow drawn by one consumer during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draw {
    /// Applied flow rate (L/min, >= 0).
    pub flow_lpm: f64,
    /// Volume delivered this tick (liters).
    pub liters: f64,
}

/// Converts sampled per-consumer flow rates into per-tick draws.
///
/// `Off` forces every flow to zero regardless of the samples. `On` and
/// `Auto` pass the sanitized samples through unchanged.
///
/// # Arguments
///
/// * `mode` - Global watering mode
/// * `samples` - Sampled flow rate per consumer (L/min)
/// * `tick_minutes` - Tick duration in minutes
pub fn distribute(mode: WateringMode, samples: &[f64], tick_minutes: f64) -> Vec<Draw> {
    samples
        .iter()
        .map(|&sample| {
            let flow_lpm = if mode.allows_flow() {
                non_negative(sample)
            } else {
                0.0
            };
            Draw {
                flow_lpm,
                liters: flow_lpm * tick_minutes,
            }
        })
        .collect()
}
