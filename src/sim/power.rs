//! Stateless power draw model.

use serde::Serialize;

use super::billing::Tariff;

/// Computes instantaneous plant power draw.
///
/// `power = base + Σ(draw of running pumps) + total_flow × flow_coefficient`,
/// clamped to be non-negative. Stopped pumps contribute nothing.
///
/// # Arguments
///
/// * `base_kw` - Standby/base draw (kW)
/// * `pumps` - `(is_on, draw_kw)` per pump
/// * `total_flow_lpm` - Aggregate consumer flow (L/min)
/// * `flow_coefficient` - kW per L/min of consumer flow
pub fn power_kw(
    base_kw: f64,
    pumps: impl IntoIterator<Item = (bool, f64)>,
    total_flow_lpm: f64,
    flow_coefficient: f64,
) -> f64 {
    let pump_kw: f64 = pumps
        .into_iter()
        .filter(|(is_on, _)| *is_on)
        .map(|(_, kw)| kw)
        .sum();
    (base_kw + pump_kw + total_flow_lpm * flow_coefficient).max(0.0)
}

/// Power draw and its cost rate for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PowerReading {
    /// Total plant draw (kW, >= 0).
    pub total_kw: f64,
    /// Cost rate at the current draw (currency per hour).
    pub cost_per_hour: f64,
    /// Cost rate at the current draw (currency per minute).
    pub cost_per_minute: f64,
}

impl PowerReading {
    /// Prices a draw of `total_kw` with the given tariff.
    pub fn priced(total_kw: f64, tariff: &Tariff) -> Self {
        let cost_per_hour = tariff.power_cost_per_hour(total_kw);
        Self {
            total_kw,
            cost_per_hour,
            cost_per_minute: cost_per_hour / 60.0,
        }
    }
}
