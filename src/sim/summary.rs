//! Post-hoc run summary computed from recorded snapshots.

use std::fmt;

use serde::Serialize;

use super::types::Snapshot;

/// Run statistics for one pump.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PumpStats {
    pub id: String,
    /// Ticks that ended with the pump running.
    pub on_ticks: u64,
    /// Number of on/off transitions observed.
    pub switches: u64,
}

/// Level range seen for one tank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankStats {
    pub id: String,
    pub min_level_percent: f64,
    pub max_level_percent: f64,
}

/// Aggregate indicators for a complete run.
///
/// Water cost and power cost are reported side by side and never summed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub pumps: Vec<PumpStats>,
    pub tanks: Vec<TankStats>,
    /// Water delivered since the last billing reset (liters).
    pub total_usage_liters: f64,
    /// Water bill since the last billing reset.
    pub total_bill: f64,
    pub peak_kw: f64,
    pub mean_kw: f64,
    /// Electrical energy drawn over the run (kWh).
    pub energy_kwh: f64,
    /// Cost of `energy_kwh` at the tariff power rate.
    pub power_cost: f64,
}

impl RunSummary {
    /// Computes the summary from every snapshot of a run, in order.
    ///
    /// Pump switches are counted between consecutive snapshots, so the first
    /// snapshot's pump state is taken as the starting point.
    ///
    /// # Arguments
    ///
    /// * `snapshots` - Snapshots returned by successive ticks
    /// * `tick_minutes` - Tick duration in minutes
    pub fn from_snapshots(snapshots: &[Snapshot], tick_minutes: f64) -> Self {
        let Some(first) = snapshots.first() else {
            return Self::empty();
        };
        let last = &snapshots[snapshots.len() - 1];
        let tick_hours = tick_minutes / 60.0;

        let mut pumps: Vec<PumpStats> = first
            .pumps
            .iter()
            .map(|p| PumpStats {
                id: p.id.clone(),
                on_ticks: 0,
                switches: 0,
            })
            .collect();
        let mut tanks: Vec<TankStats> = first
            .tanks
            .iter()
            .map(|t| TankStats {
                id: t.id.clone(),
                min_level_percent: t.level_percent,
                max_level_percent: t.level_percent,
            })
            .collect();

        let mut peak_kw = 0.0_f64;
        let mut kw_sum = 0.0;
        let mut power_cost = 0.0;
        let mut previous: Option<&Snapshot> = None;

        for snap in snapshots {
            for (idx, pump) in snap.pumps.iter().enumerate() {
                let Some(stats) = pumps.get_mut(idx) else { continue };
                if pump.is_on {
                    stats.on_ticks += 1;
                }
                let was_on = previous.and_then(|p| p.pumps.get(idx)).map(|p| p.is_on);
                if was_on.is_some_and(|was| was != pump.is_on) {
                    stats.switches += 1;
                }
            }
            for (idx, tank) in snap.tanks.iter().enumerate() {
                let Some(stats) = tanks.get_mut(idx) else { continue };
                stats.min_level_percent = stats.min_level_percent.min(tank.level_percent);
                stats.max_level_percent = stats.max_level_percent.max(tank.level_percent);
            }
            peak_kw = peak_kw.max(snap.power.total_kw);
            kw_sum += snap.power.total_kw;
            power_cost += snap.power.cost_per_hour * tick_hours;
            previous = Some(snap);
        }

        Self {
            ticks: snapshots.len() as u64,
            pumps,
            tanks,
            total_usage_liters: last.total_usage_liters,
            total_bill: last.total_bill,
            peak_kw,
            mean_kw: kw_sum / snapshots.len() as f64,
            energy_kwh: kw_sum * tick_hours,
            power_cost,
        }
    }

    fn empty() -> Self {
        Self {
            ticks: 0,
            pumps: Vec::new(),
            tanks: Vec::new(),
            total_usage_liters: 0.0,
            total_bill: 0.0,
            peak_kw: 0.0,
            mean_kw: 0.0,
            energy_kwh: 0.0,
            power_cost: 0.0,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Summary ---")?;
        writeln!(f, "Ticks:                  {}", self.ticks)?;
        for tank in &self.tanks {
            writeln!(
                f,
                "Tank {:<18} {:.1}% .. {:.1}%",
                format!("{}:", tank.id),
                tank.min_level_percent,
                tank.max_level_percent
            )?;
        }
        for pump in &self.pumps {
            writeln!(
                f,
                "Pump {:<18} {} on-ticks, {} switches",
                format!("{}:", pump.id),
                pump.on_ticks,
                pump.switches
            )?;
        }
        writeln!(f, "Water usage:            {:.2} L", self.total_usage_liters)?;
        writeln!(f, "Water bill:             {:.2}", self.total_bill)?;
        writeln!(f, "Peak power:             {:.2} kW", self.peak_kw)?;
        writeln!(f, "Mean power:             {:.2} kW", self.mean_kw)?;
        writeln!(f, "Energy:                 {:.4} kWh", self.energy_kwh)?;
        write!(f, "Power cost:             {:.4}", self.power_cost)
    }
}
