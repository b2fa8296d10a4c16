//! Core simulation types: timing configuration, watering mode, and snapshots.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::power::PowerReading;

/// Centralized simulation timing configuration.
///
/// # Examples
///
/// ```
/// use aquaflow_sim::sim::types::SimConfig;
///
/// let cfg = SimConfig::new(1000, 42);
/// assert!((cfg.tick_minutes() - 1.0 / 60.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct SimConfig {
    /// Tick period in milliseconds.
    pub tick_ms: u64,
    /// Master random seed for reproducibility.
    pub seed: u64,
}

impl SimConfig {
    /// Creates a new simulation configuration.
    ///
    /// # Panics
    ///
    /// Panics if `tick_ms` is zero.
    pub fn new(tick_ms: u64, seed: u64) -> Self {
        assert!(tick_ms > 0, "tick_ms must be > 0");
        Self { tick_ms, seed }
    }

    /// Tick duration in minutes, the unit flow rates are expressed in.
    pub fn tick_minutes(&self) -> f64 {
        self.tick_ms as f64 / 60_000.0
    }

    /// Tick duration as a wall-clock period.
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

/// Global switch over consumer flow.
///
/// `On` and `Auto` both let sampled flow through; only `Off` changes the
/// outcome by forcing every consumer to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WateringMode {
    On,
    Off,
    #[default]
    Auto,
}

impl WateringMode {
    /// Returns `true` when consumers may draw water.
    pub fn allows_flow(self) -> bool {
        !matches!(self, Self::Off)
    }

    /// Lowercase name used in config files and the API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for WateringMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WateringMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            "auto" => Ok(Self::Auto),
            other => Err(format!(
                "unknown watering mode \"{other}\", expected on, off or auto"
            )),
        }
    }
}

/// Published state of one tank.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankSnapshot {
    pub id: String,
    pub capacity_liters: f64,
    /// Fill level in percent (0 to 100).
    pub level_percent: f64,
    /// Current volume in liters.
    pub liters: f64,
}

/// Published state of one pump.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PumpSnapshot {
    pub id: String,
    /// Id of the tank this pump fills.
    pub feeds: String,
    pub is_on: bool,
}

/// Published state of one consumer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumerSnapshot {
    pub id: String,
    pub flow_rate_lpm: f64,
    pub daily_usage_liters: f64,
    pub monthly_usage_liters: f64,
    pub current_bill: f64,
}

/// Read-only copy of the full engine state after a tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Number of ticks completed.
    pub tick: u64,
    /// Simulated seconds elapsed.
    pub elapsed_s: f64,
    pub mode: WateringMode,
    pub tanks: Vec<TankSnapshot>,
    pub pumps: Vec<PumpSnapshot>,
    pub consumers: Vec<ConsumerSnapshot>,
    /// Power draw and cost rate of the most recent tick.
    pub power: PowerReading,
    /// Sum of consumer flow rates (L/min).
    pub total_flow_lpm: f64,
    /// Sum of consumer usage since their last resets (liters).
    pub total_usage_liters: f64,
    /// Sum of consumer water bills.
    pub total_bill: f64,
}

impl Snapshot {
    /// Looks up a tank by id.
    pub fn tank(&self, id: &str) -> Option<&TankSnapshot> {
        self.tanks.iter().find(|t| t.id == id)
    }

    /// Looks up a pump by id.
    pub fn pump(&self, id: &str) -> Option<&PumpSnapshot> {
        self.pumps.iter().find(|p| p.id == id)
    }

    /// Looks up a consumer by id.
    pub fn consumer(&self, id: &str) -> Option<&ConsumerSnapshot> {
        self.consumers.iter().find(|c| c.id == id)
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "t={:>5} ({:>7.1}s) mode={:<4} |",
            self.tick, self.elapsed_s, self.mode
        )?;
        for tank in &self.tanks {
            write!(f, " {}={:>5.1}%", tank.id, tank.level_percent)?;
        }
        write!(f, " |")?;
        for pump in &self.pumps {
            write!(f, " {}={}", pump.id, if pump.is_on { "ON" } else { "off" })?;
        }
        write!(
            f,
            " | flow={:>6.2} L/min  power={:.2} kW ({:.4}/min) | usage={:.1} L  bill={:.2}",
            self.total_flow_lpm,
            self.power.total_kw,
            self.power.cost_per_minute,
            self.total_usage_liters,
            self.total_bill,
        )
    }
}
