//! Physical components of the water supply network.

/// Metered water consumers (houses, outlets).
pub mod consumer;
/// Pumps lifting water between tanks.
pub mod pump;
/// Bounded reservoirs.
pub mod tank;
pub mod types;

use serde::Serialize;

use crate::sensor::{Channel, SensorLayout};

pub use consumer::Consumer;
pub use pump::Pump;
pub use tank::Tank;
pub use types::{Band, TankRole};

/// The resolved set of tanks, pumps and consumers an engine runs.
///
/// All cross references (`Pump::feeds`, `Pump::source`,
/// `Consumer::supplied_by`) are indices into `tanks`.
#[derive(Debug, Clone)]
pub struct Plant {
    pub tanks: Vec<Tank>,
    pub pumps: Vec<Pump>,
    pub consumers: Vec<Consumer>,
    /// Standby/base electrical draw range (kW).
    pub base_kw: Band,
}

impl Plant {
    /// Sensor channels needed to drive this plant, in engine order.
    pub fn sensor_layout(&self) -> SensorLayout {
        SensorLayout {
            feeds: self
                .pumps
                .iter()
                .map(|p| Channel::new(format!("feed.{}", p.id), p.delivery_lpm))
                .collect(),
            consumers: self
                .consumers
                .iter()
                .map(|c| Channel::new(format!("flow.{}", c.id), c.flow_band))
                .collect(),
            pump_draws: self
                .pumps
                .iter()
                .map(|p| Channel::new(format!("draw.{}", p.id), p.draw_kw))
                .collect(),
            base: Channel::new("base", self.base_kw),
        }
    }

    /// Looks up a consumer index by id.
    pub fn consumer_index(&self, id: &str) -> Option<usize> {
        self.consumers.iter().position(|c| c.id == id)
    }

    /// Describes the first pump or consumer wired to a tank index outside
    /// `tanks`, if any.
    pub fn wiring_error(&self) -> Option<String> {
        let tanks = self.tanks.len();
        for pump in &self.pumps {
            if pump.feeds >= tanks {
                return Some(format!("pump \"{}\" feeds tank #{}", pump.id, pump.feeds));
            }
            if let Some(src) = pump.source.filter(|&s| s >= tanks) {
                return Some(format!("pump \"{}\" draws from tank #{src}", pump.id));
            }
        }
        self.consumers
            .iter()
            .find(|c| c.supplied_by >= tanks)
            .map(|c| format!("consumer \"{}\" is supplied by tank #{}", c.id, c.supplied_by))
    }

    /// Static description of the plant topology.
    pub fn topology(&self) -> Topology {
        Topology {
            tanks: self
                .tanks
                .iter()
                .map(|t| TankInfo {
                    id: t.id.clone(),
                    capacity_liters: t.capacity_liters,
                    role: t.role,
                })
                .collect(),
            pumps: self
                .pumps
                .iter()
                .map(|p| PumpInfo {
                    id: p.id.clone(),
                    feeds: self.tanks[p.feeds].id.clone(),
                    source: p.source.map(|s| self.tanks[s].id.clone()),
                    on_below_percent: p.control.on_below,
                    off_above_percent: p.control.off_above,
                    min_source_percent: p.control.min_source,
                })
                .collect(),
            consumers: self.consumers.iter().map(|c| c.id.clone()).collect(),
        }
    }
}

/// Static plant description published alongside live snapshots.
#[derive(Debug, Clone, Serialize)]
pub struct Topology {
    pub tanks: Vec<TankInfo>,
    pub pumps: Vec<PumpInfo>,
    pub consumers: Vec<String>,
}

/// Static tank parameters.
#[derive(Debug, Clone, Serialize)]
pub struct TankInfo {
    pub id: String,
    pub capacity_liters: f64,
    pub role: TankRole,
}

/// Static pump wiring and thresholds.
#[derive(Debug, Clone, Serialize)]
pub struct PumpInfo {
    pub id: String,
    pub feeds: String,
    pub source: Option<String>,
    pub on_below_percent: f64,
    pub off_above_percent: f64,
    pub min_source_percent: Option<f64>,
}
