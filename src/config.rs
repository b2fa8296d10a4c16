//! TOML-based scenario configuration and preset definitions.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::devices::{Band, Consumer, Plant, Pump, Tank, TankRole};
use crate::sensor::{Sensor, UniformSensor};
use crate::sim::billing::Tariff;
use crate::sim::controller::Hysteresis;
use crate::sim::engine::{Engine, PowerModel};
use crate::sim::types::{SimConfig, WateringMode};

/// Top-level scenario configuration parsed from TOML.
///
/// Every section falls back to the `single_tank` preset. Load from TOML with
/// [`ScenarioConfig::from_toml_file`] or pick a built-in with
/// [`ScenarioConfig::from_preset`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Simulation timing and global parameters.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Water and power prices.
    #[serde(default)]
    pub tariff: TariffConfig,
    /// Power model parameters.
    #[serde(default)]
    pub power: PowerConfig,
    #[serde(default = "single_tank_tanks")]
    pub tanks: Vec<TankConfig>,
    #[serde(default = "single_tank_pumps")]
    pub pumps: Vec<PumpConfig>,
    #[serde(default = "single_tank_consumers")]
    pub consumers: Vec<ConsumerConfig>,
}

/// Simulation timing and global parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Tick period in milliseconds (must be > 0).
    pub tick_ms: u64,
    /// Master random seed.
    pub seed: u64,
    /// Initial watering mode.
    pub mode: WateringMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            seed: 42,
            mode: WateringMode::Auto,
        }
    }
}

/// Water and power prices.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TariffConfig {
    /// Currency per liter.
    pub water_rate: f64,
    /// Currency per kWh.
    pub power_rate: f64,
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            water_rate: 0.05,
            power_rate: 0.12,
        }
    }
}

/// Power model parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PowerConfig {
    /// Standby draw range (kW).
    pub base_kw: Band,
    /// kW added per L/min of consumer flow.
    pub flow_coefficient_kw_per_lpm: f64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            base_kw: Band::new(0.1, 0.3),
            flow_coefficient_kw_per_lpm: 0.0,
        }
    }
}

/// One tank.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TankConfig {
    pub id: String,
    /// Capacity (liters, > 0).
    pub capacity_liters: f64,
    /// Starting level (0 to 100).
    pub initial_level_percent: f64,
    #[serde(default = "default_role")]
    pub role: TankRole,
    /// Constant outflow for source tanks (L/min).
    #[serde(default)]
    pub passive_drain_lpm: f64,
}

/// One pump and its hysteresis thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PumpConfig {
    pub id: String,
    /// Id of the tank the pump fills.
    pub feeds: String,
    /// Id of the upstream tank, if the pump draws from one.
    #[serde(default)]
    pub source: Option<String>,
    pub on_below_percent: f64,
    pub off_above_percent: f64,
    /// Upstream level the source must exceed before the pump may start.
    #[serde(default)]
    pub min_source_percent: Option<f64>,
    /// Delivery rate range while running (L/min).
    pub delivery_lpm: Band,
    /// Electrical draw range while running (kW).
    pub draw_kw: Band,
    #[serde(default)]
    pub initially_on: bool,
}

/// One metered consumer.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsumerConfig {
    pub id: String,
    /// Id of the tank supplying this consumer.
    pub supplied_by: String,
    /// Flow rate range (L/min).
    pub flow_lpm: Band,
    /// Static monthly reference figure (liters).
    #[serde(default)]
    pub monthly_usage_liters: f64,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"pumps[1].source"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn default_role() -> TankRole {
    TankRole::Distribution
}

fn single_tank_tanks() -> Vec<TankConfig> {
    vec![TankConfig {
        id: "main".into(),
        capacity_liters: 1000.0,
        initial_level_percent: 45.0,
        role: TankRole::Distribution,
        passive_drain_lpm: 0.0,
    }]
}

fn single_tank_pumps() -> Vec<PumpConfig> {
    vec![PumpConfig {
        id: "motor".into(),
        feeds: "main".into(),
        source: None,
        on_below_percent: 30.0,
        off_above_percent: 90.0,
        min_source_percent: None,
        delivery_lpm: Band::new(120.0, 360.0),
        draw_kw: Band::new(2.5, 4.0),
        initially_on: false,
    }]
}

fn single_tank_consumers() -> Vec<ConsumerConfig> {
    vec![ConsumerConfig {
        id: "main".into(),
        supplied_by: "main".into(),
        flow_lpm: Band::new(0.0, 50.0),
        monthly_usage_liters: 1200.0,
    }]
}

fn percent_ok(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}

impl ScenarioConfig {
    /// One 1000 L tank refilled by a single motor and drained by one outlet.
    pub fn single_tank() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            tariff: TariffConfig::default(),
            power: PowerConfig::default(),
            tanks: single_tank_tanks(),
            pumps: single_tank_pumps(),
            consumers: single_tank_consumers(),
        }
    }

    /// Underground sump feeding an overhead tank that supplies four houses.
    pub fn multi_house() -> Self {
        let houses = [
            ("house-a", 4500.0),
            ("house-b", 5200.0),
            ("house-c", 3900.0),
            ("house-d", 6100.0),
        ];
        Self {
            simulation: SimulationConfig::default(),
            tariff: TariffConfig {
                water_rate: 3.5,
                power_rate: 8.5,
            },
            power: PowerConfig {
                base_kw: Band::fixed(0.5),
                flow_coefficient_kw_per_lpm: 0.01,
            },
            tanks: vec![
                TankConfig {
                    id: "underground".into(),
                    capacity_liters: 5000.0,
                    initial_level_percent: 60.0,
                    role: TankRole::Source,
                    passive_drain_lpm: 5.0,
                },
                TankConfig {
                    id: "overhead".into(),
                    capacity_liters: 1500.0,
                    initial_level_percent: 50.0,
                    role: TankRole::Distribution,
                    passive_drain_lpm: 0.0,
                },
            ],
            pumps: vec![
                PumpConfig {
                    id: "underground".into(),
                    feeds: "underground".into(),
                    source: None,
                    on_below_percent: 20.0,
                    off_above_percent: 90.0,
                    min_source_percent: None,
                    delivery_lpm: Band::new(400.0, 600.0),
                    draw_kw: Band::fixed(3.5),
                    initially_on: false,
                },
                PumpConfig {
                    id: "overhead".into(),
                    feeds: "overhead".into(),
                    source: Some("underground".into()),
                    on_below_percent: 30.0,
                    off_above_percent: 85.0,
                    min_source_percent: Some(40.0),
                    delivery_lpm: Band::new(150.0, 250.0),
                    draw_kw: Band::fixed(2.5),
                    initially_on: false,
                },
            ],
            consumers: houses
                .iter()
                .map(|&(id, monthly)| ConsumerConfig {
                    id: id.into(),
                    supplied_by: "overhead".into(),
                    flow_lpm: Band::new(0.0, 15.0),
                    monthly_usage_liters: monthly,
                })
                .collect(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["single_tank", "multi_house"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "single_tank" => Ok(Self::single_tank()),
            "multi_house" => Ok(Self::multi_house()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.simulation.tick_ms == 0 {
            errors.push(ConfigError::new("simulation.tick_ms", "must be > 0"));
        }

        let t = &self.tariff;
        if !(t.water_rate.is_finite() && t.water_rate >= 0.0) {
            errors.push(ConfigError::new("tariff.water_rate", "must be a finite value >= 0"));
        }
        if !(t.power_rate.is_finite() && t.power_rate >= 0.0) {
            errors.push(ConfigError::new("tariff.power_rate", "must be a finite value >= 0"));
        }

        let p = &self.power;
        if !p.base_kw.is_valid() {
            errors.push(ConfigError::new("power.base_kw", "must satisfy 0 <= min <= max"));
        }
        let coeff = p.flow_coefficient_kw_per_lpm;
        if !(coeff.is_finite() && coeff >= 0.0) {
            errors.push(ConfigError::new(
                "power.flow_coefficient_kw_per_lpm",
                "must be a finite value >= 0",
            ));
        }

        self.validate_tanks(&mut errors);
        self.validate_pumps(&mut errors);
        self.validate_consumers(&mut errors);

        errors
    }

    fn validate_tanks(&self, errors: &mut Vec<ConfigError>) {
        if self.tanks.is_empty() {
            errors.push(ConfigError::new("tanks", "at least one tank is required"));
        }
        let mut seen = HashSet::new();
        for (i, tank) in self.tanks.iter().enumerate() {
            let at = |field: &str| format!("tanks[{i}].{field}");
            if !seen.insert(tank.id.as_str()) {
                errors.push(ConfigError::new(at("id"), format!("duplicate tank id \"{}\"", tank.id)));
            }
            if !(tank.capacity_liters.is_finite() && tank.capacity_liters > 0.0) {
                errors.push(ConfigError::new(at("capacity_liters"), "must be > 0"));
            }
            if !percent_ok(tank.initial_level_percent) {
                errors.push(ConfigError::new(at("initial_level_percent"), "must be in [0, 100]"));
            }
            if !(tank.passive_drain_lpm.is_finite() && tank.passive_drain_lpm >= 0.0) {
                errors.push(ConfigError::new(at("passive_drain_lpm"), "must be >= 0"));
            } else if tank.passive_drain_lpm > 0.0 && tank.role == TankRole::Distribution {
                errors.push(ConfigError::new(
                    at("passive_drain_lpm"),
                    "only source tanks have a passive drain",
                ));
            }
        }
    }

    fn validate_pumps(&self, errors: &mut Vec<ConfigError>) {
        let mut seen = HashSet::new();
        for (i, pump) in self.pumps.iter().enumerate() {
            let at = |field: &str| format!("pumps[{i}].{field}");
            if !seen.insert(pump.id.as_str()) {
                errors.push(ConfigError::new(at("id"), format!("duplicate pump id \"{}\"", pump.id)));
            }
            if self.tank_index(&pump.feeds).is_none() {
                errors.push(ConfigError::new(at("feeds"), format!("unknown tank \"{}\"", pump.feeds)));
            }
            if let Some(source) = &pump.source {
                if self.tank_index(source).is_none() {
                    errors.push(ConfigError::new(at("source"), format!("unknown tank \"{source}\"")));
                } else if *source == pump.feeds {
                    errors.push(ConfigError::new(at("source"), "must differ from feeds"));
                }
            }
            if !percent_ok(pump.on_below_percent) {
                errors.push(ConfigError::new(at("on_below_percent"), "must be in [0, 100]"));
            }
            if !percent_ok(pump.off_above_percent) {
                errors.push(ConfigError::new(at("off_above_percent"), "must be in [0, 100]"));
            }
            if pump.on_below_percent >= pump.off_above_percent {
                errors.push(ConfigError::new(
                    at("on_below_percent"),
                    "must be < off_above_percent",
                ));
            }
            match (pump.min_source_percent, &pump.source) {
                (Some(_), None) => {
                    errors.push(ConfigError::new(
                        at("min_source_percent"),
                        "requires a source tank",
                    ));
                }
                (Some(gate), Some(_)) if !percent_ok(gate) => {
                    errors.push(ConfigError::new(at("min_source_percent"), "must be in [0, 100]"));
                }
                _ => {}
            }
            if !pump.delivery_lpm.is_valid() {
                errors.push(ConfigError::new(at("delivery_lpm"), "must satisfy 0 <= min <= max"));
            }
            if !pump.draw_kw.is_valid() {
                errors.push(ConfigError::new(at("draw_kw"), "must satisfy 0 <= min <= max"));
            }
        }
    }

    fn validate_consumers(&self, errors: &mut Vec<ConfigError>) {
        if self.consumers.is_empty() {
            errors.push(ConfigError::new("consumers", "at least one consumer is required"));
        }
        let mut seen = HashSet::new();
        for (i, consumer) in self.consumers.iter().enumerate() {
            let at = |field: &str| format!("consumers[{i}].{field}");
            if !seen.insert(consumer.id.as_str()) {
                errors.push(ConfigError::new(
                    at("id"),
                    format!("duplicate consumer id \"{}\"", consumer.id),
                ));
            }
            if self.tank_index(&consumer.supplied_by).is_none() {
                errors.push(ConfigError::new(
                    at("supplied_by"),
                    format!("unknown tank \"{}\"", consumer.supplied_by),
                ));
            }
            if !consumer.flow_lpm.is_valid() {
                errors.push(ConfigError::new(at("flow_lpm"), "must satisfy 0 <= min <= max"));
            }
            let monthly = consumer.monthly_usage_liters;
            if !(monthly.is_finite() && monthly >= 0.0) {
                errors.push(ConfigError::new(at("monthly_usage_liters"), "must be >= 0"));
            }
        }
    }

    fn tank_index(&self, id: &str) -> Option<usize> {
        self.tanks.iter().position(|t| t.id == id)
    }

    /// Timing configuration for the engine.
    pub fn sim_config(&self) -> SimConfig {
        SimConfig::new(self.simulation.tick_ms, self.simulation.seed)
    }

    pub fn tariff(&self) -> Tariff {
        Tariff {
            water_rate: self.tariff.water_rate,
            power_rate: self.tariff.power_rate,
        }
    }

    /// Resolves ids into a runnable [`Plant`].
    ///
    /// # Errors
    ///
    /// Returns the first validation error if the configuration is invalid.
    pub fn plant(&self) -> Result<Plant, ConfigError> {
        if let Some(err) = self.validate().into_iter().next() {
            return Err(err);
        }
        // Indices below are guaranteed by validation.
        let index = |id: &str| self.tank_index(id).unwrap_or_default();

        let tanks = self
            .tanks
            .iter()
            .map(|t| {
                Tank::new(
                    t.id.clone(),
                    t.capacity_liters,
                    t.initial_level_percent,
                    t.role,
                    t.passive_drain_lpm,
                )
            })
            .collect();
        let pumps = self
            .pumps
            .iter()
            .map(|p| {
                let mut control = Hysteresis::new(p.on_below_percent, p.off_above_percent);
                if let Some(gate) = p.min_source_percent {
                    control = control.with_source_gate(gate);
                }
                Pump::new(
                    p.id.clone(),
                    index(&p.feeds),
                    p.source.as_deref().map(index),
                    control,
                    p.delivery_lpm,
                    p.draw_kw,
                    p.initially_on,
                )
            })
            .collect();
        let consumers = self
            .consumers
            .iter()
            .map(|c| {
                Consumer::new(
                    c.id.clone(),
                    index(&c.supplied_by),
                    c.flow_lpm,
                    c.monthly_usage_liters,
                )
            })
            .collect();

        Ok(Plant {
            tanks,
            pumps,
            consumers,
            base_kw: self.power.base_kw,
        })
    }

    /// Builds an engine driven by the seeded uniform sensor.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if the configuration is invalid.
    pub fn engine(&self) -> Result<Engine<UniformSensor>, ConfigError> {
        self.engine_with(UniformSensor::new(self.simulation.seed))
    }

    /// Builds an engine driven by the given sensor.
    ///
    /// # Errors
    ///
    /// Returns the first validation error if the configuration is invalid.
    pub fn engine_with<S: Sensor>(&self, sensor: S) -> Result<Engine<S>, ConfigError> {
        let plant = self.plant()?;
        Ok(Engine::new(
            self.sim_config(),
            plant,
            self.tariff(),
            PowerModel {
                flow_coefficient_kw_per_lpm: self.power.flow_coefficient_kw_per_lpm,
            },
            self.simulation.mode,
            sensor,
        ))
    }
}
