//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use aquaflow_sim::config::ScenarioConfig;
use aquaflow_sim::sensor::{FixedSensor, SensorFrame};
use aquaflow_sim::sim::engine::Engine;

/// Single-tank scenario starting at `level` percent, with a flat 1 kW standby.
pub fn single_tank_config(level: f64) -> ScenarioConfig {
    let mut cfg = ScenarioConfig::single_tank();
    cfg.tanks[0].initial_level_percent = level;
    cfg
}

/// Frame for the single-tank layout: motor delivery, outlet flow, motor draw.
pub fn single_tank_frame(feed_lpm: f64, flow_lpm: f64) -> SensorFrame {
    SensorFrame {
        feed_lpm: vec![feed_lpm],
        consumer_lpm: vec![flow_lpm],
        pump_kw: vec![3.0],
        base_kw: 0.2,
    }
}

/// Single-tank engine fed by a constant frame.
pub fn single_tank_engine(level: f64, feed_lpm: f64, flow_lpm: f64) -> Engine<FixedSensor> {
    single_tank_config(level)
        .engine_with(FixedSensor::new(single_tank_frame(feed_lpm, flow_lpm)))
        .expect("single_tank preset should be valid")
}

/// Frame for the multi-house layout.
///
/// Feeds are `[underground, overhead]`; every house draws `house_lpm`.
pub fn multi_house_frame(underground_lpm: f64, overhead_lpm: f64, house_lpm: f64) -> SensorFrame {
    SensorFrame {
        feed_lpm: vec![underground_lpm, overhead_lpm],
        consumer_lpm: vec![house_lpm; 4],
        pump_kw: vec![3.5, 2.5],
        base_kw: 0.5,
    }
}

/// Multi-house engine with the given starting levels and a constant frame.
pub fn multi_house_engine(
    underground_level: f64,
    overhead_level: f64,
    frame: SensorFrame,
) -> Engine<FixedSensor> {
    let mut cfg = ScenarioConfig::multi_house();
    cfg.tanks[0].initial_level_percent = underground_level;
    cfg.tanks[1].initial_level_percent = overhead_level;
    cfg.engine_with(FixedSensor::new(frame))
        .expect("multi_house preset should be valid")
}
