//! Simulation engine that owns the plant and runs the control loop.

use tracing::{debug, info, warn};

use crate::devices::Plant;
use crate::devices::types::non_negative;
use crate::sensor::{Sensor, SensorLayout};

use super::billing::{BillingScope, Tariff};
use super::command::Command;
use super::distributor::distribute;
use super::power::{PowerReading, power_kw};
use super::types::{ConsumerSnapshot, PumpSnapshot, SimConfig, Snapshot, TankSnapshot, WateringMode};

/// Power model constants fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerModel {
    /// kW of draw added per L/min of total consumer flow.
    pub flow_coefficient_kw_per_lpm: f64,
}

/// Simulation engine owning every tank, pump and consumer.
///
/// Generic over `S: Sensor` for static dispatch. All state lives here; the
/// outside world only sees cloned [`Snapshot`]s and talks back through
/// [`Command`]s.
pub struct Engine<S: Sensor> {
    config: SimConfig,
    plant: Plant,
    tariff: Tariff,
    power_model: PowerModel,
    sensor: S,
    layout: SensorLayout,
    mode: WateringMode,
    power: PowerReading,
    tick: u64,
}

impl<S: Sensor> Engine<S> {
    /// Creates a new engine at tick 0.
    ///
    /// # Arguments
    ///
    /// * `config` - Timing configuration
    /// * `plant` - Resolved tanks, pumps and consumers
    /// * `tariff` - Water and power prices
    /// * `power_model` - Power model constants
    /// * `mode` - Initial watering mode
    /// * `sensor` - Reading source
    ///
    /// # Panics
    ///
    /// Panics if a pump or consumer refers to a tank index outside the plant.
    pub fn new(
        config: SimConfig,
        plant: Plant,
        tariff: Tariff,
        power_model: PowerModel,
        mode: WateringMode,
        sensor: S,
    ) -> Self {
        if let Some(err) = plant.wiring_error() {
            panic!("invalid plant wiring: {err}");
        }
        let layout = plant.sensor_layout();
        Self {
            config,
            plant,
            tariff,
            power_model,
            sensor,
            layout,
            mode,
            power: PowerReading::default(),
            tick: 0,
        }
    }

    /// Executes one control-loop tick and returns the resulting snapshot.
    ///
    /// Order within a tick: sample sensors, distribute consumption, update
    /// tanks (inflow then outflow), decide pumps on the post-update levels,
    /// accumulate billing, then derive power.
    pub fn tick(&mut self) -> Snapshot {
        let frame = self.sensor.sample(&self.layout);
        if !frame.matches(&self.layout) {
            warn!(
                sensor = self.sensor.kind(),
                tick = self.tick,
                "sensor frame does not match layout; missing channels read as zero"
            );
        }
        let dt_min = self.config.tick_minutes();
        let tank_count = self.plant.tanks.len();

        // 1. Consumption demand per consumer
        let draws = distribute(self.mode, &frame.consumer_lpm, dt_min);
        let mut inflow_l = vec![0.0_f64; tank_count];
        let mut outflow_l = vec![0.0_f64; tank_count];
        for (idx, consumer) in self.plant.consumers.iter_mut().enumerate() {
            let (flow_lpm, liters) = draws.get(idx).map_or((0.0, 0.0), |d| (d.flow_lpm, d.liters));
            consumer.flow_rate_lpm = flow_lpm;
            outflow_l[consumer.supplied_by] += liters;
        }

        // 2. Passive drain on source tanks
        for (idx, tank) in self.plant.tanks.iter().enumerate() {
            outflow_l[idx] += tank.passive_drain_liters(dt_min);
        }

        // 3. Pump transfers from the previous tick's decisions
        for (idx, pump) in self.plant.pumps.iter().enumerate() {
            if !pump.is_on {
                continue;
            }
            let mut liters = non_negative(frame.feed_lpm.get(idx).copied().unwrap_or(0.0)) * dt_min;
            let target = &self.plant.tanks[pump.feeds];
            let room = target.capacity_liters - target.liters() - inflow_l[pump.feeds]
                + outflow_l[pump.feeds];
            liters = liters.min(room.max(0.0));
            if let Some(src) = pump.source {
                let available = (self.plant.tanks[src].liters() - outflow_l[src]).max(0.0);
                liters = liters.min(available);
                outflow_l[src] += liters;
            }
            inflow_l[pump.feeds] += liters;
        }

        // 4. Tank update, all tanks before any pump decision
        for (idx, tank) in self.plant.tanks.iter_mut().enumerate() {
            tank.apply_flow(inflow_l[idx], outflow_l[idx]);
        }

        // 5. Pump decisions on post-update levels
        let tanks = &self.plant.tanks;
        for pump in &mut self.plant.pumps {
            let level = tanks[pump.feeds].level_percent();
            let source_level = pump.source.map(|s| tanks[s].level_percent());
            let next = pump.control.next_state(pump.is_on, level, source_level);
            if next != pump.is_on {
                info!(
                    pump = %pump.id,
                    tank = %tanks[pump.feeds].id,
                    level = format_args!("{level:.1}"),
                    on = next,
                    "pump switched"
                );
                pump.is_on = next;
            }
        }

        // 6. Billing
        let water_rate = self.tariff.water_rate;
        for (idx, consumer) in self.plant.consumers.iter_mut().enumerate() {
            let liters = draws.get(idx).map_or(0.0, |d| d.liters);
            consumer.account.record(liters, water_rate);
        }

        // 7. Power
        let total_flow_lpm: f64 = self.plant.consumers.iter().map(|c| c.flow_rate_lpm).sum();
        let pump_draws = self.plant.pumps.iter().enumerate().map(|(idx, p)| {
            (
                p.is_on,
                non_negative(frame.pump_kw.get(idx).copied().unwrap_or(0.0)),
            )
        });
        let kw = power_kw(
            non_negative(frame.base_kw),
            pump_draws,
            total_flow_lpm,
            self.power_model.flow_coefficient_kw_per_lpm,
        );
        self.power = PowerReading::priced(kw, &self.tariff);

        self.tick += 1;
        let snapshot = self.snapshot();
        debug!(
            tick = snapshot.tick,
            flow_lpm = snapshot.total_flow_lpm,
            power_kw = snapshot.power.total_kw,
            bill = snapshot.total_bill,
            "tick complete"
        );
        snapshot
    }

    /// Runs `ticks` ticks and returns every snapshot in order.
    pub fn run(&mut self, ticks: u64) -> Vec<Snapshot> {
        let mut snapshots = Vec::new();
        for _ in 0..ticks {
            snapshots.push(self.tick());
        }
        snapshots
    }

    /// Builds a snapshot of the current state without advancing time.
    pub fn snapshot(&self) -> Snapshot {
        let tanks = &self.plant.tanks;
        let consumers: Vec<ConsumerSnapshot> = self
            .plant
            .consumers
            .iter()
            .map(|c| ConsumerSnapshot {
                id: c.id.clone(),
                flow_rate_lpm: c.flow_rate_lpm,
                daily_usage_liters: c.daily_usage_liters(),
                monthly_usage_liters: c.monthly_usage_liters,
                current_bill: c.current_bill(),
            })
            .collect();

        Snapshot {
            tick: self.tick,
            elapsed_s: self.tick as f64 * self.config.tick_ms as f64 / 1000.0,
            mode: self.mode,
            tanks: tanks
                .iter()
                .map(|t| TankSnapshot {
                    id: t.id.clone(),
                    capacity_liters: t.capacity_liters,
                    level_percent: t.level_percent(),
                    liters: t.liters(),
                })
                .collect(),
            pumps: self
                .plant
                .pumps
                .iter()
                .map(|p| PumpSnapshot {
                    id: p.id.clone(),
                    feeds: tanks[p.feeds].id.clone(),
                    is_on: p.is_on,
                })
                .collect(),
            total_flow_lpm: consumers.iter().map(|c| c.flow_rate_lpm).sum(),
            total_usage_liters: consumers.iter().map(|c| c.daily_usage_liters).sum(),
            total_bill: consumers.iter().map(|c| c.current_bill).sum(),
            consumers,
            power: self.power,
        }
    }

    /// Switches the global watering mode; effective from the next tick.
    pub fn set_watering_mode(&mut self, mode: WateringMode) {
        if mode != self.mode {
            info!(from = %self.mode, to = %mode, "watering mode changed");
        }
        self.mode = mode;
    }

    /// Zeroes usage and bill for the given scope.
    ///
    /// Tank, pump and power state are left untouched. Returns the number of
    /// accounts reset; an unknown consumer id resets nothing.
    pub fn reset_billing(&mut self, scope: &BillingScope) -> usize {
        let reset = match scope {
            BillingScope::All => {
                for consumer in &mut self.plant.consumers {
                    consumer.account.reset();
                }
                self.plant.consumers.len()
            }
            BillingScope::Consumer(id) => match self.plant.consumer_index(id) {
                Some(idx) => {
                    self.plant.consumers[idx].account.reset();
                    1
                }
                None => {
                    warn!(consumer = %id, "billing reset for unknown consumer ignored");
                    0
                }
            },
        };
        if reset > 0 {
            info!(?scope, accounts = reset, "billing reset");
        }
        reset
    }

    /// Applies a control command immediately.
    pub fn apply(&mut self, command: &Command) {
        match command {
            Command::SetWateringMode(mode) => self.set_watering_mode(*mode),
            Command::ResetBilling(scope) => {
                self.reset_billing(scope);
            }
        }
    }

    /// Current watering mode.
    pub fn watering_mode(&self) -> WateringMode {
        self.mode
    }

    /// Number of ticks completed.
    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Returns a reference to the plant.
    pub fn plant(&self) -> &Plant {
        &self.plant
    }

    /// Returns a reference to the simulation configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Mutable access to the sensor, e.g. to swap a fixed frame in tests.
    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::{Band, Consumer, Pump, Tank, TankRole};
    use crate::sensor::{FixedSensor, SensorFrame};
    use crate::sim::controller::Hysteresis;

    fn single_tank_plant(level: f64) -> Plant {
        Plant {
            tanks: vec![Tank::new("main", 1000.0, level, TankRole::Distribution, 0.0)],
            pumps: vec![Pump::new(
                "motor",
                0,
                None,
                Hysteresis::new(30.0, 90.0),
                Band::new(120.0, 360.0),
                Band::new(2.5, 4.0),
                false,
            )],
            consumers: vec![Consumer::new("main", 0, Band::new(0.0, 50.0), 1200.0)],
            base_kw: Band::new(0.1, 0.3),
        }
    }

    fn frame(feed: f64, flow: f64) -> SensorFrame {
        SensorFrame {
            feed_lpm: vec![feed],
            consumer_lpm: vec![flow],
            pump_kw: vec![3.0],
            base_kw: 0.2,
        }
    }

    fn engine(level: f64, feed: f64, flow: f64) -> Engine<FixedSensor> {
        Engine::new(
            SimConfig::new(1000, 0),
            single_tank_plant(level),
            Tariff {
                water_rate: 0.05,
                power_rate: 0.12,
            },
            PowerModel {
                flow_coefficient_kw_per_lpm: 0.0,
            },
            WateringMode::Auto,
            FixedSensor::new(frame(feed, flow)),
        )
    }

    #[test]
    fn pump_turns_on_after_tick_below_threshold() {
        let mut e = engine(25.0, 300.0, 0.0);
        let snap = e.tick();
        assert!(snap.pumps[0].is_on);
        // Pump was off during this tick, so no inflow yet.
        assert_eq!(snap.tanks[0].level_percent, 25.0);
    }

    #[test]
    fn running_pump_fills_tank() {
        let mut e = engine(25.0, 600.0, 0.0);
        e.tick();
        let snap = e.tick();
        // 600 L/min for 1 s = 10 L = 1% of 1000 L
        assert!((snap.tanks[0].level_percent - 26.0).abs() < 1e-9);
    }

    #[test]
    fn consumption_drains_tank_and_bills() {
        let mut e = engine(50.0, 0.0, 60.0);
        let snap = e.tick();
        assert!((snap.tanks[0].liters - 499.0).abs() < 1e-9);
        assert!((snap.consumers[0].daily_usage_liters - 1.0).abs() < 1e-12);
        assert!((snap.consumers[0].current_bill - 0.05).abs() < 1e-12);
    }

    #[test]
    fn off_mode_zeroes_flow() {
        let mut e = engine(50.0, 0.0, 40.0);
        e.set_watering_mode(WateringMode::Off);
        let snap = e.tick();
        assert_eq!(snap.consumers[0].flow_rate_lpm, 0.0);
        assert_eq!(snap.consumers[0].daily_usage_liters, 0.0);
        assert_eq!(snap.tanks[0].level_percent, 50.0);
    }

    #[test]
    fn power_includes_running_pump() {
        let mut e = engine(25.0, 300.0, 0.0);
        let snap = e.tick();
        assert!((snap.power.total_kw - 3.2).abs() < 1e-9);
        assert!((snap.power.cost_per_hour - 3.2 * 0.12).abs() < 1e-9);
    }

    #[test]
    fn reset_billing_leaves_physical_state() {
        let mut e = engine(50.0, 0.0, 30.0);
        e.run(10);
        let before = e.snapshot();
        assert_eq!(e.reset_billing(&BillingScope::All), 1);
        let after = e.snapshot();
        assert_eq!(after.total_bill, 0.0);
        assert_eq!(after.consumers[0].daily_usage_liters, 0.0);
        assert_eq!(after.tanks, before.tanks);
        assert_eq!(after.pumps, before.pumps);
        assert_eq!(after.power, before.power);
    }

    #[test]
    fn reset_unknown_consumer_is_noop() {
        let mut e = engine(50.0, 0.0, 30.0);
        e.tick();
        let bill = e.snapshot().total_bill;
        assert_eq!(e.reset_billing(&BillingScope::Consumer("nobody".into())), 0);
        assert_eq!(e.snapshot().total_bill, bill);
    }

    #[test]
    fn short_frame_reads_missing_channels_as_zero() {
        let mut e = engine(50.0, 0.0, 0.0);
        e.sensor_mut().set_frame(SensorFrame::default());
        let snap = e.tick();
        assert_eq!(snap.total_flow_lpm, 0.0);
        assert_eq!(snap.tanks[0].level_percent, 50.0);
    }

    #[test]
    fn transfer_stops_at_free_space_in_full_tank() {
        let mut e = engine(99.5, 600.0, 0.0);
        e.plant.pumps[0].is_on = true;
        e.plant.pumps[0].control = Hysteresis::new(30.0, 100.0);
        let snap = e.tick();
        assert_eq!(snap.tanks[0].level_percent, 100.0);
        assert!(snap.pumps[0].is_on);
    }

    #[test]
    #[should_panic(expected = "invalid plant wiring")]
    fn new_rejects_out_of_range_tank_index() {
        let mut plant = single_tank_plant(50.0);
        plant.consumers[0].supplied_by = 3;
        Engine::new(
            SimConfig::new(1000, 0),
            plant,
            Tariff {
                water_rate: 0.05,
                power_rate: 0.12,
            },
            PowerModel {
                flow_coefficient_kw_per_lpm: 0.0,
            },
            WateringMode::Auto,
            FixedSensor::new(frame(0.0, 0.0)),
        );
    }

    #[test]
    fn elapsed_time_follows_tick_period() {
        let mut e = engine(50.0, 0.0, 0.0);
        e.run(5);
        let snap = e.snapshot();
        assert_eq!(snap.tick, 5);
        assert_eq!(snap.elapsed_s, 5.0);
    }
}
