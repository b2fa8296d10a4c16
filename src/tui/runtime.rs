//! Simulation runner and TUI application state.

use std::collections::VecDeque;
use std::time::Instant;

use tracing::warn;

use crate::config::{ConfigError, ScenarioConfig};
use crate::sensor::UniformSensor;
use crate::sim::billing::BillingScope;
use crate::sim::command::Command;
use crate::sim::engine::Engine;
use crate::sim::types::{Snapshot, WateringMode};

/// Maximum number of history entries kept for the power chart.
const MAX_HISTORY: usize = 200;

/// Tick interval options in milliseconds (slowest → fastest).
const SPEED_LEVELS_MS: [u64; 6] = [2000, 1000, 500, 250, 100, 20];

/// Default speed index (1000 ms, real time for the presets).
const DEFAULT_SPEED_IDX: usize = 1;

/// TUI application state.
pub struct App {
    engine: Engine<UniformSensor>,
    /// Current scenario configuration (kept for restart).
    scenario: ScenarioConfig,
    /// Snapshot after the latest tick or command.
    pub latest: Snapshot,
    /// Rolling history of snapshots for the power chart.
    pub history: VecDeque<Snapshot>,
    /// Whether the simulation is paused.
    pub paused: bool,
    /// Current index into `SPEED_LEVELS_MS`.
    pub speed_idx: usize,
    /// Whether the user has requested quit.
    pub quit: bool,
    /// When the last simulation tick was executed.
    pub last_tick: Instant,
    /// Name of the active scenario.
    pub scenario_name: String,
}

impl App {
    /// Creates a new app running `scenario`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the scenario is invalid.
    pub fn new(scenario: ScenarioConfig, name: &str) -> Result<Self, ConfigError> {
        let engine = scenario.engine()?;
        let latest = engine.snapshot();
        Ok(Self {
            engine,
            scenario,
            latest,
            history: VecDeque::with_capacity(MAX_HISTORY),
            paused: false,
            speed_idx: DEFAULT_SPEED_IDX,
            quit: false,
            last_tick: Instant::now(),
            scenario_name: name.to_string(),
        })
    }

    /// Advances the simulation by one tick.
    pub fn tick(&mut self) {
        let snapshot = self.engine.tick();
        if self.history.len() >= MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(snapshot.clone());
        self.latest = snapshot;
    }

    fn apply(&mut self, command: Command) {
        self.engine.apply(&command);
        self.latest = self.engine.snapshot();
    }

    /// Switches the watering mode.
    pub fn set_mode(&mut self, mode: WateringMode) {
        self.apply(Command::SetWateringMode(mode));
    }

    /// Resets every billing account.
    pub fn reset_billing(&mut self) {
        self.apply(Command::ResetBilling(BillingScope::All));
    }

    /// Toggles pause/resume.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Increases simulation speed (shorter tick interval).
    pub fn speed_up(&mut self) {
        if self.speed_idx + 1 < SPEED_LEVELS_MS.len() {
            self.speed_idx += 1;
        }
    }

    /// Decreases simulation speed (longer tick interval).
    pub fn speed_down(&mut self) {
        if self.speed_idx > 0 {
            self.speed_idx -= 1;
        }
    }

    /// Returns the current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        SPEED_LEVELS_MS[self.speed_idx]
    }

    /// Switches to a different preset, resetting simulation state.
    pub fn switch_preset(&mut self, name: &str) {
        let Ok(scenario) = ScenarioConfig::from_preset(name) else {
            return;
        };
        self.load(scenario, name);
    }

    /// Restarts the current scenario from its initial state.
    pub fn restart(&mut self) {
        let scenario = self.scenario.clone();
        let name = self.scenario_name.clone();
        self.load(scenario, &name);
    }

    fn load(&mut self, scenario: ScenarioConfig, name: &str) {
        let engine = match scenario.engine() {
            Ok(engine) => engine,
            Err(err) => {
                warn!(%err, scenario = name, "cannot load scenario");
                return;
            }
        };
        self.latest = engine.snapshot();
        self.engine = engine;
        self.scenario = scenario;
        self.history.clear();
        self.paused = false;
        self.scenario_name = name.to_string();
    }

    /// Underlying engine, for static plant details.
    pub fn engine(&self) -> &Engine<UniformSensor> {
        &self.engine
    }
}
