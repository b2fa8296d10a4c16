//! Two-threshold pump controller.

use serde::Serialize;

/// Hysteresis on/off controller for one pump.
///
/// A stopped pump starts once its tank drops below `on_below` (and, when
/// gated, the upstream source is above `min_source`). A running pump stops
/// once its tank rises above `off_above`. Anywhere in between the previous
/// state holds, which keeps the pump from chattering around one threshold.
///
/// # Examples
///
/// ```
/// use aquaflow_sim::sim::controller::Hysteresis;
///
/// let control = Hysteresis::new(30.0, 90.0);
/// let states = control.run_sequence(false, &[25.0, 50.0, 91.0, 50.0]);
/// assert_eq!(states, vec![true, true, false, false]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Hysteresis {
    /// Level (%) below which a stopped pump starts.
    pub on_below: f64,
    /// Level (%) above which a running pump stops.
    pub off_above: f64,
    /// Minimum upstream level (%) required to start, if gated.
    pub min_source: Option<f64>,
}

impl Hysteresis {
    /// Creates an ungated controller.
    ///
    /// # Panics
    ///
    /// Panics if `on_below >= off_above`.
    pub fn new(on_below: f64, off_above: f64) -> Self {
        assert!(on_below < off_above, "on_below must be < off_above");
        Self {
            on_below,
            off_above,
            min_source: None,
        }
    }

    /// Adds an upstream gate: the pump may only start while the source tank
    /// is above `min_source` percent.
    pub fn with_source_gate(mut self, min_source: f64) -> Self {
        self.min_source = Some(min_source);
        self
    }

    /// Computes the next pump state from the current one.
    ///
    /// `source_level` is the upstream tank level; it is ignored for ungated
    /// controllers. A gated controller with no reading never starts.
    pub fn next_state(&self, is_on: bool, level: f64, source_level: Option<f64>) -> bool {
        if is_on {
            return level <= self.off_above;
        }
        if level >= self.on_below {
            return false;
        }
        match (self.min_source, source_level) {
            (None, _) => true,
            (Some(min), Some(source)) => source > min,
            (Some(_), None) => false,
        }
    }

    /// Replays a level sequence and returns the state after each level.
    ///
    /// No source reading is supplied, so a gated controller never starts
    /// here; use [`Hysteresis::run_gated_sequence`] for gated pumps.
    pub fn run_sequence(&self, initial: bool, levels: &[f64]) -> Vec<bool> {
        let mut state = initial;
        levels
            .iter()
            .map(|&level| {
                state = self.next_state(state, level, None);
                state
            })
            .collect()
    }

    /// Replays `(level, source_level)` pairs and returns the state after each.
    pub fn run_gated_sequence(&self, initial: bool, readings: &[(f64, f64)]) -> Vec<bool> {
        let mut state = initial;
        readings
            .iter()
            .map(|&(level, source)| {
                state = self.next_state(state, level, Some(source));
                state
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Hysteresis;

    #[test]
    fn starts_below_low_threshold() {
        let control = Hysteresis::new(30.0, 90.0);
        assert!(control.next_state(false, 25.0, None));
        assert!(!control.next_state(false, 30.0, None));
    }

    #[test]
    fn stops_above_high_threshold() {
        let control = Hysteresis::new(30.0, 90.0);
        assert!(!control.next_state(true, 91.0, None));
        assert!(control.next_state(true, 90.0, None));
    }

    #[test]
    fn holds_inside_band() {
        let control = Hysteresis::new(30.0, 90.0);
        for level in [30.0, 45.0, 60.0, 89.9, 90.0] {
            assert!(control.next_state(true, level, None));
            assert!(!control.next_state(false, level, None));
        }
    }

    #[test]
    fn level_sequence_scenario() {
        let control = Hysteresis::new(30.0, 90.0);
        let levels = [25.0, 40.0, 70.0, 91.0, 80.0, 35.0, 29.0];
        let states = control.run_sequence(false, &levels);
        assert_eq!(states, vec![true, true, true, false, false, false, true]);
    }

    #[test]
    fn source_gate_blocks_start() {
        let control = Hysteresis::new(30.0, 85.0).with_source_gate(40.0);
        assert!(!control.next_state(false, 20.0, Some(40.0)));
        assert!(!control.next_state(false, 20.0, None));
        assert!(control.next_state(false, 20.0, Some(41.0)));
    }

    #[test]
    fn gated_sequence_waits_for_source() {
        let control = Hysteresis::new(30.0, 85.0).with_source_gate(40.0);
        let readings = [(20.0, 35.0), (19.0, 38.0), (18.0, 45.0), (60.0, 10.0), (86.0, 50.0)];
        let states = control.run_gated_sequence(false, &readings);
        assert_eq!(states, vec![false, false, true, true, false]);
        // Without source readings the gate never opens.
        assert_eq!(control.run_sequence(false, &[20.0, 10.0]), vec![false, false]);
    }

    #[test]
    fn source_gate_does_not_stop_running_pump() {
        let control = Hysteresis::new(30.0, 85.0).with_source_gate(40.0);
        assert!(control.next_state(true, 50.0, Some(10.0)));
    }

    #[test]
    #[should_panic]
    fn inverted_thresholds_panic() {
        Hysteresis::new(90.0, 30.0);
    }
}
