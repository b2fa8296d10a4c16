use super::types::{TankRole, clamp_percent, non_negative};

/// A water reservoir with bounded fill level.
///
/// The level is stored as a percentage of `capacity_liters` and is clamped
/// to `[0, 100]` on every update, so it can never leave that range.
///
/// # Examples
///
/// ```
/// use aquaflow_sim::devices::tank::Tank;
/// use aquaflow_sim::devices::types::TankRole;
///
/// let mut tank = Tank::new("main", 1000.0, 45.0, TankRole::Distribution, 0.0);
/// assert_eq!(tank.liters(), 450.0);
///
/// tank.apply_flow(100.0, 0.0);
/// assert_eq!(tank.level_percent(), 55.0);
/// ```
#[derive(Debug, Clone)]
pub struct Tank {
    /// Tank identifier.
    pub id: String,
    /// Total volume in liters.
    pub capacity_liters: f64,
    /// Role of the tank in the network.
    pub role: TankRole,
    /// Constant drain applied to source tanks (L/min).
    pub passive_drain_lpm: f64,
    level_percent: f64,
}

impl Tank {
    /// Creates a new tank.
    ///
    /// The initial level is clamped into `[0, 100]`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity_liters` is not strictly positive or the passive
    /// drain is negative.
    pub fn new(
        id: impl Into<String>,
        capacity_liters: f64,
        initial_level_percent: f64,
        role: TankRole,
        passive_drain_lpm: f64,
    ) -> Self {
        assert!(capacity_liters > 0.0, "capacity_liters must be > 0");
        assert!(passive_drain_lpm >= 0.0, "passive_drain_lpm must be >= 0");

        Self {
            id: id.into(),
            capacity_liters,
            role,
            passive_drain_lpm,
            level_percent: clamp_percent(initial_level_percent),
        }
    }

    /// Current fill level in percent.
    pub fn level_percent(&self) -> f64 {
        self.level_percent
    }

    /// Current volume in liters.
    pub fn liters(&self) -> f64 {
        self.level_percent / 100.0 * self.capacity_liters
    }

    /// Passive drain volume for one tick (liters). Zero for distribution tanks.
    pub fn passive_drain_liters(&self, tick_minutes: f64) -> f64 {
        match self.role {
            TankRole::Source => self.passive_drain_lpm * tick_minutes,
            TankRole::Distribution => 0.0,
        }
    }

    /// Applies inflow then outflow (both in liters) and clamps the result.
    ///
    /// Returns the new level in percent.
    pub fn apply_flow(&mut self, inflow_liters: f64, outflow_liters: f64) -> f64 {
        let net = non_negative(inflow_liters) - non_negative(outflow_liters);
        let next = self.level_percent + net / self.capacity_liters * 100.0;
        self.level_percent = clamp_percent(next);
        self.level_percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_level_is_clamped() {
        let high = Tank::new("t", 100.0, 140.0, TankRole::Distribution, 0.0);
        assert_eq!(high.level_percent(), 100.0);
        let low = Tank::new("t", 100.0, -5.0, TankRole::Distribution, 0.0);
        assert_eq!(low.level_percent(), 0.0);
    }

    #[test]
    #[should_panic]
    fn zero_capacity_panics() {
        Tank::new("t", 0.0, 50.0, TankRole::Source, 0.0);
    }

    #[test]
    fn overflow_clamps_to_full() {
        let mut tank = Tank::new("t", 1000.0, 95.0, TankRole::Distribution, 0.0);
        tank.apply_flow(500.0, 0.0);
        assert_eq!(tank.level_percent(), 100.0);
        assert_eq!(tank.liters(), 1000.0);
    }

    #[test]
    fn overdraw_clamps_to_empty() {
        let mut tank = Tank::new("t", 1000.0, 2.0, TankRole::Distribution, 0.0);
        tank.apply_flow(0.0, 80.0);
        assert_eq!(tank.level_percent(), 0.0);
    }

    #[test]
    fn inflow_and_outflow_net_out() {
        let mut tank = Tank::new("t", 1500.0, 50.0, TankRole::Distribution, 0.0);
        tank.apply_flow(30.0, 15.0);
        assert!((tank.level_percent() - 51.0).abs() < 1e-9);
    }

    #[test]
    fn passive_drain_only_for_source_tanks() {
        let source = Tank::new("ug", 5000.0, 60.0, TankRole::Source, 6.0);
        let dist = Tank::new("oh", 1500.0, 60.0, TankRole::Distribution, 6.0);
        assert!((source.passive_drain_liters(1.0 / 60.0) - 0.1).abs() < 1e-12);
        assert_eq!(dist.passive_drain_liters(1.0 / 60.0), 0.0);
    }
}
