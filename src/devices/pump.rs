use crate::sim::controller::Hysteresis;

use super::types::Band;

/// A pump lifting water into one tank.
///
/// Indices refer to positions in the owning plant's tank list. A pump with a
/// `source` draws from that upstream tank; one without draws from an
/// unlimited external supply (mains or borewell).
#[derive(Debug, Clone)]
pub struct Pump {
    /// Pump identifier.
    pub id: String,
    /// Index of the tank this pump fills.
    pub feeds: usize,
    /// Index of the upstream tank this pump draws from, if any.
    pub source: Option<usize>,
    /// On/off thresholds governing this pump.
    pub control: Hysteresis,
    /// Delivery rate range while running (L/min).
    pub delivery_lpm: Band,
    /// Electrical draw range while running (kW).
    pub draw_kw: Band,
    /// Whether the pump is currently running.
    pub is_on: bool,
}

impl Pump {
    /// Creates a pump in the given initial state.
    ///
    /// # Panics
    ///
    /// Panics if `source` equals `feeds`.
    pub fn new(
        id: impl Into<String>,
        feeds: usize,
        source: Option<usize>,
        control: Hysteresis,
        delivery_lpm: Band,
        draw_kw: Band,
        is_on: bool,
    ) -> Self {
        assert!(source != Some(feeds), "a pump cannot draw from the tank it feeds");

        Self {
            id: id.into(),
            feeds,
            source,
            control,
            delivery_lpm,
            draw_kw,
            is_on,
        }
    }

    /// Human-readable run state.
    pub fn status_label(&self) -> &'static str {
        if self.is_on { "ACTIVE" } else { "STANDBY" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn control() -> Hysteresis {
        Hysteresis::new(30.0, 90.0)
    }

    #[test]
    fn status_label_tracks_state() {
        let mut pump = Pump::new("motor", 0, None, control(), Band::fixed(300.0), Band::fixed(3.0), false);
        assert_eq!(pump.status_label(), "STANDBY");
        pump.is_on = true;
        assert_eq!(pump.status_label(), "ACTIVE");
    }

    #[test]
    #[should_panic]
    fn self_sourcing_pump_panics() {
        Pump::new("p", 1, Some(1), control(), Band::fixed(1.0), Band::fixed(1.0), false);
    }
}
