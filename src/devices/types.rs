//! Common types shared by the water-network devices.

use std::fmt;

use rand::{Rng, rngs::StdRng};
use serde::{Deserialize, Serialize};

/// Closed range `[min, max]` used for uniformly distributed sensor readings.
///
/// # Examples
///
/// ```
/// use aquaflow_sim::devices::types::Band;
///
/// let band = Band::new(0.0, 50.0);
/// assert!(band.contains(25.0));
/// assert!(!Band::fixed(3.5).contains(4.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Band {
    /// Lower bound (inclusive).
    pub min: f64,
    /// Upper bound (inclusive).
    pub max: f64,
}

impl Band {
    /// Creates a band spanning `[min, max]`.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Creates a degenerate band that always yields `value`.
    pub fn fixed(value: f64) -> Self {
        Self {
            min: value,
            max: value,
        }
    }

    /// Returns `true` when `value` lies inside the band.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Returns `true` when both bounds are finite, non-negative and ordered.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min >= 0.0 && self.min <= self.max
    }

    /// Draws a uniform sample from the band.
    ///
    /// Degenerate or inverted bands return `min` without consuming randomness.
    pub fn sample(&self, rng: &mut StdRng) -> f64 {
        if self.max <= self.min {
            return self.min;
        }
        rng.random_range(self.min..self.max)
    }
}

/// Role of a tank within the supply network.
///
/// Source tanks lose water through a constant passive drain and through
/// pumps that lift water out of them. Distribution tanks lose water to the
/// consumers they supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TankRole {
    /// Reservoir feeding other tanks (e.g. an underground sump).
    Source,
    /// Tank feeding consumers directly (e.g. an overhead tank).
    Distribution,
}

impl fmt::Display for TankRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Distribution => write!(f, "distribution"),
        }
    }
}

/// Clamps a fill percentage into `[0, 100]`, mapping NaN to 0.
pub fn clamp_percent(level: f64) -> f64 {
    if level.is_nan() {
        return 0.0;
    }
    level.clamp(0.0, 100.0)
}

/// Replaces negative or non-finite readings with zero.
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}
