//! Usage metering and tariffs.

use serde::{Deserialize, Serialize};

/// Prices applied to water usage and power draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    /// Currency per liter of water delivered.
    pub water_rate: f64,
    /// Currency per kWh of electricity drawn.
    pub power_rate: f64,
}

impl Tariff {
    /// Instantaneous power cost in currency per hour for a draw of `kw`.
    pub fn power_cost_per_hour(&self, kw: f64) -> f64 {
        kw * self.power_rate
    }
}

/// Running usage and water bill for one consumer.
///
/// Only water is billed here. Power cost is reported separately as a rate
/// and is never added to `bill`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BillingAccount {
    /// Liters delivered since the last reset.
    pub usage_liters: f64,
    /// Accumulated water cost since the last reset.
    pub bill: f64,
}

impl BillingAccount {
    /// Records a delivery of `liters` at `water_rate` per liter.
    ///
    /// Negative deliveries are ignored so the bill never decreases.
    pub fn record(&mut self, liters: f64, water_rate: f64) {
        if liters.is_nan() || liters <= 0.0 {
            return;
        }
        self.usage_liters += liters;
        self.bill += liters * water_rate.max(0.0);
    }

    /// Zeroes usage and bill.
    pub fn reset(&mut self) {
        self.usage_liters = 0.0;
        self.bill = 0.0;
    }
}

/// Target of a billing reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingScope {
    /// Every consumer account.
    All,
    /// A single consumer by id.
    Consumer(String),
}
