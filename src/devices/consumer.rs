use crate::sim::billing::BillingAccount;

use super::types::Band;

/// A metered downstream water user (a house or a single outlet).
#[derive(Debug, Clone)]
pub struct Consumer {
    /// Consumer identifier.
    pub id: String,
    /// Index of the tank supplying this consumer.
    pub supplied_by: usize,
    /// Range of sampled flow rates (L/min).
    pub flow_band: Band,
    /// Flow rate applied on the most recent tick (L/min, >= 0).
    pub flow_rate_lpm: f64,
    /// Static reference figure for the month (liters).
    pub monthly_usage_liters: f64,
    /// Running usage and bill since the last reset.
    pub account: BillingAccount,
}

impl Consumer {
    /// Creates an idle consumer with an empty billing account.
    pub fn new(
        id: impl Into<String>,
        supplied_by: usize,
        flow_band: Band,
        monthly_usage_liters: f64,
    ) -> Self {
        Self {
            id: id.into(),
            supplied_by,
            flow_band,
            flow_rate_lpm: 0.0,
            monthly_usage_liters,
            account: BillingAccount::default(),
        }
    }

    /// Liters used since the last billing reset.
    pub fn daily_usage_liters(&self) -> f64 {
        self.account.usage_liters
    }

    /// Water bill accumulated since the last reset.
    pub fn current_bill(&self) -> f64 {
        self.account.bill
    }
}
