//! Control commands accepted by the engine between ticks.

use std::fmt;

use super::billing::BillingScope;
use super::types::WateringMode;

/// A discrete user command.
///
/// Commands mutate engine state immediately and are visible from the next
/// snapshot on; they never interrupt a tick in progress.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Switches the global watering mode.
    SetWateringMode(WateringMode),
    /// Zeroes usage and bill for the given scope.
    ResetBilling(BillingScope),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetWateringMode(mode) => write!(f, "set watering mode {mode}"),
            Self::ResetBilling(BillingScope::All) => write!(f, "reset billing (all)"),
            Self::ResetBilling(BillingScope::Consumer(id)) => write!(f, "reset billing ({id})"),
        }
    }
}
