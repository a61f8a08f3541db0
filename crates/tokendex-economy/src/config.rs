//! Economy configuration.

use serde::Deserialize;

use crate::EconomyError;
use crate::pricing::{CREATION_COST, INITIAL_BALANCE};

/// Tunable economy parameters.
///
/// Deserializes from the `economy` section of the application config;
/// missing fields take the built-in defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Balance granted when no balance record exists yet.
    pub initial_balance: i64,
    /// Tokens debited per creation.
    pub creation_cost: i64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            initial_balance: INITIAL_BALANCE,
            creation_cost: CREATION_COST,
        }
    }
}

impl EconomyConfig {
    /// Set the initial balance.
    #[must_use]
    pub const fn with_initial_balance(mut self, amount: i64) -> Self {
        self.initial_balance = amount;
        self
    }

    /// Set the creation cost.
    #[must_use]
    pub const fn with_creation_cost(mut self, cost: i64) -> Self {
        self.creation_cost = cost;
        self
    }

    /// Check that the values are usable.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidConfig`] if the creation cost is not
    /// positive or the initial balance is negative.
    pub fn validate(&self) -> Result<(), EconomyError> {
        if self.creation_cost <= 0 {
            return Err(EconomyError::InvalidConfig(format!(
                "creation_cost must be positive, got {}",
                self.creation_cost
            )));
        }
        if self.initial_balance < 0 {
            return Err(EconomyError::InvalidConfig(format!(
                "initial_balance must not be negative, got {}",
                self.initial_balance
            )));
        }
        Ok(())
    }
}
