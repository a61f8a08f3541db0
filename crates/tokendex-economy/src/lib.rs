//! Token economy for the Tokendex collection.
//!
//! The balance is the only currency in the system. It is spent to create
//! entities and earned by selling them. Creation crosses an external,
//! fallible generation step, so no single storage transaction can cover
//! it: the controller debits first, then acquires, and writes a
//! compensating credit if acquisition fails.
//!
//! # Architecture
//!
//! - [`controller`] -- The [`EconomyController`]: generation and sale state
//!   machines, edits, first-run initialization.
//! - [`pricing`] -- Fixed sale prices per rarity tier.
//! - [`generator`] -- The [`EntityGenerator`] contract for collaborators.
//! - [`collection`] -- Sort orders and collection statistics.
//! - [`config`] -- [`EconomyConfig`] (initial balance, creation cost).
//!
//! # Balance Invariant
//!
//! For every sequence of successful operations:
//!
//! ```text
//! balance == initial - sum(creation costs) + sum(sale prices)
//! ```
//!
//! Failed operations leave the balance where it was, unless the
//! compensating write itself fails. That case surfaces as
//! [`EconomyError::CompensationFailed`] and is never retried.

pub mod collection;
pub mod config;
pub mod controller;
pub mod generator;
pub mod pricing;

// Re-export primary types at crate root.
pub use collection::{CollectionStats, SortOrder, sorted};
pub use config::EconomyConfig;
pub use controller::EconomyController;
pub use generator::{EntityGenerator, GenerationError};
pub use pricing::{CREATION_COST, INITIAL_BALANCE, sell_price, sell_price_for_label};

use tokendex_db::DbError;
use tokendex_types::EntityId;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors returned by economy operations.
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    /// The balance does not cover the creation cost. Nothing was mutated.
    #[error("insufficient funds: balance {balance}, cost {cost}")]
    InsufficientFunds {
        /// Balance at the time of the attempt.
        balance: i64,
        /// Cost that could not be covered.
        cost: i64,
    },

    /// Another generation is still in flight. Nothing was mutated.
    #[error("a generation is already in progress")]
    GenerationInProgress,

    /// The generation collaborator failed or returned an unusable payload.
    #[error("generation failed: {message}")]
    GenerationFailed {
        /// Collaborator-supplied description of the failure.
        message: String,
    },

    /// A name or prompt was empty after trimming.
    #[error("invalid entity: {field} must not be empty")]
    InvalidEntity {
        /// The offending field.
        field: &'static str,
    },

    /// No entity with this id exists.
    #[error("entity {id} not found")]
    NotFound {
        /// The missing id.
        id: EntityId,
    },

    /// The configuration is out of range.
    #[error("invalid economy configuration: {0}")]
    InvalidConfig(String),

    /// A storage operation failed.
    #[error(transparent)]
    Persistence(#[from] DbError),

    /// A downstream step failed and the compensating balance write failed
    /// too, so the balance was left mutated.
    #[error("{cause}; compensating balance write failed: {compensation}")]
    CompensationFailed {
        /// The failure that triggered compensation.
        cause: Box<EconomyError>,
        /// Why the compensating write failed.
        #[source]
        compensation: DbError,
    },
}

impl EconomyError {
    /// A message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::InsufficientFunds { balance, cost } => {
                format!("Not enough tokens: creating costs {cost}, you have {balance}.")
            }
            Self::GenerationInProgress => {
                "A creation is already in progress. Please wait for it to finish.".to_owned()
            }
            Self::GenerationFailed { message } => {
                format!("Creation failed: {message}. Your tokens were refunded.")
            }
            Self::InvalidEntity { field } => format!("The {field} cannot be empty."),
            Self::NotFound { id } => format!("No entity with id {id} exists."),
            Self::InvalidConfig(reason) => format!("Configuration error: {reason}."),
            Self::Persistence(_) => {
                "Could not save your changes. Please try again.".to_owned()
            }
            Self::CompensationFailed { .. } => {
                "Something went wrong and your balance could not be restored.".to_owned()
            }
        }
    }

    /// Whether the balance may differ from its value before the failed
    /// operation.
    pub const fn balance_unreconciled(&self) -> bool {
        matches!(self, Self::CompensationFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_funds_message_names_amounts() {
        let err = EconomyError::InsufficientFunds {
            balance: 5,
            cost: 10,
        };
        assert_eq!(err.to_string(), "insufficient funds: balance 5, cost 10");
        assert!(err.user_message().contains("costs 10"));
        assert!(err.user_message().contains("have 5"));
        assert!(!err.balance_unreconciled());
    }

    #[test]
    fn generation_failure_keeps_collaborator_message() {
        let err = EconomyError::GenerationFailed {
            message: "rate limited".to_owned(),
        };
        assert!(err.user_message().contains("rate limited"));
    }

    #[test]
    fn compensation_failure_wraps_cause() {
        let err = EconomyError::CompensationFailed {
            cause: Box::new(EconomyError::GenerationFailed {
                message: "timeout".to_owned(),
            }),
            compensation: DbError::Config("closed".to_owned()),
        };
        let text = err.to_string();
        assert!(text.starts_with("generation failed: timeout"));
        assert!(text.contains("compensating balance write failed"));
        assert!(err.balance_unreconciled());
        assert!(!err.user_message().contains("timeout"));
    }
}
