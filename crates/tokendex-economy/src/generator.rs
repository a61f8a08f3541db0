//! Generation collaborator contract.
//!
//! The controller asks an [`EntityGenerator`] for a new entity payload
//! during the acquire step of creation. Implementations may take
//! arbitrarily long and may fail for any reason; the controller does not
//! retry and does not cancel an in-flight call.

use std::future::Future;

use tokendex_types::GeneratedEntity;

/// A generation collaborator failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GenerationError {
    /// Human-readable description, surfaced to the user.
    pub message: String,
}

impl GenerationError {
    /// Create an error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A source of freshly generated entities.
///
/// The payload carries no id or timestamp; the controller stamps
/// `created_at` and the store assigns the id.
pub trait EntityGenerator: Send + Sync {
    /// Produce one entity payload.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] with a user-presentable message if the
    /// payload cannot be produced.
    fn generate(&self) -> impl Future<Output = Result<GeneratedEntity, GenerationError>> + Send;
}
