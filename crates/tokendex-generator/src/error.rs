//! Error types for the generation collaborators.

use tokendex_economy::GenerationError;

/// Errors that can occur while generating an entity.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// A prompt template could not be loaded or rendered.
    #[error("template error: {0}")]
    Template(String),

    /// The provider was unreachable or returned an error.
    #[error("provider error: {0}")]
    Provider(String),

    /// The provider's reply could not be turned into an entity.
    #[error("response parse error: {0}")]
    Parse(String),

    /// Configuration is invalid or incomplete.
    #[error("config error: {0}")]
    Config(String),
}

impl From<GeneratorError> for GenerationError {
    fn from(err: GeneratorError) -> Self {
        Self::new(err.to_string())
    }
}
