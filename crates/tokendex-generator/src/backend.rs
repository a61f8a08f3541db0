//! Backend selection.
//!
//! Enum dispatch over the concrete generators, so the economy controller
//! can be monomorphized over one type whatever the configuration picks.

use tokendex_economy::{EntityGenerator, GenerationError};
use tokendex_types::GeneratedEntity;

use crate::config::{BackendKind, GeneratorConfig};
use crate::error::GeneratorError;
use crate::llm::LlmGenerator;
use crate::offline::OfflineGenerator;

/// A configured generation collaborator.
#[derive(Debug)]
pub enum GeneratorBackend {
    /// OpenAI-compatible provider.
    Llm(Box<LlmGenerator>),
    /// Local generator.
    Offline(OfflineGenerator),
}

impl GeneratorBackend {
    /// Build the backend selected by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Config`] for an invalid configuration, or
    /// [`GeneratorError::Template`] if the LLM prompt templates fail to load.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self, GeneratorError> {
        config.validate()?;
        let backend = match config.backend {
            BackendKind::Llm => Self::Llm(Box::new(LlmGenerator::new(
                config.llm.clone(),
                config.rarity_weights.clone(),
            )?)),
            BackendKind::Offline => Self::Offline(OfflineGenerator::new(
                &config.offline,
                config.rarity_weights.clone(),
            )),
        };
        tracing::info!(backend = backend.name(), "Generator ready");
        Ok(backend)
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Llm(_) => "llm",
            Self::Offline(_) => "offline",
        }
    }
}

impl EntityGenerator for GeneratorBackend {
    async fn generate(&self) -> Result<GeneratedEntity, GenerationError> {
        let result = match self {
            Self::Llm(llm) => llm.generate_entity().await,
            Self::Offline(offline) => offline.generate_entity(),
        };
        result.map_err(|e| {
            tracing::warn!(backend = self.name(), error = %e, "Generation failed");
            GenerationError::from(e)
        })
    }
}
