//! Configuration for the generation collaborators.
//!
//! Deserialized from the `generator` section of the application config.
//! Provider credentials usually come from the environment instead of the
//! file; see [`GeneratorConfig::apply_env_overrides`].

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::GeneratorError;
use crate::rarity::RarityWeights;

/// Which collaborator to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// OpenAI-compatible HTTP provider.
    Llm,
    /// Local generator, no network.
    #[default]
    Offline,
}

/// Top-level generator configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Collaborator to use.
    pub backend: BackendKind,
    /// Odds of each rarity tier.
    pub rarity_weights: RarityWeights,
    /// Provider settings, used when `backend` is `llm`.
    pub llm: LlmConfig,
    /// Offline settings, used when `backend` is `offline`.
    pub offline: OfflineConfig,
}

/// Settings for an OpenAI-compatible provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// Bearer token. Empty means no `Authorization` header.
    pub api_key: String,
    /// Chat model that writes the name and description.
    pub model: String,
    /// Image model that draws the artwork.
    pub image_model: String,
    /// Requested image size, e.g. `1024x1024`.
    pub image_size: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Optional theme passed to the prompt.
    pub theme: Option<String>,
    /// Directory with `system.j2` and `entity.j2` overriding the built-in
    /// templates.
    pub templates_dir: Option<PathBuf>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: String::from("https://api.openai.com/v1"),
            api_key: String::new(),
            model: String::from("gpt-4o-mini"),
            image_model: String::from("dall-e-3"),
            image_size: String::from("1024x1024"),
            timeout_secs: 60,
            theme: None,
            templates_dir: None,
        }
    }
}

impl LlmConfig {
    /// Per-request timeout.
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for the offline generator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Fixed seed for reproducible output. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Base URL for placeholder artwork; the entity name is appended.
    pub image_base_url: String,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            image_base_url: String::from("https://placehold.co/512x512?text="),
        }
    }
}

impl GeneratorConfig {
    /// Override provider settings from the environment.
    ///
    /// Recognized variables: `LLM_API_URL`, `LLM_API_KEY`, `LLM_MODEL`,
    /// `LLM_IMAGE_MODEL`. Setting `LLM_API_KEY` also selects the `llm`
    /// backend.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("LLM_API_URL") {
            self.llm.api_url = url;
        }
        if let Some(key) = lookup("LLM_API_KEY") {
            self.llm.api_key = key;
            self.backend = BackendKind::Llm;
        }
        if let Some(model) = lookup("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(model) = lookup("LLM_IMAGE_MODEL") {
            self.llm.image_model = model;
        }
    }

    /// Check that the selected backend has what it needs.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Config`] if the weights are all zero, or
    /// the `llm` backend lacks a URL or model names.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.rarity_weights.total() == 0 {
            return Err(GeneratorError::Config(
                "rarity_weights must not all be zero".to_owned(),
            ));
        }
        if self.backend == BackendKind::Llm {
            let required = [
                ("llm.api_url", &self.llm.api_url),
                ("llm.model", &self.llm.model),
                ("llm.image_model", &self.llm.image_model),
            ];
            for (name, value) in required {
                if value.trim().is_empty() {
                    return Err(GeneratorError::Config(format!("{name} must be set")));
                }
            }
        }
        Ok(())
    }
}
