//! OpenAI-compatible provider.
//!
//! One generation makes two calls against the configured base URL:
//!
//! 1. `POST {api_url}/chat/completions` -- the chat model writes a name and
//!    an art description for a locally rolled rarity.
//! 2. `POST {api_url}/images/generations` -- the image model draws the
//!    artwork; its URL (or inline base64) becomes the entity's image.
//!
//! Works with `OpenAI` and any server that mirrors its API shape. No call
//! is retried.

use tokendex_types::{GeneratedEntity, Rarity};

use crate::config::LlmConfig;
use crate::error::GeneratorError;
use crate::parse::parse_entity_reply;
use crate::prompt::{PromptEngine, RenderedPrompt};
use crate::rarity::RarityWeights;

/// Generator backed by an OpenAI-compatible HTTP API.
#[derive(Debug)]
pub struct LlmGenerator {
    client: reqwest::Client,
    config: LlmConfig,
    weights: RarityWeights,
    prompts: PromptEngine,
}

impl LlmGenerator {
    /// Build the HTTP client and load the prompt templates.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Config`] if the client cannot be built,
    /// or [`GeneratorError::Template`] if the templates fail to load.
    pub fn new(config: LlmConfig, weights: RarityWeights) -> Result<Self, GeneratorError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GeneratorError::Config(format!("failed to build HTTP client: {e}")))?;
        let prompts = PromptEngine::new(config.templates_dir.as_deref())?;

        Ok(Self {
            client,
            config,
            weights,
            prompts,
        })
    }

    /// Roll a rarity, then ask the provider for text and artwork.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError`] if either call fails or the reply cannot
    /// be parsed.
    pub async fn generate_entity(&self) -> Result<GeneratedEntity, GeneratorError> {
        let rarity = self.weights.roll(&mut rand::rng());
        self.generate_with_rarity(rarity).await
    }

    /// Generate an entity of a given rarity.
    ///
    /// # Errors
    ///
    /// See [`LlmGenerator::generate_entity`].
    pub async fn generate_with_rarity(&self, rarity: Rarity) -> Result<GeneratedEntity, GeneratorError> {
        let prompt = self.prompts.render(rarity, self.config.theme.as_deref())?;

        let reply = self.complete(&prompt).await?;
        let draft = parse_entity_reply(&reply)?;
        tracing::debug!(name = draft.name.as_str(), %rarity, "Provider named entity");

        let image_url = self.draw(&draft.prompt).await?;
        tracing::info!(
            name = draft.name.as_str(),
            %rarity,
            model = self.config.model.as_str(),
            image_model = self.config.image_model.as_str(),
            "Provider generated entity"
        );

        Ok(GeneratedEntity {
            name: draft.name,
            prompt: draft.prompt,
            image_url,
            rarity,
        })
    }

    /// Send a prompt and return the response text.
    async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, GeneratorError> {
        let url = format!("{}/chat/completions", self.config.api_url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "temperature": 0.9,
            "max_tokens": 300,
            "response_format": {"type": "json_object"}
        });

        let json = self.post_json(&url, &body, "chat").await?;
        extract_chat_content(&json)
    }

    /// Request artwork for `description` and return its URL.
    async fn draw(&self, description: &str) -> Result<String, GeneratorError> {
        let url = format!("{}/images/generations", self.config.api_url.trim_end_matches('/'));

        let body = serde_json::json!({
            "model": self.config.image_model,
            "prompt": description,
            "n": 1,
            "size": self.config.image_size
        });

        let json = self.post_json(&url, &body, "image").await?;
        extract_image_url(&json)
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        what: &str,
    ) -> Result<serde_json::Value, GeneratorError> {
        let mut request = self.client.post(url).json(body);
        if !self.config.api_key.is_empty() {
            request = request.bearer_auth(&self.config.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GeneratorError::Provider(format!("{what} request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(GeneratorError::Provider(format!(
                "{what} endpoint returned {status}: {error_body}"
            )));
        }

        response
            .json()
            .await
            .map_err(|e| GeneratorError::Provider(format!("{what} response parse failed: {e}")))
    }
}

/// Extract the text content from a chat completions response.
fn extract_chat_content(json: &serde_json::Value) -> Result<String, GeneratorError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            GeneratorError::Parse("chat response missing choices[0].message.content".to_owned())
        })
}

/// Extract the artwork URL from an image generation response.
///
/// Providers answer with either `data[0].url` or `data[0].b64_json`; the
/// latter becomes a `data:` URL.
fn extract_image_url(json: &serde_json::Value) -> Result<String, GeneratorError> {
    let first = json.get("data").and_then(|d| d.get(0));
    if let Some(url) = first
        .and_then(|d| d.get("url"))
        .and_then(serde_json::Value::as_str)
        .filter(|u| !u.is_empty())
    {
        return Ok(url.to_owned());
    }
    first
        .and_then(|d| d.get("b64_json"))
        .and_then(serde_json::Value::as_str)
        .filter(|b| !b.is_empty())
        .map(|b64| format!("data:image/png;base64,{b64}"))
        .ok_or_else(|| GeneratorError::Parse("image response missing data[0].url".to_owned()))
}
