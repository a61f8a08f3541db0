//! Generation collaborators for Tokendex.
//!
//! The economy controller only knows the [`EntityGenerator`] contract. This
//! crate supplies the implementations the application can be configured
//! with.
//!
//! # Architecture
//!
//! - [`backend`] -- [`GeneratorBackend`], enum dispatch over the generators.
//! - [`llm`] -- OpenAI-compatible provider (chat for text, images for art).
//! - [`offline`] -- Seedable local generator, no network.
//! - [`prompt`] -- `minijinja` prompt templates.
//! - [`parse`] -- Tolerant parsing of the chat model's JSON reply.
//! - [`rarity`] -- Weighted rarity rolls.
//! - [`config`] -- [`GeneratorConfig`] and environment overrides.
//!
//! Rarity is always rolled locally and passed to the provider as part of
//! the prompt, so a provider can never return a tier outside the table.
//!
//! [`EntityGenerator`]: tokendex_economy::EntityGenerator

pub mod backend;
pub mod config;
pub mod error;
pub mod llm;
pub mod offline;
pub mod parse;
pub mod prompt;
pub mod rarity;

pub use backend::GeneratorBackend;
pub use config::{BackendKind, GeneratorConfig, LlmConfig, OfflineConfig};
pub use error::GeneratorError;
pub use llm::LlmGenerator;
pub use offline::OfflineGenerator;
pub use rarity::RarityWeights;
