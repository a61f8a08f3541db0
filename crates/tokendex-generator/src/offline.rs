//! Offline generator.
//!
//! Builds entities from syllable tables and a placeholder image service,
//! so the app runs without a provider account. With a fixed seed the
//! sequence of entities is reproducible.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tokendex_types::{GeneratedEntity, Rarity};

use crate::config::OfflineConfig;
use crate::error::GeneratorError;
use crate::rarity::RarityWeights;

const PREFIXES: [&str; 12] = [
    "Ash", "Bram", "Cor", "Dusk", "Ember", "Fen", "Gale", "Hollow", "Ivy", "Moss", "Tide", "Wisp",
];
const SUFFIXES: [&str; 10] = [
    "ling", "paw", "fin", "wing", "horn", "tail", "scale", "shade", "sprout", "fang",
];
const BODIES: [&str; 8] = [
    "fox", "owl", "toad", "crab", "moth", "stag", "otter", "salamander",
];
const TRAITS: [&str; 8] = [
    "glowing moss fur",
    "crystal antlers",
    "ember-tipped feathers",
    "tidal scales",
    "smoke-wreathed paws",
    "starlit eyes",
    "bark armor",
    "frosted whiskers",
];

/// Seedable local generator.
#[derive(Debug)]
pub struct OfflineGenerator {
    rng: Mutex<StdRng>,
    weights: RarityWeights,
    image_base_url: String,
}

impl OfflineGenerator {
    /// Create a generator from its config.
    pub fn new(config: &OfflineConfig, weights: RarityWeights) -> Self {
        let rng = config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        Self {
            rng: Mutex::new(rng),
            weights,
            image_base_url: config.image_base_url.clone(),
        }
    }

    /// Produce one entity.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Provider`] if the random source lock is
    /// poisoned.
    pub fn generate_entity(&self) -> Result<GeneratedEntity, GeneratorError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|e| GeneratorError::Provider(format!("random source unavailable: {e}")))?;
        let rarity = self.weights.roll(&mut *rng);
        let (name, prompt) = compose(&mut *rng, rarity);
        drop(rng);

        let image_url = format!("{}{}", self.image_base_url, name.replace(' ', "+"));
        tracing::debug!(name = name.as_str(), %rarity, "Offline generator produced entity");

        Ok(GeneratedEntity {
            name,
            prompt,
            image_url,
            rarity,
        })
    }
}

/// Compose a name and art description.
fn compose<R: Rng + ?Sized>(rng: &mut R, rarity: Rarity) -> (String, String) {
    let prefix = PREFIXES.choose(rng).copied().unwrap_or("Ash");
    let suffix = SUFFIXES.choose(rng).copied().unwrap_or("ling");
    let body = BODIES.choose(rng).copied().unwrap_or("fox");
    let feature = TRAITS.choose(rng).copied().unwrap_or("starlit eyes");

    let name = format!("{prefix}{suffix}");
    let mood = match rarity.rank() {
        0..=3 => "a small, friendly",
        4..=5 => "a striking",
        _ => "a majestic, otherworldly",
    };
    let prompt = format!(
        "{mood} {body} with {feature}, collectible card art, {} tier",
        rarity.label().to_lowercase()
    );
    (name, prompt)
}
