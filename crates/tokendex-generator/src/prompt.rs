//! Prompt template loading and rendering via `minijinja`.
//!
//! The built-in templates are compiled into the binary. Operators can
//! point `llm.templates_dir` at a directory holding `system.j2` and
//! `entity.j2` to tune the wording without recompiling.

use std::path::Path;

use minijinja::{Environment, context};
use tokendex_types::Rarity;

use crate::error::GeneratorError;

const DEFAULT_SYSTEM: &str = include_str!("../templates/system.j2");
const DEFAULT_ENTITY: &str = include_str!("../templates/entity.j2");

/// The complete rendered prompt ready to send to the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    /// System message describing the task and output format.
    pub system: String,
    /// User message naming the rarity and optional theme.
    pub user: String,
}

/// Holds the compiled prompt templates.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl core::fmt::Debug for PromptEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PromptEngine").finish_non_exhaustive()
    }
}

impl PromptEngine {
    /// Load templates from `templates_dir`, or use the built-in ones.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Template`] if a file cannot be read or a
    /// template does not compile.
    pub fn new(templates_dir: Option<&Path>) -> Result<Self, GeneratorError> {
        let (system, entity) = match templates_dir {
            Some(dir) => (
                load_template(dir, "system.j2")?,
                load_template(dir, "entity.j2")?,
            ),
            None => (DEFAULT_SYSTEM.to_owned(), DEFAULT_ENTITY.to_owned()),
        };

        let mut env = Environment::new();
        env.add_template_owned("system", system)
            .map_err(|e| GeneratorError::Template(format!("failed to add system template: {e}")))?;
        env.add_template_owned("entity", entity)
            .map_err(|e| GeneratorError::Template(format!("failed to add entity template: {e}")))?;

        Ok(Self { env })
    }

    /// Render the prompt for one entity of `rarity`.
    ///
    /// # Errors
    ///
    /// Returns [`GeneratorError::Template`] if rendering fails.
    pub fn render(&self, rarity: Rarity, theme: Option<&str>) -> Result<RenderedPrompt, GeneratorError> {
        let ctx = context! {
            rarity => rarity.code(),
            rarity_label => rarity.label(),
            rarity_rank => rarity.rank(),
            theme => theme,
        };

        let system = self
            .env
            .get_template("system")
            .map_err(|e| GeneratorError::Template(format!("missing system template: {e}")))?
            .render(&ctx)
            .map_err(|e| GeneratorError::Template(format!("system render failed: {e}")))?;

        let user = self
            .env
            .get_template("entity")
            .map_err(|e| GeneratorError::Template(format!("missing entity template: {e}")))?
            .render(&ctx)
            .map_err(|e| GeneratorError::Template(format!("entity render failed: {e}")))?;

        Ok(RenderedPrompt {
            system: system.trim().to_owned(),
            user: user.trim().to_owned(),
        })
    }
}

/// Read a template file from disk.
fn load_template(dir: &Path, filename: &str) -> Result<String, GeneratorError> {
    let path = dir.join(filename);
    std::fs::read_to_string(&path)
        .map_err(|e| GeneratorError::Template(format!("failed to read {}: {e}", path.display())))
}
