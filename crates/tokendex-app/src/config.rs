//! Application configuration.
//!
//! The configuration lives in `tokendex-config.yaml` next to the binary's
//! working directory. Every section and field is optional; missing values
//! take the defaults below. Environment variables override the file:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `TOKENDEX_DATABASE_URL` | `database.url` |
//! | `LLM_API_URL` | `generator.llm.api_url` |
//! | `LLM_API_KEY` | `generator.llm.api_key` (also selects `backend: llm`) |
//! | `LLM_MODEL` | `generator.llm.model` |
//! | `LLM_IMAGE_MODEL` | `generator.llm.image_model` |

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use tokendex_db::SqliteConfig;
use tokendex_economy::EconomyConfig;
use tokendex_generator::GeneratorConfig;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "tokendex-config.yaml";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    /// Collection store location and pool settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Initial balance and creation cost.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// Generation collaborator selection and settings.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Log level and format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty file deserializes as YAML null, not as an empty map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load `path` if given, else [`DEFAULT_CONFIG_FILE`] if it exists,
    /// else defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a file is found but cannot be loaded. An
    /// explicitly given path that does not exist is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Override fields from environment variables when set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("TOKENDEX_DATABASE_URL") {
            self.database.url = url;
        }
        self.generator.apply_env_overrides();
    }
}

/// Collection store settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` URL, e.g. `sqlite://tokendex.db`.
    pub url: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
    /// How long a write waits on a locked file, in milliseconds.
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::from("sqlite://tokendex.db"),
            max_connections: 4,
            busy_timeout_ms: 2_000,
        }
    }
}

impl DatabaseConfig {
    /// Convert to the store's pool configuration.
    pub fn to_sqlite_config(&self) -> SqliteConfig {
        SqliteConfig::new(&self.url)
            .with_max_connections(self.max_connections)
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("warn"),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use tokendex_generator::BackendKind;

    use super::*;

    #[test]
    fn empty_yaml_gives_defaults() {
        let config = AppConfig::parse("").ok();
        assert_eq!(
            config.as_ref().map(|c| c.economy),
            Some(EconomyConfig::default())
        );
        assert_eq!(
            config.map(|c| c.logging),
            Some(LoggingConfig::default())
        );
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let yaml = "
economy:
  creation_cost: 25
generator:
  backend: offline
  offline:
    seed: 7
logging:
  json: true
";
        let config = AppConfig::parse(yaml);
        assert!(config.is_ok());
        let Ok(config) = config else { return };
        assert_eq!(config.economy.creation_cost, 25);
        assert_eq!(config.economy.initial_balance, 100);
        assert_eq!(config.generator.offline.seed, Some(7));
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.database.max_connections, 4);
    }

    #[test]
    fn rarity_weights_parse_as_a_list() {
        let yaml = "
generator:
  rarity_weights: [1, 1, 1, 1, 1, 1, 1, 1]
";
        let config = AppConfig::parse(yaml);
        assert_eq!(config.ok().map(|c| c.generator.rarity_weights.total()), Some(8));
    }

    #[test]
    fn llm_section_parses() {
        let yaml = "
generator:
  backend: llm
  llm:
    api_url: http://localhost:11434/v1
    model: llama3
";
        let config = AppConfig::parse(yaml);
        assert!(config.is_ok());
        let Ok(config) = config else { return };
        assert_eq!(config.generator.backend, BackendKind::Llm);
        assert_eq!(config.generator.llm.model, "llama3");
        assert_eq!(config.generator.llm.image_model, "dall-e-3");
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        let result = AppConfig::parse("economy: [not, a, map");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/tokendex.yaml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn database_config_maps_to_pool_settings() {
        let config = DatabaseConfig {
            url: String::from("sqlite://x.db"),
            max_connections: 2,
            busy_timeout_ms: 500,
        };
        let sqlite = config.to_sqlite_config();
        assert_eq!(sqlite.url, "sqlite://x.db");
        assert_eq!(sqlite.max_connections, 2);
        assert_eq!(sqlite.busy_timeout, Duration::from_millis(500));
    }
}
