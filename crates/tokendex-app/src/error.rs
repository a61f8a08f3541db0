//! Error types for the Tokendex binary.
//!
//! [`AppError`] wraps every failure a command can hit so `main` can turn
//! it into one user-facing line and a non-zero exit status.

use tokendex_db::DbError;
use tokendex_economy::EconomyError;
use tokendex_generator::GeneratorError;

use crate::config::ConfigError;

/// Top-level error for the Tokendex binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// The collection store could not be opened.
    #[error("storage error: {source}")]
    Storage {
        /// The underlying store error.
        #[from]
        source: DbError,
    },

    /// The generation collaborator could not be built.
    #[error("generator error: {source}")]
    Generator {
        /// The underlying generator error.
        #[from]
        source: GeneratorError,
    },

    /// An economy operation failed.
    #[error("{source}")]
    Economy {
        /// The underlying economy error.
        #[from]
        source: EconomyError,
    },

    /// The command line asked for something that cannot be done.
    #[error("{message}")]
    Usage {
        /// What was wrong.
        message: String,
    },

    /// Writing output or reading confirmation failed.
    #[error("terminal I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}

impl AppError {
    /// A message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Economy { source } => source.user_message(),
            Self::Storage { source } => match source {
                DbError::UnsupportedVersion { .. } => format!(
                    "This collection was saved by a newer version of Tokendex ({source})."
                ),
                _ => format!("Could not open your collection: {source}."),
            },
            Self::Usage { message } => message.clone(),
            Self::Config { .. } | Self::Generator { .. } | Self::Io { .. } => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn economy_errors_use_their_user_message() {
        let err = AppError::from(EconomyError::InsufficientFunds {
            balance: 3,
            cost: 10,
        });
        assert!(err.user_message().starts_with("Not enough tokens"));
    }

    #[test]
    fn newer_schema_is_explained() {
        let err = AppError::from(DbError::UnsupportedVersion {
            found: 2,
            supported: 1,
        });
        assert!(err.user_message().contains("newer version"));
    }

    #[test]
    fn usage_errors_pass_through() {
        let err = AppError::Usage {
            message: String::from("nothing to change"),
        };
        assert_eq!(err.user_message(), "nothing to change");
    }
}
