//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tokendex_economy::SortOrder;

/// Tokendex: generate, collect, and sell creatures with a token balance.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, global = true, env = "TOKENDEX_CONFIG")]
    pub config: Option<PathBuf>,

    /// Command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show the token balance.
    Balance,
    /// List the collection.
    List {
        /// Sort order.
        #[arg(short, long, value_enum, default_value_t = SortArg::Newest)]
        sort: SortArg,
    },
    /// Show one entity in full.
    Show {
        /// Entity id.
        id: i64,
    },
    /// Spend tokens to generate a new entity.
    Generate,
    /// Rename an entity or change its prompt.
    Edit {
        /// Entity id.
        id: i64,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New prompt.
        #[arg(long)]
        prompt: Option<String>,
    },
    /// Sell an entity for tokens.
    Sell {
        /// Entity id.
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
    /// Remove an entity without selling it.
    Delete {
        /// Entity id.
        id: i64,
    },
    /// Show balance, collection value, and net result.
    Stats,
}

/// Sort order as spelled on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    /// Newest first.
    Newest,
    /// Oldest first.
    Oldest,
    /// Rarest first.
    Rarest,
    /// Most common first.
    Common,
}

impl From<SortArg> for SortOrder {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Newest => Self::DateDesc,
            SortArg::Oldest => Self::DateAsc,
            SortArg::Rarest => Self::RarityDesc,
            SortArg::Common => Self::RarityAsc,
        }
    }
}
