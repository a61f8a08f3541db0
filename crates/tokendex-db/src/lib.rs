//! Local persistence for Tokendex (`SQLite`).
//!
//! One versioned database file holds two logical collections: the
//! collectible entities and the scalar settings (the token balance). Every
//! read and write goes through a transaction scoped to exactly one
//! collection, so callers never observe a half-applied change.
//!
//! # Architecture
//!
//! ```text
//! EntityRepository ----+
//!                      +--> Database::run_transaction(collection, mode, op)
//! SettingsRepository --+            |
//!                                   +-- CollectionTx (get / get_all / add / put / delete)
//!                                   +-- commit on Ok, rollback on Err or drop
//! ```
//!
//! # Modules
//!
//! - [`sqlite`] -- Connection configuration, open-or-create, schema versioning
//! - [`transaction`] -- Collection-scoped transaction handle
//! - [`entity_store`] -- Typed operations on the entity collection
//! - [`settings_store`] -- Typed operations on the balance record
//! - [`error`] -- Shared error types

pub mod entity_store;
pub mod error;
pub mod settings_store;
pub mod sqlite;
pub mod transaction;

// Re-export primary types for convenience.
pub use entity_store::EntityRepository;
pub use error::DbError;
pub use settings_store::SettingsRepository;
pub use sqlite::{Database, SCHEMA_VERSION, SharedDatabase, SqliteConfig};
pub use transaction::{Collection, CollectionTx, RecordKey, StoredRecord, TxMode};
