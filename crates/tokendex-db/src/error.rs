//! Error types for the persistence layer.
//!
//! All errors are propagated via [`DbError`]. Engine failures keep the
//! underlying [`sqlx`] error as their source, tagged with the collection
//! whose transaction failed.

use crate::transaction::{Collection, TxMode};

/// Errors that can occur in the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The database file could not be opened or prepared.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] sqlx::Error),

    /// A transaction on a collection aborted or could not commit.
    ///
    /// Any writes made inside the transaction have been rolled back.
    #[error("transaction on {collection} failed: {source}")]
    TransactionFailed {
        /// The collection the transaction was scoped to.
        collection: Collection,
        /// The underlying engine error.
        #[source]
        source: sqlx::Error,
    },

    /// The database was written by a newer schema than this build knows.
    #[error("unsupported schema version {found} (this build supports up to {supported})")]
    UnsupportedVersion {
        /// Version found in the file.
        found: i64,
        /// Highest version this build can open.
        supported: i64,
    },

    /// A write was attempted through a read-only transaction handle.
    #[error("cannot write to {collection} in {mode} mode")]
    ReadOnly {
        /// The collection the handle is scoped to.
        collection: Collection,
        /// The handle's mode.
        mode: TxMode,
    },

    /// A key of the wrong kind was used for a collection, or an
    /// auto-increment insert was attempted on a collection without one.
    #[error("key does not match the key kind of {collection}")]
    KeyMismatch {
        /// The collection that rejected the key.
        collection: Collection,
    },

    /// No record exists under the given key.
    #[error("no record {key} in {collection}")]
    NotFound {
        /// The collection that was searched.
        collection: Collection,
        /// The missing key, rendered for display.
        key: String,
    },

    /// An update tried to change a field that is fixed at creation.
    #[error("field `{field}` is immutable after creation")]
    ImmutableField {
        /// Name of the field as stored.
        field: &'static str,
    },

    /// A stored value could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
