//! Collection-scoped transactions.
//!
//! A [`CollectionTx`] is the only way to touch stored records. It wraps a
//! single `SQLite` transaction, knows which collection it may read and
//! write, and refuses writes when opened in [`TxMode::Read`].
//!
//! Dropping a handle without calling [`CollectionTx::commit`] rolls the
//! transaction back, so every exit path (an `Err` from the caller's
//! operation, a cancelled future, a panic) leaves the store unchanged.

use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, Transaction};

use tokendex_types::EntityId;

use crate::error::DbError;

// ---------------------------------------------------------------------------
// Collections and modes
// ---------------------------------------------------------------------------

/// The two logical collections in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Collectible entities, keyed by an auto-assigned integer.
    Entities,
    /// Scalar settings, keyed by a fixed string.
    Settings,
}

impl Collection {
    /// Every collection, in creation order.
    pub const ALL: [Self; 2] = [Self::Entities, Self::Settings];

    /// Backing table name.
    pub const fn table(self) -> &'static str {
        match self {
            Self::Entities => "entities",
            Self::Settings => "settings",
        }
    }

    /// Whether the store assigns keys for this collection.
    pub const fn auto_increment(self) -> bool {
        matches!(self, Self::Entities)
    }

    /// `CREATE TABLE` statement. A no-op when the table already exists.
    pub(crate) const fn create_sql(self) -> &'static str {
        match self {
            Self::Entities => {
                "CREATE TABLE IF NOT EXISTS entities (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    value TEXT NOT NULL CHECK (json_valid(value))
                )"
            }
            Self::Settings => {
                "CREATE TABLE IF NOT EXISTS settings (
                    id TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL CHECK (json_valid(value))
                )"
            }
        }
    }

    const fn accepts(self, key: &RecordKey) -> bool {
        matches!(
            (self, key),
            (Self::Entities, RecordKey::Id(_)) | (Self::Settings, RecordKey::Name(_))
        )
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.table())
    }
}

/// Access mode of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxMode {
    /// Reads only. Any write fails with [`DbError::ReadOnly`].
    Read,
    /// Reads and writes.
    ReadWrite,
}

impl core::fmt::Display for TxMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::ReadWrite => f.write_str("readwrite"),
        }
    }
}

// ---------------------------------------------------------------------------
// Keys and records
// ---------------------------------------------------------------------------

/// Primary key of a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    /// Integer key (entity collection).
    Id(i64),
    /// String key (settings collection).
    Name(String),
}

impl RecordKey {
    /// The integer key, if this is one.
    pub const fn as_id(&self) -> Option<i64> {
        match self {
            Self::Id(id) => Some(*id),
            Self::Name(_) => None,
        }
    }
}

impl core::fmt::Display for RecordKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Id(id) => write!(f, "#{id}"),
            Self::Name(name) => write!(f, "'{name}'"),
        }
    }
}

impl From<i64> for RecordKey {
    fn from(id: i64) -> Self {
        Self::Id(id)
    }
}

impl From<EntityId> for RecordKey {
    fn from(id: EntityId) -> Self {
        Self::Id(id.into_inner())
    }
}

impl From<&str> for RecordKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

/// A record read back together with its key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord<T> {
    /// Primary key.
    pub key: RecordKey,
    /// Decoded value.
    pub value: T,
}

// ---------------------------------------------------------------------------
// Transaction handle
// ---------------------------------------------------------------------------

/// An open transaction scoped to one collection.
pub struct CollectionTx {
    collection: Collection,
    mode: TxMode,
    tx: Transaction<'static, Sqlite>,
}

impl core::fmt::Debug for CollectionTx {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CollectionTx")
            .field("collection", &self.collection)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl CollectionTx {
    pub(crate) const fn new(
        collection: Collection,
        mode: TxMode,
        tx: Transaction<'static, Sqlite>,
    ) -> Self {
        Self {
            collection,
            mode,
            tx,
        }
    }

    /// The collection this handle is scoped to.
    pub const fn collection(&self) -> Collection {
        self.collection
    }

    /// The handle's access mode.
    pub const fn mode(&self) -> TxMode {
        self.mode
    }

    /// Read the value stored under `key`, if any.
    pub async fn get<T: DeserializeOwned>(
        &mut self,
        key: impl Into<RecordKey>,
    ) -> Result<Option<T>, DbError> {
        let key = self.check_key(key.into())?;
        let sql = format!("SELECT value FROM {} WHERE id = ?", self.collection.table());
        let query = sqlx::query_scalar::<_, String>(&sql);
        let raw = match key {
            RecordKey::Id(id) => query.bind(id).fetch_optional(&mut *self.tx).await,
            RecordKey::Name(name) => query.bind(name).fetch_optional(&mut *self.tx).await,
        }
        .map_err(|source| self.failed(source))?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(DbError::from)
    }

    /// Whether a record exists under `key`.
    pub async fn contains(&mut self, key: impl Into<RecordKey>) -> Result<bool, DbError> {
        let key = self.check_key(key.into())?;
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)",
            self.collection.table()
        );
        let query = sqlx::query_scalar::<_, bool>(&sql);
        match key {
            RecordKey::Id(id) => query.bind(id).fetch_one(&mut *self.tx).await,
            RecordKey::Name(name) => query.bind(name).fetch_one(&mut *self.tx).await,
        }
        .map_err(|source| self.failed(source))
    }

    /// Read every record in the collection, in key order.
    pub async fn get_all<T: DeserializeOwned>(&mut self) -> Result<Vec<StoredRecord<T>>, DbError> {
        let sql = format!("SELECT id, value FROM {} ORDER BY id", self.collection.table());
        let rows = sqlx::query(&sql)
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|source| self.failed(source))?;

        rows.iter().map(|row| self.decode_row(row)).collect()
    }

    /// Insert `value` under a freshly assigned key and return the key.
    ///
    /// Only valid on auto-increment collections. Keys are never reused,
    /// even after the record holding them is deleted. If the transaction
    /// rolls back, the key is not consumed.
    pub async fn add<T: Serialize + Sync>(&mut self, value: &T) -> Result<i64, DbError> {
        self.check_writable()?;
        if !self.collection.auto_increment() {
            return Err(DbError::KeyMismatch {
                collection: self.collection,
            });
        }
        let json = serde_json::to_string(value)?;
        let sql = format!("INSERT INTO {} (value) VALUES (?)", self.collection.table());
        let result = sqlx::query(&sql)
            .bind(json)
            .execute(&mut *self.tx)
            .await
            .map_err(|source| self.failed(source))?;

        Ok(result.last_insert_rowid())
    }

    /// Store `value` under `key`, replacing any existing record.
    pub async fn put<T: Serialize + Sync>(
        &mut self,
        key: impl Into<RecordKey>,
        value: &T,
    ) -> Result<(), DbError> {
        self.check_writable()?;
        let key = self.check_key(key.into())?;
        let json = serde_json::to_string(value)?;
        let sql = format!(
            "INSERT INTO {} (id, value) VALUES (?, ?) \
             ON CONFLICT(id) DO UPDATE SET value = excluded.value",
            self.collection.table()
        );
        let query = sqlx::query(&sql);
        match key {
            RecordKey::Id(id) => query.bind(id).bind(json).execute(&mut *self.tx).await,
            RecordKey::Name(name) => query.bind(name).bind(json).execute(&mut *self.tx).await,
        }
        .map_err(|source| self.failed(source))?;

        Ok(())
    }

    /// Remove the record under `key`.
    ///
    /// Succeeds when nothing is stored there. Returns whether a record
    /// was actually removed.
    pub async fn delete(&mut self, key: impl Into<RecordKey>) -> Result<bool, DbError> {
        self.check_writable()?;
        let key = self.check_key(key.into())?;
        let sql = format!("DELETE FROM {} WHERE id = ?", self.collection.table());
        let query = sqlx::query(&sql);
        let result = match key {
            RecordKey::Id(id) => query.bind(id).execute(&mut *self.tx).await,
            RecordKey::Name(name) => query.bind(name).execute(&mut *self.tx).await,
        }
        .map_err(|source| self.failed(source))?;

        Ok(result.rows_affected() > 0)
    }

    /// Commit every write made through this handle.
    pub async fn commit(self) -> Result<(), DbError> {
        let collection = self.collection;
        self.tx
            .commit()
            .await
            .map_err(|source| DbError::TransactionFailed { collection, source })
    }

    /// Discard every write made through this handle.
    ///
    /// A failed rollback is only logged: the engine discards uncommitted
    /// work when the connection is reset either way.
    pub async fn rollback(self) {
        let collection = self.collection;
        if let Err(e) = self.tx.rollback().await {
            tracing::warn!(%collection, error = %e, "explicit rollback failed");
        }
    }

    fn decode_row<T: DeserializeOwned>(&self, row: &SqliteRow) -> Result<StoredRecord<T>, DbError> {
        let key = if self.collection.auto_increment() {
            row.try_get::<i64, _>("id").map(RecordKey::Id)
        } else {
            row.try_get::<String, _>("id").map(RecordKey::Name)
        }
        .map_err(|source| self.failed(source))?;
        let json: String = row.try_get("value").map_err(|source| self.failed(source))?;
        let value = serde_json::from_str(&json)?;
        Ok(StoredRecord { key, value })
    }

    const fn check_writable(&self) -> Result<(), DbError> {
        match self.mode {
            TxMode::ReadWrite => Ok(()),
            TxMode::Read => Err(DbError::ReadOnly {
                collection: self.collection,
                mode: self.mode,
            }),
        }
    }

    fn check_key(&self, key: RecordKey) -> Result<RecordKey, DbError> {
        if self.collection.accepts(&key) {
            Ok(key)
        } else {
            Err(DbError::KeyMismatch {
                collection: self.collection,
            })
        }
    }

    fn failed(&self, source: sqlx::Error) -> DbError {
        DbError::TransactionFailed {
            collection: self.collection,
            source,
        }
    }
}
