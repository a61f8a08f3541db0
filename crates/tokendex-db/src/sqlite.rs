//! `SQLite` database handle, configuration, and schema versioning.
//!
//! The store is a single local file. Commits are durable on return
//! (`synchronous = FULL` under WAL), and nothing is cached above the
//! engine, so every read reflects the latest committed state.
//!
//! The schema version lives in `PRAGMA user_version`. Opening a file
//! creates any missing collection and stamps the version; opening a file
//! stamped by a newer build is refused.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use tokio::sync::OnceCell;

use crate::error::DbError;
use crate::transaction::{Collection, CollectionTx, TxMode};

/// Schema version written by this build.
pub const SCHEMA_VERSION: i64 = 1;

/// Default maximum number of connections in the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 4;

/// Default connection timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default time to wait on a locked database, in milliseconds.
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 2_000;

/// Configuration for the `SQLite` connection pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteConfig {
    /// `SQLite` connection URL.
    ///
    /// Format: `sqlite://path/to/tokendex.db` or `sqlite::memory:`
    pub url: String,
    /// Maximum number of connections in the pool.
    pub max_connections: u32,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// How long a statement waits on a locked database before failing.
    pub busy_timeout: Duration,
}

impl SqliteConfig {
    /// Create a new configuration from a database URL.
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            busy_timeout: Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS),
        }
    }

    /// Create a configuration for a database file at `path`.
    pub fn for_path(path: &Path) -> Self {
        Self::new(&format!("sqlite://{}", path.display()))
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub const fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the connection timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the busy timeout.
    #[must_use]
    pub const fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Whether the URL names a private in-memory database.
    fn is_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Handle to the open database.
///
/// Cheap to clone: clones share the same connection pool. Construct once
/// at startup with [`Database::open_or_create`] (or lazily through
/// [`SharedDatabase`]) and pass it to the repositories.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database, creating the file and both collections if they
    /// do not exist yet.
    ///
    /// Idempotent: opening an already initialized file changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Config`] if the URL cannot be parsed.
    /// Returns [`DbError::StorageUnavailable`] if the file cannot be
    /// opened or the schema cannot be created.
    /// Returns [`DbError::UnsupportedVersion`] if the file was written by
    /// a newer schema.
    pub async fn open_or_create(config: &SqliteConfig) -> Result<Self, DbError> {
        let connect_options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| DbError::Config(format!("Invalid database URL: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(config.busy_timeout);

        // Every connection to `:memory:` is its own database, so pin the
        // pool to a single connection that never expires.
        let pool_options = if config.is_memory() {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections)
        };

        let pool = pool_options
            .acquire_timeout(config.connect_timeout)
            .connect_with(connect_options)
            .await
            .map_err(DbError::StorageUnavailable)?;

        let db = Self { pool };
        db.ensure_schema().await?;

        tracing::info!(
            url = config.url.as_str(),
            schema_version = SCHEMA_VERSION,
            "Opened collection store"
        );

        Ok(db)
    }

    /// Create missing collections and stamp the schema version.
    async fn ensure_schema(&self) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await.map_err(DbError::StorageUnavailable)?;

        let found: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&mut *tx)
            .await
            .map_err(DbError::StorageUnavailable)?;
        if found > SCHEMA_VERSION {
            return Err(DbError::UnsupportedVersion {
                found,
                supported: SCHEMA_VERSION,
            });
        }

        for collection in Collection::ALL {
            sqlx::query(collection.create_sql())
                .execute(&mut *tx)
                .await
                .map_err(DbError::StorageUnavailable)?;
        }

        if found < SCHEMA_VERSION {
            // PRAGMA arguments cannot be bound; the value is a compile-time constant.
            sqlx::query(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))
                .execute(&mut *tx)
                .await
                .map_err(DbError::StorageUnavailable)?;
            tracing::info!(from = found, to = SCHEMA_VERSION, "Stamped schema version");
        }

        tx.commit().await.map_err(DbError::StorageUnavailable)?;
        Ok(())
    }

    /// Read the schema version stamped in the file.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StorageUnavailable`] if the pragma cannot be read.
    pub async fn schema_version(&self) -> Result<i64, DbError> {
        sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await
            .map_err(DbError::StorageUnavailable)
    }

    /// Open a transaction scoped to `collection`.
    ///
    /// The returned handle rolls back when dropped unless
    /// [`CollectionTx::commit`] is called. Prefer
    /// [`Database::run_transaction`], which commits and rolls back for you.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::TransactionFailed`] if no transaction can be
    /// started (pool closed, database locked past the busy timeout).
    pub async fn begin(&self, collection: Collection, mode: TxMode) -> Result<CollectionTx, DbError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|source| DbError::TransactionFailed { collection, source })?;
        Ok(CollectionTx::new(collection, mode, tx))
    }

    /// Run `op` inside a transaction scoped to `collection`.
    ///
    /// Resolves with the operation's result only once the transaction has
    /// committed. If `op` fails, or the commit fails, every write made by
    /// `op` is rolled back and the error is returned.
    ///
    /// ```ignore
    /// let id = db
    ///     .run_transaction(Collection::Entities, TxMode::ReadWrite, move |tx| {
    ///         Box::pin(async move { tx.add(&payload).await })
    ///     })
    ///     .await?;
    /// ```
    ///
    /// # Errors
    ///
    /// Returns whatever `op` returns, or [`DbError::TransactionFailed`] if
    /// the transaction cannot start or commit.
    pub async fn run_transaction<T, F>(
        &self,
        collection: Collection,
        mode: TxMode,
        op: F,
    ) -> Result<T, DbError>
    where
        F: for<'t> FnOnce(&'t mut CollectionTx) -> BoxFuture<'t, Result<T, DbError>>,
    {
        let mut handle = self.begin(collection, mode).await?;
        let result = op(&mut handle).await;
        match result {
            Ok(value) => {
                handle.commit().await?;
                Ok(value)
            }
            Err(e) => {
                tracing::debug!(%collection, %mode, error = %e, "Rolling back transaction");
                handle.rollback().await;
                Err(e)
            }
        }
    }

    /// Return a reference to the underlying [`SqlitePool`].
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close all connections in the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Collection store closed");
    }
}

/// Process-scoped, lazily opened [`Database`].
///
/// The first call to [`SharedDatabase::get_or_open`] opens the file; every
/// later call (including concurrent ones) returns the same handle. A
/// failed open is not cached, so the next call tries again.
#[derive(Debug)]
pub struct SharedDatabase {
    config: SqliteConfig,
    cell: OnceCell<Database>,
}

impl SharedDatabase {
    /// Create an unopened handle for `config`.
    pub fn new(config: SqliteConfig) -> Self {
        Self {
            config,
            cell: OnceCell::new(),
        }
    }

    /// Return the open database, opening it on first use.
    ///
    /// # Errors
    ///
    /// Returns the [`Database::open_or_create`] error if opening fails.
    pub async fn get_or_open(&self) -> Result<&Database, DbError> {
        self.cell
            .get_or_try_init(|| Database::open_or_create(&self.config))
            .await
    }

    /// Whether the database has been opened.
    pub fn is_open(&self) -> bool {
        self.cell.initialized()
    }
}
