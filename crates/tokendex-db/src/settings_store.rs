//! Typed access to the balance record in the settings collection.
//!
//! The repository stores whatever amount it is given. Keeping the balance
//! non-negative is the economy controller's job.

use tokendex_types::{BALANCE_RECORD_ID, BalanceRecord};

use crate::error::DbError;
use crate::sqlite::Database;
use crate::transaction::{Collection, TxMode};

/// Operations on the `settings` collection.
#[derive(Debug, Clone, Copy)]
pub struct SettingsRepository<'a> {
    db: &'a Database,
}

impl<'a> SettingsRepository<'a> {
    /// Create a repository bound to an open database.
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Return the stored balance, or `None` if it was never initialized.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::TransactionFailed`] if the read fails.
    pub async fn get_balance(&self) -> Result<Option<i64>, DbError> {
        let record = self
            .db
            .run_transaction(Collection::Settings, TxMode::Read, |tx| {
                Box::pin(async move { tx.get::<BalanceRecord>(BALANCE_RECORD_ID).await })
            })
            .await?;

        Ok(record.map(|r| r.amount))
    }

    /// Overwrite the stored balance.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::TransactionFailed`] if the write does not commit.
    pub async fn set_balance(&self, amount: i64) -> Result<(), DbError> {
        self.db
            .run_transaction(Collection::Settings, TxMode::ReadWrite, move |tx| {
                Box::pin(async move {
                    tx.put(BALANCE_RECORD_ID, &BalanceRecord::new(amount)).await
                })
            })
            .await?;

        tracing::debug!(amount, "Persisted balance");
        Ok(())
    }

    /// Return the stored balance, first persisting `initial` if no balance
    /// record exists yet.
    ///
    /// The read and the first write share one transaction, so the record
    /// is either already there or written before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::TransactionFailed`] if the transaction fails.
    pub async fn initialize_balance(&self, initial: i64) -> Result<i64, DbError> {
        let (amount, created) = self
            .db
            .run_transaction(Collection::Settings, TxMode::ReadWrite, move |tx| {
                Box::pin(async move {
                    if let Some(existing) = tx.get::<BalanceRecord>(BALANCE_RECORD_ID).await? {
                        return Ok((existing.amount, false));
                    }
                    tx.put(BALANCE_RECORD_ID, &BalanceRecord::new(initial)).await?;
                    Ok((initial, true))
                })
            })
            .await?;

        if created {
            tracing::info!(amount, "Initialized balance on first run");
        }
        Ok(amount)
    }
}
