//! Typed operations on the entity collection.
//!
//! Every call runs in exactly one transaction on [`Collection::Entities`],
//! so identity assignment and payload write land together or not at all.

use tokendex_types::{Entity, EntityId, NewEntity};

use crate::error::DbError;
use crate::sqlite::Database;
use crate::transaction::{Collection, StoredRecord, TxMode};

/// Operations on the `entities` collection.
#[derive(Debug, Clone, Copy)]
pub struct EntityRepository<'a> {
    db: &'a Database,
}

impl<'a> EntityRepository<'a> {
    /// Create a repository bound to an open database.
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Return every entity, newest first.
    ///
    /// Entities created in the same instant are ordered by id, highest
    /// first, so the order is total and stable across calls.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::TransactionFailed`] if the read fails, or
    /// [`DbError::Serialization`] if a stored record is corrupt.
    pub async fn list_all(&self) -> Result<Vec<Entity>, DbError> {
        let records = self
            .db
            .run_transaction(Collection::Entities, TxMode::Read, |tx| {
                Box::pin(async move { tx.get_all::<NewEntity>().await })
            })
            .await?;

        let mut entities = records
            .into_iter()
            .map(into_entity)
            .collect::<Result<Vec<_>, _>>()?;
        sort_newest_first(&mut entities);

        tracing::debug!(count = entities.len(), "Listed entities");
        Ok(entities)
    }

    /// Return the entity stored under `id`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::TransactionFailed`] if the read fails.
    pub async fn get(&self, id: EntityId) -> Result<Option<Entity>, DbError> {
        let stored = self
            .db
            .run_transaction(Collection::Entities, TxMode::Read, move |tx| {
                Box::pin(async move { tx.get::<NewEntity>(id).await })
            })
            .await?;

        Ok(stored.map(|payload| payload.with_id(id)))
    }

    /// Persist a new entity and return it with its assigned identity.
    ///
    /// Identities increase monotonically and are never reused, even after
    /// the entity holding one is deleted.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::TransactionFailed`] if the insert does not
    /// commit. The entity was not created in that case and no identity
    /// was consumed.
    pub async fn insert(&self, entity: NewEntity) -> Result<Entity, DbError> {
        let payload = entity.clone();
        let id = self
            .db
            .run_transaction(Collection::Entities, TxMode::ReadWrite, move |tx| {
                Box::pin(async move { tx.add(&payload).await })
            })
            .await?;

        let id = EntityId(id);
        tracing::debug!(%id, rarity = %entity.rarity, "Inserted entity");
        Ok(entity.with_id(id))
    }

    /// Overwrite the editable fields of an existing entity.
    ///
    /// Fails with [`DbError::NotFound`] when no entity is stored under
    /// `entity.id`; an update never creates a record. Fails with
    /// [`DbError::ImmutableField`] when `rarity`, `imageUrl` or
    /// `createdAt` differ from the stored values.
    ///
    /// # Errors
    ///
    /// See above, plus [`DbError::TransactionFailed`] if the write fails.
    pub async fn update(&self, entity: &Entity) -> Result<Entity, DbError> {
        let (id, payload) = entity.clone().into_parts();
        self.db
            .run_transaction(Collection::Entities, TxMode::ReadWrite, move |tx| {
                Box::pin(async move {
                    let Some(current) = tx.get::<NewEntity>(id).await? else {
                        return Err(DbError::NotFound {
                            collection: Collection::Entities,
                            key: id.to_string(),
                        });
                    };
                    check_immutable(&current, &payload)?;
                    tx.put(id, &payload).await
                })
            })
            .await?;

        tracing::debug!(id = %entity.id, "Updated entity");
        Ok(entity.clone())
    }

    /// Remove the entity stored under `id`.
    ///
    /// Idempotent: removing an id that holds nothing succeeds. Returns
    /// whether an entity was actually removed.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::TransactionFailed`] if the delete does not commit.
    pub async fn delete(&self, id: EntityId) -> Result<bool, DbError> {
        let removed = self
            .db
            .run_transaction(Collection::Entities, TxMode::ReadWrite, move |tx| {
                Box::pin(async move { tx.delete(id).await })
            })
            .await?;

        tracing::debug!(%id, removed, "Deleted entity");
        Ok(removed)
    }
}

/// Sort by `created_at` descending, then id descending.
pub fn sort_newest_first(entities: &mut [Entity]) {
    entities.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

fn into_entity(record: StoredRecord<NewEntity>) -> Result<Entity, DbError> {
    let id = record.key.as_id().ok_or(DbError::KeyMismatch {
        collection: Collection::Entities,
    })?;
    Ok(record.value.with_id(EntityId(id)))
}

fn check_immutable(current: &NewEntity, next: &NewEntity) -> Result<(), DbError> {
    if current.rarity != next.rarity {
        return Err(DbError::ImmutableField { field: "rarity" });
    }
    if current.image_url != next.image_url {
        return Err(DbError::ImmutableField { field: "imageUrl" });
    }
    if current.created_at != next.created_at {
        return Err(DbError::ImmutableField { field: "createdAt" });
    }
    Ok(())
}
