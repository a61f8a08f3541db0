//! The economy controller.
//!
//! Owns the in-memory balance and is the only component that changes it.
//! Two state machines run here:
//!
//! ```text
//! generate:  check >= cost -> debit -> generate -> insert
//!                                        |          |
//!                                        +-- fail --+--> credit back
//!
//! sell:      read stored price -> credit -> delete
//!                                             |
//!                                             +-- fail --> debit back
//! ```
//!
//! The debit (or credit) is committed before the downstream step starts,
//! so a process that stops in between keeps the mutated balance. Every
//! compensating write reverses the delta against the current balance and
//! is attempted exactly once.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::Instrument;
use uuid::Uuid;

use tokendex_db::{Database, EntityRepository, SettingsRepository};
use tokendex_types::{Entity, EntityEdit, EntityId, GeneratedEntity};

use crate::EconomyError;
use crate::collection::CollectionStats;
use crate::config::EconomyConfig;
use crate::generator::EntityGenerator;
use crate::pricing::sell_price;

/// Coordinates balance changes with collection changes.
///
/// Construct with [`EconomyController::open`], which also performs
/// first-run balance initialization.
#[derive(Debug)]
pub struct EconomyController<G> {
    db: Database,
    generator: G,
    config: EconomyConfig,
    /// Mirror of the persisted balance. Held across every balance write.
    balance: Mutex<i64>,
    generating: AtomicBool,
}

impl<G: EntityGenerator> EconomyController<G> {
    /// Load (or initialize) the balance and build the controller.
    ///
    /// If no balance record exists, `config.initial_balance` is persisted
    /// before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidConfig`] for an unusable config, or
    /// [`EconomyError::Persistence`] if the balance cannot be read or
    /// initialized.
    pub async fn open(db: Database, generator: G, config: EconomyConfig) -> Result<Self, EconomyError> {
        config.validate()?;
        let balance = SettingsRepository::new(&db)
            .initialize_balance(config.initial_balance)
            .await?;

        tracing::info!(
            balance,
            creation_cost = config.creation_cost,
            "Economy controller ready"
        );

        Ok(Self {
            db,
            generator,
            config,
            balance: Mutex::new(balance),
            generating: AtomicBool::new(false),
        })
    }

    /// The configuration in effect.
    pub const fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Current balance.
    pub async fn balance(&self) -> i64 {
        *self.balance.lock().await
    }

    /// Whether a generation is in flight.
    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    /// Whether a generation could start right now.
    pub async fn can_generate(&self) -> bool {
        !self.is_generating() && self.balance().await >= self.config.creation_cost
    }

    /// Every entity, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::Persistence`] if the collection cannot be read.
    pub async fn list(&self) -> Result<Vec<Entity>, EconomyError> {
        Ok(EntityRepository::new(&self.db).list_all().await?)
    }

    /// Fetch one entity.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::NotFound`] if no entity has this id.
    pub async fn get(&self, id: EntityId) -> Result<Entity, EconomyError> {
        EntityRepository::new(&self.db)
            .get(id)
            .await?
            .ok_or(EconomyError::NotFound { id })
    }

    /// Balance, collection value, and net result.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::Persistence`] if the collection cannot be read.
    pub async fn stats(&self) -> Result<CollectionStats, EconomyError> {
        let entities = self.list().await?;
        let balance = self.balance().await;
        Ok(CollectionStats::compute(
            balance,
            &entities,
            self.config.initial_balance,
        ))
    }

    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    /// Spend the creation cost and add a freshly generated entity.
    ///
    /// Only one generation runs at a time. If the generator or the insert
    /// fails after the debit, the cost is credited back before the error
    /// is returned.
    ///
    /// # Errors
    ///
    /// - [`EconomyError::GenerationInProgress`] if another generation is in
    ///   flight (nothing mutated).
    /// - [`EconomyError::InsufficientFunds`] if the balance is below the
    ///   cost (nothing mutated).
    /// - [`EconomyError::GenerationFailed`] or
    ///   [`EconomyError::Persistence`] after a successful refund.
    /// - [`EconomyError::CompensationFailed`] if the refund failed too.
    pub async fn generate(&self) -> Result<Entity, EconomyError> {
        let op_id = Uuid::now_v7();
        let span = tracing::info_span!("generate", %op_id);
        self.generate_inner().instrument(span).await
    }

    async fn generate_inner(&self) -> Result<Entity, EconomyError> {
        let Some(_gate) = GenerationGate::try_acquire(&self.generating) else {
            tracing::debug!("Generation rejected, another is in flight");
            return Err(EconomyError::GenerationInProgress);
        };

        let cost = self.config.creation_cost;
        let balance = self.debit_checked(cost).await?;
        tracing::info!(cost, balance, "Debited creation cost");

        match self.acquire().await {
            Ok(entity) => {
                tracing::info!(
                    entity_id = %entity.id,
                    rarity = %entity.rarity,
                    balance,
                    "Generated entity"
                );
                Ok(entity)
            }
            Err(cause) => {
                tracing::warn!(error = %cause, "Generation failed, refunding cost");
                Err(self.compensate(cost, cause).await)
            }
        }
    }

    /// Lock the balance, check it covers `cost`, and persist the debit.
    async fn debit_checked(&self, cost: i64) -> Result<i64, EconomyError> {
        let mut balance = self.balance.lock().await;
        if *balance < cost {
            tracing::info!(balance = *balance, cost, "Insufficient funds");
            return Err(EconomyError::InsufficientFunds {
                balance: *balance,
                cost,
            });
        }
        let debited = balance.saturating_sub(cost);
        SettingsRepository::new(&self.db).set_balance(debited).await?;
        *balance = debited;
        Ok(debited)
    }

    /// Call the generator and store its payload.
    async fn acquire(&self) -> Result<Entity, EconomyError> {
        let payload = self
            .generator
            .generate()
            .await
            .map_err(|e| EconomyError::GenerationFailed { message: e.message })?;
        check_payload(&payload).map_err(|e| EconomyError::GenerationFailed {
            message: format!("generator returned an unusable entity ({e})"),
        })?;

        let entity = EntityRepository::new(&self.db)
            .insert(payload.into_new_entity(Utc::now()))
            .await?;
        Ok(entity)
    }

    // -----------------------------------------------------------------------
    // Sale
    // -----------------------------------------------------------------------

    /// Sell `entity`: credit its rarity price and remove it.
    ///
    /// The price comes from the stored record under `entity.id`, never from
    /// the caller's copy. Confirmation is the caller's job and must happen
    /// before this is called. If removal fails, or the entity disappears
    /// before it is removed, the credit is reversed.
    ///
    /// # Errors
    ///
    /// - [`EconomyError::NotFound`] if no entity has this id (nothing
    ///   mutated), or it vanished before removal (credit reversed).
    /// - [`EconomyError::Persistence`] if the credit or the removal fails.
    /// - [`EconomyError::CompensationFailed`] if the reversal failed too.
    pub async fn sell(&self, entity: &Entity) -> Result<i64, EconomyError> {
        let op_id = Uuid::now_v7();
        let span = tracing::info_span!("sell", %op_id, entity_id = %entity.id);
        self.sell_inner(entity).instrument(span).await
    }

    async fn sell_inner(&self, entity: &Entity) -> Result<i64, EconomyError> {
        let stored = self.get(entity.id).await?;
        if stored.rarity != entity.rarity {
            tracing::warn!(
                claimed = %entity.rarity,
                stored = %stored.rarity,
                "Sale request disagrees with stored rarity, using stored"
            );
        }
        let price = sell_price(stored.rarity);
        let balance = self.adjust(price).await?;
        tracing::info!(price, balance, rarity = %stored.rarity, "Credited sale");

        let removed = EntityRepository::new(&self.db).delete(entity.id).await;
        let cause = match removed {
            Ok(true) => {
                tracing::info!(balance, "Sold entity");
                return Ok(balance);
            }
            Ok(false) => EconomyError::NotFound { id: entity.id },
            Err(e) => EconomyError::Persistence(e),
        };
        tracing::warn!(error = %cause, "Sale removal failed, reversing credit");
        Err(self.compensate(price.saturating_neg(), cause).await)
    }

    // -----------------------------------------------------------------------
    // Balance writes
    // -----------------------------------------------------------------------

    /// Persist `balance + delta`, then update the in-memory value.
    async fn adjust(&self, delta: i64) -> Result<i64, EconomyError> {
        let mut balance = self.balance.lock().await;
        let next = balance.saturating_add(delta);
        SettingsRepository::new(&self.db).set_balance(next).await?;
        *balance = next;
        Ok(next)
    }

    /// Reverse a committed balance change after `cause`.
    ///
    /// Returns the error to surface: `cause` itself when the reversal
    /// succeeded, [`EconomyError::CompensationFailed`] otherwise.
    async fn compensate(&self, delta: i64, cause: EconomyError) -> EconomyError {
        let mut balance = self.balance.lock().await;
        let restored = balance.saturating_add(delta);
        match SettingsRepository::new(&self.db).set_balance(restored).await {
            Ok(()) => {
                *balance = restored;
                tracing::info!(delta, balance = restored, "Compensated balance");
                cause
            }
            Err(compensation) => {
                tracing::error!(
                    delta,
                    balance = *balance,
                    cause = %cause,
                    error = %compensation,
                    "Compensating balance write failed; balance left unreconciled"
                );
                EconomyError::CompensationFailed {
                    cause: Box::new(cause),
                    compensation,
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Change an entity's name and/or prompt. Never touches the balance.
    ///
    /// # Errors
    ///
    /// - [`EconomyError::InvalidEntity`] if a supplied field is blank.
    /// - [`EconomyError::NotFound`] if no entity has this id.
    /// - [`EconomyError::Persistence`] if the update fails.
    pub async fn edit(&self, id: EntityId, edit: EntityEdit) -> Result<Entity, EconomyError> {
        let edit = normalize_edit(edit)?;
        let repo = EntityRepository::new(&self.db);
        let current = repo.get(id).await?.ok_or(EconomyError::NotFound { id })?;
        let updated = repo.update(&current.with_edit(&edit)).await?;
        tracing::info!(entity_id = %id, "Edited entity");
        Ok(updated)
    }

    /// Remove an entity without crediting anything.
    ///
    /// Returns whether an entity was removed; deleting a missing id is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::Persistence`] if the delete fails.
    pub async fn delete(&self, id: EntityId) -> Result<bool, EconomyError> {
        let removed = EntityRepository::new(&self.db).delete(id).await?;
        tracing::info!(entity_id = %id, removed, "Deleted entity");
        Ok(removed)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Clears the generating flag when dropped, on every exit path.
struct GenerationGate<'a>(&'a AtomicBool);

impl<'a> GenerationGate<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for GenerationGate<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn require_text(field: &'static str, value: &str) -> Result<(), EconomyError> {
    if value.trim().is_empty() {
        return Err(EconomyError::InvalidEntity { field });
    }
    Ok(())
}

fn check_payload(payload: &GeneratedEntity) -> Result<(), EconomyError> {
    require_text("name", &payload.name)?;
    require_text("prompt", &payload.prompt)?;
    require_text("imageUrl", &payload.image_url)
}

/// Trim supplied fields and reject blank ones.
fn normalize_edit(edit: EntityEdit) -> Result<EntityEdit, EconomyError> {
    let name = edit.name.map(|n| n.trim().to_owned());
    let prompt = edit.prompt.map(|p| p.trim().to_owned());
    if let Some(name) = &name {
        require_text("name", name)?;
    }
    if let Some(prompt) = &prompt {
        require_text("prompt", prompt)?;
    }
    Ok(EntityEdit { name, prompt })
}
