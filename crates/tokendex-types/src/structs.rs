//! Record structs for Tokendex.
//!
//! Field names serialize in camelCase (`imageUrl`, `createdAt`) so the
//! JSON stored in the entity collection matches the shape the rendering
//! layer already reads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::Rarity;
use crate::ids::EntityId;

/// Fixed key of the single balance record in the settings collection.
pub const BALANCE_RECORD_ID: &str = "tokenBalance";

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// An entity that has not been persisted yet.
///
/// Carries every field of an [`Entity`] except the identity, which only
/// the store assigns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct NewEntity {
    /// Display name.
    pub name: String,
    /// Text describing what was asked of the generator.
    pub prompt: String,
    /// Reference to the generated artwork. Opaque to the core.
    pub image_url: String,
    /// Scarcity tier.
    pub rarity: Rarity,
    /// Creation timestamp, set once at insert.
    pub created_at: DateTime<Utc>,
}

impl NewEntity {
    /// Attach a store-assigned identity.
    pub fn with_id(self, id: EntityId) -> Entity {
        Entity {
            id,
            name: self.name,
            prompt: self.prompt,
            image_url: self.image_url,
            rarity: self.rarity,
            created_at: self.created_at,
        }
    }
}

/// A persisted collectible.
///
/// `id`, `image_url`, `rarity` and `created_at` never change after
/// insert. Only `name` and `prompt` are editable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Entity {
    /// Store-assigned identity.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// Text describing what was asked of the generator.
    pub prompt: String,
    /// Reference to the generated artwork.
    pub image_url: String,
    /// Scarcity tier.
    pub rarity: Rarity,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Entity {
    /// Split off the identity, leaving the stored payload.
    pub fn into_parts(self) -> (EntityId, NewEntity) {
        (
            self.id,
            NewEntity {
                name: self.name,
                prompt: self.prompt,
                image_url: self.image_url,
                rarity: self.rarity,
                created_at: self.created_at,
            },
        )
    }

    /// Return a copy with the editable fields replaced by `edit`.
    ///
    /// Fields left as `None` in the edit keep their current value.
    #[must_use]
    pub fn with_edit(&self, edit: &EntityEdit) -> Self {
        Self {
            name: edit.name.clone().unwrap_or_else(|| self.name.clone()),
            prompt: edit.prompt.clone().unwrap_or_else(|| self.prompt.clone()),
            ..self.clone()
        }
    }
}

/// A change to the editable fields of an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EntityEdit {
    /// New display name, if changing.
    pub name: Option<String>,
    /// New prompt text, if changing.
    pub prompt: Option<String>,
}

// ---------------------------------------------------------------------------
// Generation payload
// ---------------------------------------------------------------------------

/// What a generation collaborator returns.
///
/// Has neither identity nor timestamp: the economy controller stamps the
/// creation time and the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct GeneratedEntity {
    /// Display name.
    pub name: String,
    /// Prompt the artwork was generated from.
    pub prompt: String,
    /// Reference to the generated artwork.
    pub image_url: String,
    /// Rolled scarcity tier.
    pub rarity: Rarity,
}

impl GeneratedEntity {
    /// Stamp a creation time, producing an insertable record.
    pub fn into_new_entity(self, created_at: DateTime<Utc>) -> NewEntity {
        NewEntity {
            name: self.name,
            prompt: self.prompt,
            image_url: self.image_url,
            rarity: self.rarity,
            created_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Balance
// ---------------------------------------------------------------------------

/// The single scalar record in the settings collection.
///
/// Stored as `{ "id": "tokenBalance", "amount": <integer> }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct BalanceRecord {
    /// Always [`BALANCE_RECORD_ID`].
    pub id: String,
    /// Token amount.
    #[ts(type = "number")]
    pub amount: i64,
}

impl BalanceRecord {
    /// Build the balance record for `amount`.
    pub fn new(amount: i64) -> Self {
        Self {
            id: BALANCE_RECORD_ID.to_owned(),
            amount,
        }
    }
}
