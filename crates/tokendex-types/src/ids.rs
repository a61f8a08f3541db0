//! Identifier wrapper for stored entities.
//!
//! The persistence engine assigns integer identities on insert from a
//! monotonically increasing counter. Wrapping the raw `i64` keeps entity
//! ids from being mixed up with balances or prices at compile time.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Store-assigned identity of an [`Entity`](crate::Entity).
///
/// Only the persistence engine mints these. An entity that has not been
/// inserted yet is a [`NewEntity`](crate::NewEntity) and has no id at all.
/// Serializes as the bare integer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub struct EntityId(#[ts(type = "number")] pub i64);

impl EntityId {
    /// Return the inner integer key.
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl core::fmt::Display for EntityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<EntityId> for i64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}
