//! Shared type definitions for Tokendex.
//!
//! This crate is the single source of truth for the records that flow
//! between the persistence layer, the economy controller, and the
//! rendering layer. Types are exported to `TypeScript` via `ts-rs` so the
//! front end reads the same shapes that are stored on disk.
//!
//! # Modules
//!
//! - [`ids`] -- Store-assigned identifier wrapper
//! - [`enums`] -- Rarity tiers
//! - [`structs`] -- Entity records, generation payloads, the balance record

pub mod enums;
pub mod ids;
pub mod structs;

pub use enums::Rarity;
pub use ids::EntityId;
pub use structs::{
    BALANCE_RECORD_ID, BalanceRecord, Entity, EntityEdit, GeneratedEntity, NewEntity,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the rendering layer.

    #[test]
    fn export_bindings() {
        use ts_rs::TS;

        let _ = crate::ids::EntityId::export_all();
        let _ = crate::enums::Rarity::export_all();
        let _ = crate::structs::Entity::export_all();
        let _ = crate::structs::NewEntity::export_all();
        let _ = crate::structs::EntityEdit::export_all();
        let _ = crate::structs::GeneratedEntity::export_all();
        let _ = crate::structs::BalanceRecord::export_all();
    }
}
