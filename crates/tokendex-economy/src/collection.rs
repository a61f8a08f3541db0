//! Collection views: sort orders and aggregate statistics.

use tokendex_types::Entity;

use crate::pricing::sell_price;

/// Display order for the collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    /// Newest first.
    #[default]
    DateDesc,
    /// Oldest first.
    DateAsc,
    /// Rarest first, newest first within a tier.
    RarityDesc,
    /// Most common first, newest first within a tier.
    RarityAsc,
}

/// Return `entities` in `order`.
///
/// Ties on the sort key fall back to newest first, then to id, so the
/// result is deterministic.
pub fn sorted(entities: &[Entity], order: SortOrder) -> Vec<Entity> {
    let mut out = entities.to_vec();
    let newest_first =
        |a: &Entity, b: &Entity| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id));
    match order {
        SortOrder::DateDesc => out.sort_by(newest_first),
        SortOrder::DateAsc => out.sort_by(|a, b| newest_first(b, a)),
        SortOrder::RarityDesc => {
            out.sort_by(|a, b| b.rarity.cmp(&a.rarity).then_with(|| newest_first(a, b)));
        }
        SortOrder::RarityAsc => {
            out.sort_by(|a, b| a.rarity.cmp(&b.rarity).then_with(|| newest_first(a, b)));
        }
    }
    out
}

/// Aggregate view of the player's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStats {
    /// Number of entities owned.
    pub count: usize,
    /// Current balance.
    pub balance: i64,
    /// What the whole collection would sell for.
    pub collection_value: i64,
    /// `balance + collection_value - initial_balance`.
    pub net_result: i64,
}

impl CollectionStats {
    /// Compute statistics for `entities` at `balance`.
    pub fn compute(balance: i64, entities: &[Entity], initial_balance: i64) -> Self {
        let collection_value = entities
            .iter()
            .map(|e| sell_price(e.rarity))
            .fold(0_i64, i64::saturating_add);
        Self {
            count: entities.len(),
            balance,
            collection_value,
            net_result: balance
                .saturating_add(collection_value)
                .saturating_sub(initial_balance),
        }
    }
}
