//! Fixed economy constants and the rarity price table.

use tokendex_types::Rarity;

/// Balance granted on first run.
pub const INITIAL_BALANCE: i64 = 100;

/// Tokens debited to create one entity.
pub const CREATION_COST: i64 = 10;

/// Sale price of the lowest tier, also used for unrecognized labels.
const LOWEST_PRICE: i64 = 2;

/// Tokens credited for selling an entity of the given rarity.
///
/// Strictly increasing with rank.
pub const fn sell_price(rarity: Rarity) -> i64 {
    match rarity {
        Rarity::F => LOWEST_PRICE,
        Rarity::E => 3,
        Rarity::D => 5,
        Rarity::C => 7,
        Rarity::B => 10,
        Rarity::A => 15,
        Rarity::S => 25,
        Rarity::SPlus => 50,
    }
}

/// Sale price for a raw rarity label.
///
/// Unrecognized labels fall back to the lowest tier's price instead of
/// failing.
pub fn sell_price_for_label(label: &str) -> i64 {
    Rarity::parse_label(label).map_or(LOWEST_PRICE, sell_price)
}
