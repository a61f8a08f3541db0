//! Enumeration types for Tokendex.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Rarity
// ---------------------------------------------------------------------------

/// Scarcity tier of a collectible entity.
///
/// Tiers are ordered from most common (`F`) to rarest (`S+`). The derived
/// [`Ord`] follows declaration order, so `Rarity::F < Rarity::SPlus`.
/// Rarity drives both the display label and the sale price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Rarity {
    /// Lowest tier.
    F,
    /// Common.
    E,
    /// Uncommon.
    D,
    /// Uncommon.
    C,
    /// Rare.
    B,
    /// Rare.
    A,
    /// Epic.
    S,
    /// Legendary, serialized as `"S+"`.
    #[serde(rename = "S+")]
    SPlus,
}

impl Rarity {
    /// Every tier, in ascending scarcity.
    pub const ALL: [Self; 8] = [
        Self::F,
        Self::E,
        Self::D,
        Self::C,
        Self::B,
        Self::A,
        Self::S,
        Self::SPlus,
    ];

    /// Zero-based scarcity rank (`F` is 0, `S+` is 7).
    pub const fn rank(self) -> u8 {
        match self {
            Self::F => 0,
            Self::E => 1,
            Self::D => 2,
            Self::C => 3,
            Self::B => 4,
            Self::A => 5,
            Self::S => 6,
            Self::SPlus => 7,
        }
    }

    /// The short code as stored and shown on cards (`"F"` .. `"S+"`).
    pub const fn code(self) -> &'static str {
        match self {
            Self::F => "F",
            Self::E => "E",
            Self::D => "D",
            Self::C => "C",
            Self::B => "B",
            Self::A => "A",
            Self::S => "S",
            Self::SPlus => "S+",
        }
    }

    /// Human-readable tier name.
    pub const fn label(self) -> &'static str {
        match self {
            Self::F | Self::E => "Common",
            Self::D | Self::C => "Uncommon",
            Self::B | Self::A => "Rare",
            Self::S => "Epic",
            Self::SPlus => "Legendary",
        }
    }

    /// Parse a short code, ignoring surrounding whitespace and case.
    ///
    /// Returns `None` for anything that is not one of the eight codes.
    pub fn parse_label(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        Self::ALL
            .into_iter()
            .find(|tier| tier.code().eq_ignore_ascii_case(trimmed))
    }
}

impl core::fmt::Display for Rarity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}
