//! Weighted rarity rolls.
//!
//! Weights are integer shares out of their sum, so odds never depend on
//! float rounding.

use rand::Rng;
use serde::Deserialize;
use tokendex_types::Rarity;

/// Relative odds of each tier, indexed by [`Rarity::rank`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RarityWeights([u32; 8]);

impl Default for RarityWeights {
    /// 30 / 25 / 18 / 12 / 8 / 4 / 2 / 1 out of 100.
    fn default() -> Self {
        Self([30, 25, 18, 12, 8, 4, 2, 1])
    }
}

impl RarityWeights {
    /// Build weights from eight shares, `F` first.
    pub const fn new(shares: [u32; 8]) -> Self {
        Self(shares)
    }

    /// Sum of all shares.
    pub fn total(&self) -> u32 {
        self.0.iter().fold(0_u32, |acc, w| acc.saturating_add(*w))
    }

    /// Share of one tier.
    pub fn weight(&self, rarity: Rarity) -> u32 {
        self.0
            .get(usize::from(rarity.rank()))
            .copied()
            .unwrap_or_default()
    }

    /// Roll a tier.
    ///
    /// All-zero weights always yield [`Rarity::F`].
    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> Rarity {
        let total = self.total();
        if total == 0 {
            return Rarity::F;
        }
        self.pick(rng.random_range(0..total))
    }

    /// The tier whose cumulative range contains `ticket`.
    fn pick(&self, ticket: u32) -> Rarity {
        let mut upper = 0_u32;
        for rarity in Rarity::ALL {
            upper = upper.saturating_add(self.weight(rarity));
            if ticket < upper {
                return rarity;
            }
        }
        Rarity::SPlus
    }
}
