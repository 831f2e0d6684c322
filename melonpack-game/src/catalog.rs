//! Reward card catalog and draw-pool resolution.
use crate::constants::{CATALOG_SIZE, MAX_TIER, STARTER_GOLD_RATE};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single collectible card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardCard {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub image: String,
    /// Rarity tier, 1 (common) and up.
    #[serde(default = "default_tier")]
    pub tier: u8,
    /// Gold-art variant flag; gold cards live in their own draw pools.
    #[serde(default)]
    pub gold: bool,
}

fn default_tier() -> u8 {
    1
}

/// Ordered card list. Ids are unique; construction enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Catalog {
    pub cards: Vec<RewardCard>,
}

impl Catalog {
    /// Build a catalog from arbitrary cards. Duplicate ids collapse to the
    /// last occurrence and the result is sorted by id.
    #[must_use]
    pub fn from_cards(cards: Vec<RewardCard>) -> Self {
        let mut by_id: BTreeMap<u32, RewardCard> = BTreeMap::new();
        for card in cards {
            by_id.insert(card.id, card);
        }
        Self {
            cards: by_id.into_values().collect(),
        }
    }

    /// The built-in 108-card starter set used when no snapshot exists.
    ///
    /// Tier follows the id pattern of the starter data (every 3rd card is
    /// tier 2, every 9th tier 3, every 27th tier 4, the last card tier 5)
    /// and roughly one card in ten is stamped gold.
    #[must_use]
    pub fn starter<R: Rng>(rng: &mut R) -> Self {
        let cards = (1..=CATALOG_SIZE)
            .map(|id| RewardCard {
                id,
                name: format!("Card No.{id:03}"),
                image: format!("img_{id}.png"),
                tier: starter_tier(id),
                gold: rng.gen_bool(STARTER_GOLD_RATE),
            })
            .collect();
        Self { cards }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Find a card by id.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&RewardCard> {
        self.cards.iter().find(|card| card.id == id)
    }

    /// Resolve the draw pool for a `(tier, gold)` slot.
    ///
    /// The fallback chain is fixed: exact match, then tier ignoring the
    /// gold flag, then the whole catalog. Some tier/variant combinations
    /// legitimately have no cards (e.g. no gold art below tier 4) and a
    /// draw must still produce something.
    #[must_use]
    pub fn resolve_pool(&self, tier: u8, gold: bool) -> Vec<&RewardCard> {
        let exact: Vec<&RewardCard> = self
            .cards
            .iter()
            .filter(|card| card.tier == tier && card.gold == gold)
            .collect();
        if !exact.is_empty() {
            return exact;
        }

        let tier_only: Vec<&RewardCard> =
            self.cards.iter().filter(|card| card.tier == tier).collect();
        if !tier_only.is_empty() {
            return tier_only;
        }

        self.cards.iter().collect()
    }

    /// Resolve the pool for a slot and pick one card uniformly.
    /// Returns `None` only when the catalog itself is empty.
    #[must_use]
    pub fn pick_card<R: Rng>(&self, tier: u8, gold: bool, rng: &mut R) -> Option<&RewardCard> {
        let pool = self.resolve_pool(tier, gold);
        if pool.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0..pool.len());
        pool.get(idx).copied()
    }
}

/// Rarity tier assigned to a starter-catalog id.
#[must_use]
pub(crate) const fn starter_tier(id: u32) -> u8 {
    if id == CATALOG_SIZE {
        return MAX_TIER;
    }
    let mut tier = 1;
    if id % 3 == 0 {
        tier = 2;
    }
    if id % 9 == 0 {
        tier = 3;
    }
    if id % 27 == 0 {
        tier = 4;
    }
    tier
}
