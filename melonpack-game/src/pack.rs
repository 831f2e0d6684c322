//! Pack definitions, rarity weight tables, and the draw orchestrator.
#[cfg(debug_assertions)]
use crate::constants::DEBUG_ENV_VAR;
use crate::constants::{
    MAX_TIER, STARTER_GOLD4_WEIGHT, STARTER_GOLD5_WEIGHT, STARTER_PACK_COUNT, STARTER_PACK_DRAWS,
    STARTER_PACK_FLOOR_COUNT, STARTER_PACK_FLOOR_TIER, STARTER_TIER_WEIGHTS,
};
use crate::catalog::{Catalog, RewardCard};
use crate::sampler::sample_weighted;
use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[cfg(debug_assertions)]
fn debug_log_enabled() -> bool {
    matches!(std::env::var(DEBUG_ENV_VAR), Ok(val) if val != "0")
}

#[cfg(not(debug_assertions))]
const fn debug_log_enabled() -> bool {
    false
}

/// Cards produced by opening one pack. Inline capacity covers the
/// standard five-card pack without allocating.
pub type DrawSet = SmallVec<[RewardCard; 8]>;

/// One `(tier, gold)` slot of a weight table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierWeight {
    pub tier: u8,
    #[serde(default)]
    pub gold: bool,
    pub weight: f64,
}

/// Ordered rarity weights. The slot order is the sampler scan order and
/// is part of the table's contract; it is never re-sorted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct WeightTable {
    pub slots: Vec<TierWeight>,
}

impl WeightTable {
    /// Standard seven-slot table: gold 5, gold 4, then plain tiers rarest
    /// first. `rarity` holds plain-tier weights indexed tier 1 through 5.
    #[must_use]
    pub fn standard(rarity: [f64; 5], gold4: f64, gold5: f64) -> Self {
        let slots = vec![
            TierWeight { tier: 5, gold: true, weight: gold5 },
            TierWeight { tier: 4, gold: true, weight: gold4 },
            TierWeight { tier: 5, gold: false, weight: rarity[4] },
            TierWeight { tier: 4, gold: false, weight: rarity[3] },
            TierWeight { tier: 3, gold: false, weight: rarity[2] },
            TierWeight { tier: 2, gold: false, weight: rarity[1] },
            TierWeight { tier: 1, gold: false, weight: rarity[0] },
        ];
        Self { slots }
    }

    /// Weight of the first slot matching `(tier, gold)`, 0 when absent.
    #[must_use]
    pub fn slot_weight(&self, tier: u8, gold: bool) -> f64 {
        self.slots
            .iter()
            .find(|slot| slot.tier == tier && slot.gold == gold)
            .map_or(0.0, |slot| slot.weight)
    }

    /// Slots at or above `min_tier`, in table order, as sampler candidates.
    #[must_use]
    pub fn floored(&self, min_tier: u8) -> Vec<(f64, (u8, bool))> {
        self.slots
            .iter()
            .filter(|slot| slot.tier >= min_tier)
            .map(|slot| (slot.weight.max(0.0), (slot.tier, slot.gold)))
            .collect()
    }
}

/// How many cards a pack yields and what its guaranteed slots promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawPolicy {
    pub total_draws: u32,
    /// Minimum tier for the guaranteed slots.
    pub floor_tier: u8,
    /// How many of the draws obey `floor_tier`.
    pub floor_count: u32,
}

impl DrawPolicy {
    /// Clamp the policy into the valid range. Invalid numeric configuration
    /// is repaired here so the draw path never observes it.
    #[must_use]
    pub fn normalized(self) -> Self {
        let total_draws = self.total_draws.max(1);
        Self {
            total_draws,
            floor_tier: self.floor_tier.clamp(1, MAX_TIER),
            floor_count: self.floor_count.min(total_draws),
        }
    }
}

impl Default for DrawPolicy {
    fn default() -> Self {
        Self {
            total_draws: STARTER_PACK_DRAWS,
            floor_tier: STARTER_PACK_FLOOR_TIER,
            floor_count: STARTER_PACK_FLOOR_COUNT,
        }
    }
}

/// A purchasable pack: presentation fields plus draw rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackDef {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub policy: DrawPolicy,
    pub weights: WeightTable,
}

impl PackDef {
    /// The twelve starter packs used when no snapshot exists.
    #[must_use]
    pub fn starter_set() -> Vec<Self> {
        (1..=STARTER_PACK_COUNT)
            .map(|id| Self {
                id,
                name: format!("Vol.{id} Starter Pack"),
                image: format!("pack_{id}.png"),
                policy: DrawPolicy::default(),
                weights: WeightTable::standard(
                    STARTER_TIER_WEIGHTS,
                    STARTER_GOLD4_WEIGHT,
                    STARTER_GOLD5_WEIGHT,
                ),
            })
            .collect()
    }
}

/// Draw a single card with a tier floor.
///
/// The weight table is restricted to `tier >= min_tier` in table order; a
/// degenerate (all-zero) restriction resolves to the plain `min_tier` slot
/// instead of failing. Returns `None` only for an empty catalog.
pub fn draw_card<R: Rng>(
    catalog: &Catalog,
    table: &WeightTable,
    min_tier: u8,
    rng: &mut R,
) -> Option<RewardCard> {
    let candidates = table.floored(min_tier);
    let fallback = (min_tier, false);
    let (tier, gold) = *sample_weighted(&candidates, &fallback, rng);

    if debug_log_enabled() {
        println!("Pack draw | floor:{min_tier} slot:{tier}{}", if gold { "g" } else { "" });
    }

    catalog.pick_card(tier, gold, rng).cloned()
}

/// Open one pack: the unconstrained draws first, then the guaranteed
/// slots floored at the policy tier. Output order between the two groups
/// is not part of the contract; callers treat the result as a multiset.
pub fn open_pack<R: Rng>(
    policy: &DrawPolicy,
    table: &WeightTable,
    catalog: &Catalog,
    rng: &mut R,
) -> DrawSet {
    let policy = policy.normalized();
    let mut drawn = DrawSet::new();
    if catalog.is_empty() {
        return drawn;
    }

    let free = policy.total_draws - policy.floor_count;
    for _ in 0..free {
        if let Some(card) = draw_card(catalog, table, 1, rng) {
            drawn.push(card);
        }
    }
    for _ in 0..policy.floor_count {
        if let Some(card) = draw_card(catalog, table, policy.floor_tier, rng) {
            drawn.push(card);
        }
    }
    drawn
}
