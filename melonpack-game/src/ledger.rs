//! Collection ledger and star-point bookkeeping.
use crate::catalog::{Catalog, RewardCard};
use crate::constants::{SET_COUNT, SET_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which card ids have been obtained at least once.
///
/// A card's count moves from absent to 1 exactly once; duplicate draws
/// feed star points instead of stacking the count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CollectionLedger {
    owned: BTreeMap<u32, u32>,
}

impl CollectionLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the card id has been collected.
    #[must_use]
    pub fn contains(&self, id: u32) -> bool {
        self.owned.get(&id).is_some_and(|count| *count > 0)
    }

    /// Number of distinct collected ids.
    #[must_use]
    pub fn owned_count(&self) -> usize {
        self.owned.values().filter(|count| **count > 0).count()
    }

    /// Completion share against a catalog, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn completion_percent(&self, catalog: &Catalog) -> f64 {
        if catalog.is_empty() {
            return 0.0;
        }
        let owned = catalog
            .cards
            .iter()
            .filter(|card| self.contains(card.id))
            .count();
        owned as f64 / catalog.len() as f64 * 100.0
    }

    /// Collected/total counts for one album set. Sets partition the
    /// catalog in order, `SET_SIZE` cards each.
    #[must_use]
    pub fn set_completion(&self, catalog: &Catalog, set_index: usize) -> (usize, usize) {
        if set_index >= SET_COUNT {
            return (0, 0);
        }
        let start = set_index * SET_SIZE;
        let cards = catalog
            .cards
            .iter()
            .skip(start)
            .take(SET_SIZE)
            .collect::<Vec<_>>();
        let collected = cards.iter().filter(|card| self.contains(card.id)).count();
        (collected, cards.len())
    }

    /// Drop every collected card.
    pub fn reset(&mut self) {
        self.owned.clear();
    }
}

/// Fold a batch of drawn cards into the ledger and points counter.
///
/// Single left-to-right pass: an unseen id is marked collected with no
/// points; an already-owned id, including one first seen earlier in this
/// same batch, earns one point. Returns the points gained by this call.
pub fn apply_draws(
    cards: &[RewardCard],
    ledger: &mut CollectionLedger,
    points: &mut u32,
) -> u32 {
    let mut gained = 0u32;
    for card in cards {
        if ledger.contains(card.id) {
            gained += 1;
        } else {
            ledger.owned.insert(card.id, 1);
        }
    }
    *points = points.saturating_add(gained);
    gained
}
