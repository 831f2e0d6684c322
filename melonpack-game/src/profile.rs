//! Player profile: catalog, packs, collection, and star points.
use crate::catalog::{Catalog, RewardCard};
use crate::constants::SET_COUNT;
use crate::ledger::{CollectionLedger, apply_draws};
use crate::pack::{DrawSet, PackDef, open_pack};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Everything the persistence service stores for one owner. Every field
/// defaults so a partial or older snapshot still deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProfileSnapshot {
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub packs: Vec<PackDef>,
    #[serde(default)]
    pub collection: CollectionLedger,
    #[serde(default)]
    pub star_points: u32,
    #[serde(default)]
    pub set_names: Vec<String>,
}

/// Result of opening a single pack.
#[derive(Debug, Clone, PartialEq)]
pub struct PackOpening {
    pub pack_id: u32,
    pub pack_name: String,
    pub cards: DrawSet,
    pub gained_points: u32,
}

/// Aggregated result of a bulk opening.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkOpening {
    pub packs_opened: u32,
    pub cards: Vec<RewardCard>,
    pub gained_points: u32,
}

/// In-memory session state for the pack simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub catalog: Catalog,
    pub packs: Vec<PackDef>,
    pub collection: CollectionLedger,
    pub star_points: u32,
    /// Player-assigned album set labels.
    pub set_names: Vec<String>,
}

impl Profile {
    /// First-run profile with the starter catalog and packs.
    #[must_use]
    pub fn starter<R: Rng>(rng: &mut R) -> Self {
        Self {
            catalog: Catalog::starter(rng),
            packs: PackDef::starter_set(),
            collection: CollectionLedger::new(),
            star_points: 0,
            set_names: vec![String::new(); SET_COUNT],
        }
    }

    /// Rebuild a profile from a persisted snapshot. Empty catalog or pack
    /// lists in the snapshot fall back to starter data so a truncated
    /// blob never produces an unplayable profile.
    #[must_use]
    pub fn from_snapshot<R: Rng>(snapshot: ProfileSnapshot, rng: &mut R) -> Self {
        let catalog = if snapshot.catalog.is_empty() {
            Catalog::starter(rng)
        } else {
            snapshot.catalog
        };
        let packs = if snapshot.packs.is_empty() {
            PackDef::starter_set()
        } else {
            snapshot.packs
        };
        let mut set_names = snapshot.set_names;
        set_names.resize(SET_COUNT, String::new());
        Self {
            catalog,
            packs,
            collection: snapshot.collection,
            star_points: snapshot.star_points,
            set_names,
        }
    }

    /// Snapshot for the persistence service.
    #[must_use]
    pub fn snapshot(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            catalog: self.catalog.clone(),
            packs: self.packs.clone(),
            collection: self.collection.clone(),
            star_points: self.star_points,
            set_names: self.set_names.clone(),
        }
    }

    /// Find a pack definition by id.
    #[must_use]
    pub fn pack(&self, pack_id: u32) -> Option<&PackDef> {
        self.packs.iter().find(|pack| pack.id == pack_id)
    }

    /// Open one pack and fold the result into the collection.
    /// Returns `None` for an unknown pack id.
    pub fn open_pack<R: Rng>(&mut self, pack_id: u32, rng: &mut R) -> Option<PackOpening> {
        let pack = self.pack(pack_id)?;
        let (policy, weights, name) = (pack.policy, pack.weights.clone(), pack.name.clone());
        let cards = open_pack(&policy, &weights, &self.catalog, rng);
        let gained_points = apply_draws(&cards, &mut self.collection, &mut self.star_points);
        Some(PackOpening {
            pack_id,
            pack_name: name,
            cards,
            gained_points,
        })
    }

    /// Open several packs at once. Orders name `(pack_id, count)` pairs;
    /// unknown ids and zero counts contribute nothing. Returns `None`
    /// when the orders produced no cards at all.
    pub fn open_packs<R: Rng>(&mut self, orders: &[(u32, u32)], rng: &mut R) -> Option<BulkOpening> {
        let mut cards: Vec<RewardCard> = Vec::new();
        let mut packs_opened = 0u32;
        for (pack_id, count) in orders {
            let Some(pack) = self.pack(*pack_id) else {
                continue;
            };
            let (policy, weights) = (pack.policy, pack.weights.clone());
            for _ in 0..*count {
                cards.extend(open_pack(&policy, &weights, &self.catalog, rng));
                packs_opened += 1;
            }
        }
        if cards.is_empty() {
            return None;
        }
        let gained_points = apply_draws(&cards, &mut self.collection, &mut self.star_points);
        Some(BulkOpening {
            packs_opened,
            cards,
            gained_points,
        })
    }

    /// Rename an album set; out-of-range indices are ignored.
    pub fn rename_set(&mut self, set_index: usize, name: &str) {
        if let Some(slot) = self.set_names.get_mut(set_index) {
            *slot = name.to_string();
        }
    }

    /// Collection completion in percent.
    #[must_use]
    pub fn completion_percent(&self) -> f64 {
        self.collection.completion_percent(&self.catalog)
    }

    /// Wipe everything back to starter data.
    pub fn reset<R: Rng>(&mut self, rng: &mut R) {
        *self = Self::starter(rng);
    }
}
