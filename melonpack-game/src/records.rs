//! Conversion between already-parsed import rows and domain types.
//!
//! CSV tokenizing and text decoding are caller concerns; this module only
//! deals in typed rows and applies the import defaulting rules.
use crate::catalog::{Catalog, RewardCard};
use crate::constants::CATALOG_SIZE;
use crate::pack::{DrawPolicy, PackDef, WeightTable};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Import failures surfaced to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("import contained no usable rows")]
    Empty,
}

/// One parsed card row. `None` fields take the import defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardRecord {
    pub id: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tier: Option<u8>,
    #[serde(default)]
    pub gold: bool,
}

/// One parsed pack row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackRecord {
    pub id: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub total_draws: Option<u32>,
    #[serde(default)]
    pub floor_tier: Option<u8>,
    #[serde(default)]
    pub floor_count: Option<u32>,
    /// Plain-tier weights indexed tier 1 through 5.
    #[serde(default)]
    pub rarity: [f64; 5],
    #[serde(default)]
    pub gold4: f64,
    #[serde(default)]
    pub gold5: f64,
}

/// Overlay card rows onto a base catalog.
///
/// Rows outside the catalog id range are skipped; accepted rows replace
/// the base card of the same id. Returns the merged catalog and how many
/// rows were applied. An import that applies nothing still succeeds with
/// the base catalog intact.
#[must_use]
pub fn apply_card_records(base: &Catalog, records: &[CardRecord]) -> (Catalog, usize) {
    let mut cards: Vec<RewardCard> = base.cards.clone();
    let mut applied = 0usize;
    for record in records {
        if record.id < 1 || record.id > CATALOG_SIZE {
            continue;
        }
        let card = RewardCard {
            id: record.id,
            name: record
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| format!("Card No.{}", record.id)),
            image: record.image.clone().unwrap_or_default(),
            tier: record.tier.unwrap_or(1).max(1),
            gold: record.gold,
        };
        cards.push(card);
        applied += 1;
    }
    (Catalog::from_cards(cards), applied)
}

/// Build the pack list from parsed rows, replacing any previous list.
///
/// # Errors
///
/// Returns [`RecordError::Empty`] when no rows were supplied; an empty
/// import must not wipe the existing packs.
pub fn packs_from_records(records: &[PackRecord]) -> Result<Vec<PackDef>, RecordError> {
    if records.is_empty() {
        return Err(RecordError::Empty);
    }
    let mut packs: Vec<PackDef> = records
        .iter()
        .map(|record| PackDef {
            id: record.id,
            name: record
                .name
                .clone()
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| format!("Pack {}", record.id)),
            image: record.image.clone().unwrap_or_default(),
            policy: DrawPolicy {
                total_draws: record.total_draws.unwrap_or(5),
                floor_tier: record.floor_tier.unwrap_or(1),
                floor_count: record.floor_count.unwrap_or(0),
            }
            .normalized(),
            weights: WeightTable::standard(record.rarity, record.gold4, record.gold5),
        })
        .collect();
    packs.sort_by_key(|pack| pack.id);
    Ok(packs)
}

/// Export a catalog as rows, ready for CSV encoding by the caller.
#[must_use]
pub fn card_records(catalog: &Catalog) -> Vec<CardRecord> {
    catalog
        .cards
        .iter()
        .map(|card| CardRecord {
            id: card.id,
            name: Some(card.name.clone()),
            image: Some(card.image.clone()),
            tier: Some(card.tier),
            gold: card.gold,
        })
        .collect()
}

/// Export packs as rows, ready for CSV encoding by the caller.
#[must_use]
pub fn pack_records(packs: &[PackDef]) -> Vec<PackRecord> {
    packs
        .iter()
        .map(|pack| PackRecord {
            id: pack.id,
            name: Some(pack.name.clone()),
            image: Some(pack.image.clone()),
            total_draws: Some(pack.policy.total_draws),
            floor_tier: Some(pack.policy.floor_tier),
            floor_count: Some(pack.policy.floor_count),
            rarity: [
                pack.weights.slot_weight(1, false),
                pack.weights.slot_weight(2, false),
                pack.weights.slot_weight(3, false),
                pack.weights.slot_weight(4, false),
                pack.weights.slot_weight(5, false),
            ],
            gold4: pack.weights.slot_weight(4, true),
            gold5: pack.weights.slot_weight(5, true),
        })
        .collect()
}
