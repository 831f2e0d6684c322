//! Centralized balance and tuning constants for Melonpack game logic.
//!
//! These values define the deterministic math for both simulation cores.
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, rather than through external
//! JSON assets.

// Logging keys -------------------------------------------------------------
pub(crate) const DEBUG_ENV_VAR: &str = "MELONPACK_DEBUG_LOGS";

// Card catalog -------------------------------------------------------------
/// Number of cards in the starter catalog.
pub const CATALOG_SIZE: u32 = 108;
/// Number of album sets the catalog is partitioned into.
pub const SET_COUNT: usize = 12;
/// Cards per album set.
pub const SET_SIZE: usize = 9;
/// Fraction of starter cards stamped as the gold variant.
pub(crate) const STARTER_GOLD_RATE: f64 = 0.1;
/// Highest rarity tier in the standard weight table.
pub const MAX_TIER: u8 = 5;

// Pack tuning --------------------------------------------------------------
pub(crate) const STARTER_PACK_COUNT: u32 = 12;
pub(crate) const STARTER_PACK_DRAWS: u32 = 5;
pub(crate) const STARTER_PACK_FLOOR_TIER: u8 = 3;
pub(crate) const STARTER_PACK_FLOOR_COUNT: u32 = 1;
/// Tier weights for the starter packs, tier 1 through 5.
pub(crate) const STARTER_TIER_WEIGHTS: [f64; 5] = [50.0, 20.0, 15.0, 10.0, 5.0];
pub(crate) const STARTER_GOLD4_WEIGHT: f64 = 0.9;
pub(crate) const STARTER_GOLD5_WEIGHT: f64 = 0.1;

// Merge field geometry -----------------------------------------------------
/// Playfield width in world units (1:1.3 aspect against the height).
pub const FIELD_WIDTH: f64 = 358.0;
/// Playfield height in world units.
pub const FIELD_HEIGHT: f64 = 475.0;
/// Fruit radii are authored against a 720-unit board and scaled down.
pub(crate) const FRUIT_SCALE_RATIO: f64 = 358.0 / 720.0;
/// Side wall thickness; spawn x is clamped inside the walls.
pub const WALL_THICKNESS: f64 = 10.0;
/// Height at which shots enter the field, above the danger line.
pub const SPAWN_HEIGHT: f64 = 30.0;

// Merge session tuning -----------------------------------------------------
pub(crate) const DEFAULT_MAX_LEVEL: u8 = 11;
pub(crate) const DEFAULT_SPAWN_MAX_LEVEL: u8 = 5;
pub(crate) const DEFAULT_TOTAL_SHOTS: u32 = 50;
pub(crate) const DEFAULT_CLEAR_BONUS: u32 = 100;
/// Danger line height as a percentage of the field, measured from the top.
pub(crate) const DEFAULT_DEAD_LINE_PERCENT: f64 = 20.0;
/// Upcoming spawns kept visible to the player.
pub(crate) const SPAWN_QUEUE_LEN: usize = 10;
/// Post-spawn window during which a fruit is exempt from danger checks.
pub(crate) const DEFAULT_SPAWN_GRACE_MS: u64 = 1_000;
/// Post-merge window for the replacement fruit; observed revisions range
/// from 200ms to 1500ms, so this stays configuration rather than a rule.
pub(crate) const DEFAULT_MERGE_GRACE_MS: u64 = 200;
/// Settling time granted after the final shot before NO_SHOT is judged.
pub(crate) const DEFAULT_NO_SHOT_GRACE_MS: u64 = 3_000;
/// Speed below which a fruit on the danger line counts as resting.
pub(crate) const DEFAULT_REST_SPEED_EPSILON: f64 = 0.1;

// Spawn weight normalization -----------------------------------------------
/// Normalized spawn weights are rounded to one decimal place.
pub(crate) const WEIGHT_ROUND_SCALE: f64 = 10.0;
pub(crate) const WEIGHT_TARGET_SUM: f64 = 100.0;
