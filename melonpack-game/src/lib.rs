//! Melonpack Game Core
//!
//! Platform-agnostic simulation logic for the Melonpack prototype pages:
//! the probability-weighted pack opener and the fruit merge-chain game.
//! This crate provides the draw, ledger, and session mechanics without UI
//! or platform-specific dependencies; rendering, physics integration, and
//! the hosted persistence service live in the platform layers.

pub mod catalog;
pub mod constants;
pub mod ledger;
pub mod merge;
pub mod pack;
pub mod physics;
pub mod profile;
pub mod records;
pub mod sampler;

// Re-export commonly used types
pub use catalog::{Catalog, RewardCard};
pub use ledger::{CollectionLedger, apply_draws};
pub use merge::{
    EndReason, FruitDef, MergeConfig, MergeOutcome, MergePhase, MergeRecords, MergeSession,
    ShotOutcome, TimerRequest, normalize_spawn_weights,
};
pub use pack::{DrawPolicy, DrawSet, PackDef, TierWeight, WeightTable, draw_card, open_pack};
pub use physics::{BodyId, BodySpec, Kinematics, PhysicsHost, Vec2};
pub use profile::{BulkOpening, PackOpening, Profile, ProfileSnapshot};
pub use records::{
    CardRecord, PackRecord, RecordError, apply_card_records, card_records, pack_records,
    packs_from_records,
};
pub use sampler::sample_weighted;

use rand::Rng;

/// Trait for abstracting snapshot persistence.
/// Platform-specific implementations should provide this.
pub trait SnapshotStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the snapshot for an owner, `None` on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing service fails.
    fn load(&self, owner: &str) -> Result<Option<ProfileSnapshot>, Self::Error>;

    /// Persist the snapshot for an owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn save(&self, owner: &str, snapshot: &ProfileSnapshot) -> Result<(), Self::Error>;

    /// Delete the snapshot for an owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be deleted.
    fn delete(&self, owner: &str) -> Result<(), Self::Error>;
}

/// Facade binding a snapshot store to profile lifecycle operations.
pub struct ProfileManager<S>
where
    S: SnapshotStore,
{
    store: S,
}

impl<S> ProfileManager<S>
where
    S: SnapshotStore,
{
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Load the owner's profile, treating a missing or failing snapshot
    /// as first run: both resolve to starter data rather than an error.
    pub fn load_or_default<R: Rng>(&self, owner: &str, rng: &mut R) -> Profile {
        match self.store.load(owner) {
            Ok(Some(snapshot)) => Profile::from_snapshot(snapshot, rng),
            Ok(None) | Err(_) => Profile::starter(rng),
        }
    }

    /// Persist the profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the write.
    pub fn save(&self, owner: &str, profile: &Profile) -> Result<(), anyhow::Error> {
        self.store
            .save(owner, &profile.snapshot())
            .map_err(anyhow::Error::new)
    }

    /// Remove the owner's snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the delete.
    pub fn reset_remote(&self, owner: &str) -> Result<(), anyhow::Error> {
        self.store.delete(owner).map_err(anyhow::Error::new)
    }

    /// Borrow the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }
}
