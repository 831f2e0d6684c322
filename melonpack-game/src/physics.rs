//! Capability interface toward the external 2D physics engine.
//!
//! The merge session only issues spawn/remove commands and reads body
//! kinematics; broad-phase collision and integration stay with the
//! engine. Collision-start and danger-line events flow the other way:
//! the host forwards them into [`crate::merge::MergeSession`].
use serde::{Deserialize, Serialize};

/// Opaque handle assigned by the physics host.
pub type BodyId = u64;

/// 2D point or vector in field coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Point halfway between two positions; a merge replacement spawns here.
    #[must_use]
    pub fn midpoint(a: Self, b: Self) -> Self {
        Self {
            x: (a.x + b.x) / 2.0,
            y: (a.y + b.y) / 2.0,
        }
    }
}

/// Parameters for spawning one circular dynamic body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodySpec {
    pub position: Vec2,
    pub radius: f64,
    pub restitution: f64,
    pub friction: f64,
    pub density: f64,
}

/// Snapshot of a body's motion as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Kinematics {
    pub position: Vec2,
    pub velocity: Vec2,
    pub speed: f64,
}

/// Minimal surface the merge session needs from a physics engine.
/// Platform layers wrap the real engine; tests use an in-memory double.
pub trait PhysicsHost {
    /// Create a dynamic circular body and return its handle.
    fn spawn_body(&mut self, spec: &BodySpec) -> BodyId;

    /// Remove a body. Unknown handles must be a no-op.
    fn remove_body(&mut self, id: BodyId);

    /// Current kinematics, or `None` when the body no longer exists.
    fn kinematics(&self, id: BodyId) -> Option<Kinematics>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_is_componentwise_average() {
        let mid = Vec2::midpoint(Vec2::new(10.0, 40.0), Vec2::new(30.0, 20.0));
        assert!((mid.x - 20.0).abs() < f64::EPSILON);
        assert!((mid.y - 30.0).abs() < f64::EPSILON);
    }
}
