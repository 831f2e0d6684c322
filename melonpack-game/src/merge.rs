//! Merge-chain session state machine.
//!
//! The session owns the rules of the drop-and-combine loop: spawn queue,
//! shot budget, merge promotion, the danger-line end condition, and the
//! clear condition at the top of the chain. Physics stays with the host
//! behind [`PhysicsHost`]; the host forwards collision events in and
//! executes the spawn/remove commands the session issues.
use crate::constants::{
    DEFAULT_CLEAR_BONUS, DEFAULT_DEAD_LINE_PERCENT, DEFAULT_MAX_LEVEL, DEFAULT_MERGE_GRACE_MS,
    DEFAULT_NO_SHOT_GRACE_MS, DEFAULT_REST_SPEED_EPSILON, DEFAULT_SPAWN_GRACE_MS,
    DEFAULT_SPAWN_MAX_LEVEL, DEFAULT_TOTAL_SHOTS, FIELD_HEIGHT, FIELD_WIDTH, FRUIT_SCALE_RATIO,
    SPAWN_HEIGHT, SPAWN_QUEUE_LEN, WALL_THICKNESS, WEIGHT_ROUND_SCALE, WEIGHT_TARGET_SUM,
};
use crate::physics::{BodyId, BodySpec, PhysicsHost, Vec2};
use crate::sampler::sample_weighted;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// One rung of the merge chain, including the physics material the host
/// should give its body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FruitDef {
    /// Chain level, 1 and up. Two touching fruits of equal level merge
    /// into one fruit of the next level.
    pub level: u8,
    pub name: String,
    pub radius: f64,
    /// Relative weight in the spawn queue draw; 0 means never spawned.
    #[serde(default)]
    pub spawn_weight: f64,
    pub restitution: f64,
    pub friction: f64,
    pub density: f64,
}

impl FruitDef {
    /// The eleven-fruit starter chain. Small fruits bounce, big fruits
    /// sit heavy; only the first five levels ever spawn by default.
    #[must_use]
    pub fn starter_table() -> Vec<Self> {
        const ROWS: [(&str, f64, f64, f64, f64, f64); 11] = [
            ("Raspberry", 48.0, 20.0, 0.5, 0.01, 0.001),
            ("Blueberry", 68.0, 20.0, 0.5, 0.01, 0.001),
            ("Lime", 95.0, 15.0, 0.45, 0.01, 0.001),
            ("Mangosteen", 124.0, 15.0, 0.4, 0.01, 0.001),
            ("Dragonfruit", 152.0, 15.0, 0.35, 0.02, 0.0015),
            ("Papaya", 180.0, 10.0, 0.3, 0.02, 0.0015),
            ("Mango", 208.0, 5.0, 0.25, 0.03, 0.002),
            ("Pineapple", 222.0, 0.0, 0.2, 0.03, 0.002),
            ("Durian", 295.0, 0.0, 0.2, 0.05, 0.0025),
            ("Coconut", 358.0, 0.0, 0.1, 0.1, 0.003),
            ("Watermelon", 460.0, 0.0, 0.1, 0.1, 0.003),
        ];
        ROWS.iter()
            .enumerate()
            .map(|(idx, (name, diameter, weight, restitution, friction, density))| Self {
                level: idx as u8 + 1,
                name: (*name).to_string(),
                radius: diameter / 2.0 * FRUIT_SCALE_RATIO,
                spawn_weight: *weight,
                restitution: *restitution,
                friction: *friction,
                density: *density,
            })
            .collect()
    }
}

/// Tunable session rules. Grace windows differ between observed source
/// revisions, so they are configuration rather than fixed behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeConfig {
    /// Top of the chain; a merge that would reach it clears the session.
    pub max_level: u8,
    /// Highest level the spawn queue may produce.
    pub spawn_max_level: u8,
    pub total_shots: u32,
    /// Score awarded for reaching the top of the chain.
    pub clear_bonus: u32,
    /// Danger line height, percent of the field measured from the top.
    pub dead_line_percent: f64,
    pub field_width: f64,
    pub field_height: f64,
    pub wall_thickness: f64,
    pub spawn_height: f64,
    pub queue_len: usize,
    pub spawn_grace_ms: u64,
    pub merge_grace_ms: u64,
    pub no_shot_grace_ms: u64,
    pub rest_speed_epsilon: f64,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            max_level: DEFAULT_MAX_LEVEL,
            spawn_max_level: DEFAULT_SPAWN_MAX_LEVEL,
            total_shots: DEFAULT_TOTAL_SHOTS,
            clear_bonus: DEFAULT_CLEAR_BONUS,
            dead_line_percent: DEFAULT_DEAD_LINE_PERCENT,
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,
            wall_thickness: WALL_THICKNESS,
            spawn_height: SPAWN_HEIGHT,
            queue_len: SPAWN_QUEUE_LEN,
            spawn_grace_ms: DEFAULT_SPAWN_GRACE_MS,
            merge_grace_ms: DEFAULT_MERGE_GRACE_MS,
            no_shot_grace_ms: DEFAULT_NO_SHOT_GRACE_MS,
            rest_speed_epsilon: DEFAULT_REST_SPEED_EPSILON,
        }
    }
}

impl MergeConfig {
    /// Clamp every field into its valid range. Out-of-range configuration
    /// is repaired at this boundary so the session logic never sees it.
    #[must_use]
    pub fn normalized(self) -> Self {
        let max_level = self.max_level.max(2);
        Self {
            max_level,
            spawn_max_level: self.spawn_max_level.clamp(1, max_level - 1),
            total_shots: self.total_shots.max(1),
            dead_line_percent: self.dead_line_percent.clamp(0.0, 100.0),
            queue_len: self.queue_len.max(1),
            rest_speed_epsilon: self.rest_speed_epsilon.max(0.0),
            ..self
        }
    }

    /// Vertical position of the danger line in field coordinates.
    #[must_use]
    pub fn dead_line_y(&self) -> f64 {
        self.field_height * (self.dead_line_percent / 100.0)
    }
}

/// Session lifecycle. `GameOver` and `Cleared` are terminal until
/// [`MergeSession::start`] runs again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MergePhase {
    #[default]
    Ready,
    Playing,
    GameOver,
    Cleared,
}

/// Why a session ended. Reasons are mutually exclusive and recorded once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A rested fruit crossed the danger line.
    Deadline,
    /// Shot budget exhausted and the grace timer elapsed.
    NoShot,
    /// The top of the chain was reached.
    Clear,
}

/// Deferred check the host must schedule; it fires back through
/// [`MergeSession::no_shot_timer_fired`] with the generation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerRequest {
    pub generation: u64,
    pub fire_at_ms: u64,
}

/// Result of consuming one queued shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShotOutcome {
    pub body: BodyId,
    pub level: u8,
    /// Present on the final shot; the session must not end before the
    /// field has settled.
    pub no_shot_check: Option<TimerRequest>,
}

/// Result of a merge collision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeOutcome {
    /// Pair consumed, one replacement spawned at the midpoint.
    Merged { body: BodyId, level: u8, at: Vec2 },
    /// Pair consumed at the top of the chain; no replacement.
    Cleared { bonus: u32 },
}

/// Lifetime records across sessions, banked on every terminal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MergeRecords {
    pub total_plays: u32,
    pub total_score: u64,
    pub clears: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LiveFruit {
    level: u8,
    /// Exempt from danger checks until this host timestamp.
    grace_until_ms: u64,
}

/// The merge-chain simulator. All mutation happens through the event
/// methods below; there are no hidden callbacks or shared counters.
#[derive(Debug, Clone)]
pub struct MergeSession {
    config: MergeConfig,
    fruits: Vec<FruitDef>,
    phase: MergePhase,
    end_reason: Option<EndReason>,
    score: u32,
    shots_left: u32,
    queue: VecDeque<u8>,
    live: HashMap<BodyId, LiveFruit>,
    /// Bumped on every start; stale timers compare against it.
    generation: u64,
    danger: bool,
    records: MergeRecords,
}

impl MergeSession {
    /// Build a session in the `Ready` phase. The fruit table is sorted by
    /// level; the config is normalized against it.
    #[must_use]
    pub fn new(config: MergeConfig, mut fruits: Vec<FruitDef>) -> Self {
        fruits.sort_by_key(|fruit| fruit.level);
        let mut config = config.normalized();
        if let Some(top) = fruits.last() {
            config.max_level = config.max_level.min(top.level);
            config.spawn_max_level = config.spawn_max_level.min(config.max_level - 1);
        }
        Self {
            config,
            fruits,
            phase: MergePhase::Ready,
            end_reason: None,
            score: 0,
            shots_left: 0,
            queue: VecDeque::new(),
            live: HashMap::new(),
            generation: 0,
            danger: false,
            records: MergeRecords::default(),
        }
    }

    /// Session with the starter chain and default rules.
    #[must_use]
    pub fn starter() -> Self {
        Self::new(MergeConfig::default(), FruitDef::starter_table())
    }

    // --- Accessors --------------------------------------------------------

    #[must_use]
    pub const fn phase(&self) -> MergePhase {
        self.phase
    }

    #[must_use]
    pub const fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub const fn shots_left(&self) -> u32 {
        self.shots_left
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn danger(&self) -> bool {
        self.danger
    }

    #[must_use]
    pub const fn records(&self) -> MergeRecords {
        self.records
    }

    #[must_use]
    pub const fn config(&self) -> &MergeConfig {
        &self.config
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Level of a live body, if the session is tracking it.
    #[must_use]
    pub fn level_of(&self, body: BodyId) -> Option<u8> {
        self.live.get(&body).map(|fruit| fruit.level)
    }

    /// Upcoming spawn levels, queue head first.
    #[must_use]
    pub const fn queue(&self) -> &VecDeque<u8> {
        &self.queue
    }

    /// Level the next shot will spawn.
    #[must_use]
    pub fn next_level(&self) -> Option<u8> {
        self.queue.front().copied()
    }

    fn fruit(&self, level: u8) -> Option<&FruitDef> {
        self.fruits.iter().find(|fruit| fruit.level == level)
    }

    // --- Transitions ------------------------------------------------------

    /// Start (or restart) a session. Every live body from the previous
    /// session is removed, the generation advances so in-flight timers
    /// become no-ops, and the spawn queue is pre-filled.
    pub fn start<P: PhysicsHost, R: Rng>(&mut self, physics: &mut P, rng: &mut R) {
        for body in self.live.keys() {
            physics.remove_body(*body);
        }
        self.live.clear();
        self.generation += 1;
        self.phase = MergePhase::Playing;
        self.end_reason = None;
        self.score = 0;
        self.shots_left = self.config.total_shots;
        self.danger = false;
        self.queue.clear();
        self.fill_queue(rng);
        self.records.total_plays += 1;
    }

    /// Give up without banking the score; back to `Ready`. Live bodies
    /// stay in the world until the next start clears them.
    pub fn abandon(&mut self) {
        self.phase = MergePhase::Ready;
        self.end_reason = None;
    }

    /// Clear the lifetime records.
    pub fn reset_records(&mut self) {
        self.records = MergeRecords::default();
    }

    fn finish(&mut self, reason: EndReason) {
        self.records.total_score += u64::from(self.score);
        self.phase = match reason {
            EndReason::Clear => MergePhase::Cleared,
            EndReason::Deadline | EndReason::NoShot => MergePhase::GameOver,
        };
        self.end_reason = Some(reason);
    }

    // --- Spawning ---------------------------------------------------------

    /// Draw one spawn level, restricted to `spawn_max_level`. A table
    /// whose spawnable weights are all zero falls back to level 1.
    fn pick_spawn_level<R: Rng>(&self, rng: &mut R) -> u8 {
        let candidates: Vec<(f64, u8)> = self
            .fruits
            .iter()
            .filter(|fruit| fruit.level <= self.config.spawn_max_level)
            .map(|fruit| (fruit.spawn_weight, fruit.level))
            .collect();
        *sample_weighted(&candidates, &1u8, rng)
    }

    fn fill_queue<R: Rng>(&mut self, rng: &mut R) {
        while self.queue.len() < self.config.queue_len {
            let level = self.pick_spawn_level(rng);
            self.queue.push_back(level);
        }
    }

    /// Consume the queue head and drop it at `aim_x`.
    ///
    /// Returns `None` when the session is not playing or out of shots.
    /// The final shot carries a [`TimerRequest`]; the `NoShot` end is
    /// only judged once that timer fires back.
    pub fn drop_fruit<P: PhysicsHost, R: Rng>(
        &mut self,
        physics: &mut P,
        aim_x: f64,
        now_ms: u64,
        rng: &mut R,
    ) -> Option<ShotOutcome> {
        if self.phase != MergePhase::Playing || self.shots_left == 0 {
            return None;
        }
        let level = self.queue.pop_front()?;
        self.fill_queue(rng);
        self.shots_left -= 1;

        let def = self.fruit(level)?;
        let min_x = self.config.wall_thickness + def.radius;
        let max_x = self.config.field_width - self.config.wall_thickness - def.radius;
        let spec = BodySpec {
            position: Vec2::new(aim_x.clamp(min_x, max_x), self.config.spawn_height),
            radius: def.radius,
            restitution: def.restitution,
            friction: def.friction,
            density: def.density,
        };
        let body = physics.spawn_body(&spec);
        self.live.insert(
            body,
            LiveFruit {
                level,
                grace_until_ms: now_ms + self.config.spawn_grace_ms,
            },
        );

        let no_shot_check = (self.shots_left == 0).then_some(TimerRequest {
            generation: self.generation,
            fire_at_ms: now_ms + self.config.no_shot_grace_ms,
        });
        Some(ShotOutcome {
            body,
            level,
            no_shot_check,
        })
    }

    /// Deferred end-of-shots check. A stale timer (earlier generation, or
    /// a session that already ended or found new shots) is a no-op.
    pub fn no_shot_timer_fired(&mut self, generation: u64) {
        if generation != self.generation
            || self.phase != MergePhase::Playing
            || self.shots_left != 0
        {
            return;
        }
        self.finish(EndReason::NoShot);
    }

    // --- Collision events -------------------------------------------------

    /// Handle a collision-start pair reported by the host.
    ///
    /// Only pairs of live, equal-level bodies merge. The pair is consumed
    /// atomically: both bodies leave the world and the tracking map
    /// before anything spawns, so a second event for the same pair in the
    /// same frame is ignored. Reaching `max_level` clears the session and
    /// spawns nothing.
    pub fn collision_started<P: PhysicsHost>(
        &mut self,
        physics: &mut P,
        a: BodyId,
        b: BodyId,
        now_ms: u64,
    ) -> Option<MergeOutcome> {
        if self.phase != MergePhase::Playing || a == b {
            return None;
        }
        let level_a = self.live.get(&a)?.level;
        let level_b = self.live.get(&b)?.level;
        if level_a != level_b {
            return None;
        }

        let next = level_a + 1;
        let clears = next >= self.config.max_level;
        // A gap in the chain table means the pair cannot promote; leave it.
        if !clears && self.fruit(next).is_none() {
            return None;
        }

        let kin_a = physics.kinematics(a)?;
        let kin_b = physics.kinematics(b)?;
        self.live.remove(&a);
        self.live.remove(&b);
        physics.remove_body(a);
        physics.remove_body(b);

        if clears {
            self.score = self.score.saturating_add(self.config.clear_bonus);
            self.records.clears += 1;
            self.finish(EndReason::Clear);
            return Some(MergeOutcome::Cleared {
                bonus: self.config.clear_bonus,
            });
        }

        let def = self.fruit(next)?;
        let at = Vec2::midpoint(kin_a.position, kin_b.position);
        let spec = BodySpec {
            position: at,
            radius: def.radius,
            restitution: def.restitution,
            friction: def.friction,
            density: def.density,
        };
        let body = physics.spawn_body(&spec);
        self.live.insert(
            body,
            LiveFruit {
                level: next,
                grace_until_ms: now_ms + self.config.merge_grace_ms,
            },
        );
        Some(MergeOutcome::Merged {
            body,
            level: next,
            at,
        })
    }

    /// Handle a body overlapping the danger-line sensor this frame.
    ///
    /// The body is at risk when it is tracked, past its grace window,
    /// resting (speed below the epsilon), and its center sits above the
    /// line; an at-risk body ends the session immediately. Bodies merely
    /// falling through the line never trigger this. Returns whether the
    /// body was at risk.
    pub fn danger_overlap<P: PhysicsHost>(
        &mut self,
        physics: &P,
        body: BodyId,
        now_ms: u64,
    ) -> bool {
        if self.phase != MergePhase::Playing {
            return false;
        }
        let Some(fruit) = self.live.get(&body) else {
            self.danger = false;
            return false;
        };
        let Some(kin) = physics.kinematics(body) else {
            self.danger = false;
            return false;
        };
        let at_risk = now_ms >= fruit.grace_until_ms
            && kin.speed < self.config.rest_speed_epsilon
            && kin.position.y < self.config.dead_line_y();
        self.danger = at_risk;
        if at_risk {
            self.finish(EndReason::Deadline);
        }
        at_risk
    }
}

/// Scale the spawnable weights so they sum to 100, rounded to one
/// decimal, with the last spawnable entry absorbing the remainder.
/// All-zero weights are left untouched.
pub fn normalize_spawn_weights(fruits: &mut [FruitDef], spawn_max_level: u8) {
    let spawnable: Vec<usize> = fruits
        .iter()
        .enumerate()
        .filter(|(_, fruit)| fruit.level <= spawn_max_level)
        .map(|(idx, _)| idx)
        .collect();
    let sum: f64 = spawnable.iter().map(|&idx| fruits[idx].spawn_weight).sum();
    if sum <= 0.0 {
        return;
    }

    let mut assigned = 0.0;
    for (pos, &idx) in spawnable.iter().enumerate() {
        let weight = if pos == spawnable.len() - 1 {
            ((WEIGHT_TARGET_SUM - assigned) * WEIGHT_ROUND_SCALE).round() / WEIGHT_ROUND_SCALE
        } else {
            let scaled = fruits[idx].spawn_weight / sum * WEIGHT_TARGET_SUM;
            let rounded = (scaled * WEIGHT_ROUND_SCALE).round() / WEIGHT_ROUND_SCALE;
            assigned += rounded;
            rounded
        };
        fruits[idx].spawn_weight = weight;
    }
}
