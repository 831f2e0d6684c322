//! Scripted merge-chain sessions against a fake physics host.
use melonpack_game::{
    BodyId, BodySpec, EndReason, FruitDef, Kinematics, MergeConfig, MergeOutcome, MergePhase,
    MergeSession, PhysicsHost, Vec2,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use std::collections::HashMap;

/// In-memory stand-in for the external engine: bodies rest where they
/// were spawned until the script moves them.
#[derive(Default)]
struct FakePhysics {
    next_id: BodyId,
    bodies: HashMap<BodyId, Kinematics>,
}

impl FakePhysics {
    fn place(&mut self, body: BodyId, x: f64, y: f64, speed: f64) {
        self.bodies.insert(
            body,
            Kinematics {
                position: Vec2::new(x, y),
                velocity: Vec2::default(),
                speed,
            },
        );
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

impl PhysicsHost for FakePhysics {
    fn spawn_body(&mut self, spec: &BodySpec) -> BodyId {
        self.next_id += 1;
        self.bodies.insert(
            self.next_id,
            Kinematics {
                position: spec.position,
                velocity: Vec2::default(),
                speed: 0.0,
            },
        );
        self.next_id
    }

    fn remove_body(&mut self, id: BodyId) {
        self.bodies.remove(&id);
    }

    fn kinematics(&self, id: BodyId) -> Option<Kinematics> {
        self.bodies.get(&id).copied()
    }
}

/// Only level 1 is spawnable: zero spawn weights fall back to level 1,
/// which keeps scripted cascades deterministic.
fn level_one_table() -> Vec<FruitDef> {
    let mut fruits = FruitDef::starter_table();
    for fruit in &mut fruits {
        fruit.spawn_weight = 0.0;
    }
    fruits
}

fn short_chain_session() -> (MergeSession, FakePhysics, ChaCha20Rng) {
    let config = MergeConfig {
        max_level: 3,
        spawn_max_level: 1,
        total_shots: 10,
        clear_bonus: 100,
        ..MergeConfig::default()
    };
    let mut session = MergeSession::new(config, level_one_table());
    let mut physics = FakePhysics::default();
    let mut rng = ChaCha20Rng::from_seed([70u8; 32]);
    session.start(&mut physics, &mut rng);
    (session, physics, rng)
}

/// Drop two fruits and report their collision, returning the merge result.
fn drop_and_collide(
    session: &mut MergeSession,
    physics: &mut FakePhysics,
    rng: &mut ChaCha20Rng,
    now_ms: u64,
) -> MergeOutcome {
    let first = session
        .drop_fruit(physics, 100.0, now_ms, rng)
        .expect("shot accepted");
    let second = session
        .drop_fruit(physics, 120.0, now_ms, rng)
        .expect("shot accepted");
    session
        .collision_started(physics, first.body, second.body, now_ms)
        .expect("equal levels merge")
}

#[test]
fn cascade_to_clear_banks_the_bonus() {
    let (mut session, mut physics, mut rng) = short_chain_session();

    // Two level-1 merges leave two level-2 fruits on the field.
    let MergeOutcome::Merged { body: left, level, .. } =
        drop_and_collide(&mut session, &mut physics, &mut rng, 0)
    else {
        panic!("first merge should promote");
    };
    assert_eq!(level, 2);
    let MergeOutcome::Merged { body: right, .. } =
        drop_and_collide(&mut session, &mut physics, &mut rng, 100)
    else {
        panic!("second merge should promote");
    };
    assert_eq!(session.live_count(), 2);
    assert_eq!(physics.body_count(), 2);

    // Merging the level-2 pair reaches max_level 3: cleared, no spawn.
    let outcome = session
        .collision_started(&mut physics, left, right, 200)
        .expect("clear merge");
    assert_eq!(outcome, MergeOutcome::Cleared { bonus: 100 });
    assert_eq!(session.phase(), MergePhase::Cleared);
    assert_eq!(session.end_reason(), Some(EndReason::Clear));
    assert_eq!(session.score(), 100);
    assert_eq!(session.live_count(), 0);
    assert_eq!(physics.body_count(), 0);
    assert_eq!(session.records().clears, 1);
    assert_eq!(session.records().total_score, 100);

    // Terminal: further input is rejected until a restart.
    assert!(session.drop_fruit(&mut physics, 100.0, 300, &mut rng).is_none());
}

#[test]
fn every_merge_shrinks_the_field_by_one() {
    let (mut session, mut physics, mut rng) = short_chain_session();
    let before_shots = session.live_count();
    let first = session
        .drop_fruit(&mut physics, 100.0, 0, &mut rng)
        .expect("shot accepted");
    let second = session
        .drop_fruit(&mut physics, 140.0, 0, &mut rng)
        .expect("shot accepted");
    assert_eq!(session.live_count(), before_shots + 2);

    session
        .collision_started(&mut physics, first.body, second.body, 0)
        .expect("merge happens");
    assert_eq!(session.live_count(), before_shots + 1);
    assert_eq!(physics.body_count(), before_shots + 1);
    // The consumed pair is gone for good.
    assert_eq!(session.level_of(first.body), None);
    assert_eq!(session.level_of(second.body), None);
}

#[test]
fn no_shot_game_over_waits_for_the_grace_timer() {
    let config = MergeConfig {
        max_level: 3,
        spawn_max_level: 1,
        total_shots: 2,
        ..MergeConfig::default()
    };
    let mut session = MergeSession::new(config, level_one_table());
    let mut physics = FakePhysics::default();
    let mut rng = ChaCha20Rng::from_seed([71u8; 32]);
    session.start(&mut physics, &mut rng);

    let first = session
        .drop_fruit(&mut physics, 100.0, 0, &mut rng)
        .expect("shot accepted");
    assert!(first.no_shot_check.is_none());
    let last = session
        .drop_fruit(&mut physics, 200.0, 1_000, &mut rng)
        .expect("shot accepted");
    let timer = last.no_shot_check.expect("final shot schedules the check");

    // Still settling: the session stays in play until the timer fires.
    assert_eq!(session.phase(), MergePhase::Playing);
    session.no_shot_timer_fired(timer.generation);
    assert_eq!(session.phase(), MergePhase::GameOver);
    assert_eq!(session.end_reason(), Some(EndReason::NoShot));
}

#[test]
fn restart_cancels_the_pending_no_shot_timer() {
    let config = MergeConfig {
        max_level: 3,
        spawn_max_level: 1,
        total_shots: 1,
        ..MergeConfig::default()
    };
    let mut session = MergeSession::new(config, level_one_table());
    let mut physics = FakePhysics::default();
    let mut rng = ChaCha20Rng::from_seed([72u8; 32]);
    session.start(&mut physics, &mut rng);
    let shot = session
        .drop_fruit(&mut physics, 100.0, 0, &mut rng)
        .expect("shot accepted");
    let stale = shot.no_shot_check.expect("timer scheduled");

    // New session begins while the old timer is in flight.
    session.start(&mut physics, &mut rng);
    session.no_shot_timer_fired(stale.generation);
    assert_eq!(
        session.phase(),
        MergePhase::Playing,
        "stale timer from the previous session must not end the new one"
    );
    assert_eq!(session.shots_left(), 1);
}

#[test]
fn deadline_game_over_via_the_danger_line() {
    let (mut session, mut physics, mut rng) = short_chain_session();
    let shot = session
        .drop_fruit(&mut physics, 100.0, 0, &mut rng)
        .expect("shot accepted");
    let line_y = session.config().dead_line_y();

    // Rested above the line after the grace window: immediate game over.
    physics.place(shot.body, 100.0, line_y - 1.0, 0.0);
    let at_risk = session.danger_overlap(&physics, shot.body, 60_000);
    assert!(at_risk);
    assert!(session.danger());
    assert_eq!(session.phase(), MergePhase::GameOver);
    assert_eq!(session.end_reason(), Some(EndReason::Deadline));

    // Terminal state ignores further overlap reports.
    assert!(!session.danger_overlap(&physics, shot.body, 61_000));
}

#[test]
fn merged_fruit_grace_window_shields_the_danger_line() {
    let (mut session, mut physics, mut rng) = short_chain_session();
    let MergeOutcome::Merged { body, .. } =
        drop_and_collide(&mut session, &mut physics, &mut rng, 10_000)
    else {
        panic!("merge should promote");
    };
    let line_y = session.config().dead_line_y();
    let grace = session.config().merge_grace_ms;

    physics.place(body, 100.0, line_y - 1.0, 0.0);
    assert!(!session.danger_overlap(&physics, body, 10_000 + grace - 1));
    assert_eq!(session.phase(), MergePhase::Playing);

    assert!(session.danger_overlap(&physics, body, 10_000 + grace));
    assert_eq!(session.phase(), MergePhase::GameOver);
}

#[test]
fn full_session_against_the_starter_chain_stays_consistent() {
    let mut session = MergeSession::starter();
    let mut physics = FakePhysics::default();
    let mut rng = ChaCha20Rng::from_seed([73u8; 32]);
    session.start(&mut physics, &mut rng);

    let mut now_ms = 0u64;
    while session.shots_left() > 0 {
        let queue_head = session.next_level().expect("queue never empties");
        let shot = session
            .drop_fruit(&mut physics, f64::from(session.shots_left()) * 5.0, now_ms, &mut rng)
            .expect("shot accepted");
        assert_eq!(shot.level, queue_head);
        assert!(shot.level <= session.config().spawn_max_level);
        now_ms += 500;
    }
    assert_eq!(session.live_count(), session.config().total_shots as usize);
    assert_eq!(physics.body_count(), session.config().total_shots as usize);

    // Record keeping survives a restart.
    session.start(&mut physics, &mut rng);
    assert_eq!(session.records().total_plays, 2);
    assert_eq!(physics.body_count(), 0);
}
