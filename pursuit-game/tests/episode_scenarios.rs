use pursuit_game::{
    CollisionEvent, CollisionKind, ContactTracker, EVADER_THREAT_BLOCK, EpisodeConfig,
    EpisodeOutcome, Facing, PursuitEpisode, Role, StepResult, Vec2,
};

const DT: f64 = 1.0 / 50.0;

fn episode() -> PursuitEpisode {
    PursuitEpisode::new(EpisodeConfig::compiled()).unwrap()
}

fn run_until_terminal(
    episode: &mut PursuitEpisode,
    tracker: &mut ContactTracker,
    max_ticks: usize,
    chaser_action: Vec2,
    evader_action: Vec2,
) -> (usize, Vec<StepResult>) {
    let mut steps = Vec::new();
    for tick in 1..=max_ticks {
        let events = tracker.detect(episode);
        let step = episode.advance(DT, chaser_action, evader_action, &events);
        steps.push(step);
        if step.terminal.is_some() {
            return (tick, steps);
        }
    }
    (max_ticks, steps)
}

#[test]
fn pursuing_chaser_catches_idle_evader() {
    let mut ep = episode();
    let mut tracker = ContactTracker::default();
    let (ticks, steps) = run_until_terminal(&mut ep, &mut tracker, 200, Vec2::RIGHT, Vec2::ZERO);

    let last = steps.last().unwrap();
    assert_eq!(last.terminal, Some(EpisodeOutcome::ChaserCaughtEvader));
    assert!(ticks < 200, "capture took {ticks} ticks");

    let chaser_total: f64 = steps.iter().map(|s| s.chaser_reward).sum();
    let evader_total: f64 = steps.iter().map(|s| s.evader_reward).sum();
    assert!(chaser_total > 0.0, "chaser total {chaser_total}");
    assert!(evader_total < 0.0, "evader total {evader_total}");
    assert_eq!(last.chaser_facing, Facing::Right);
}

#[test]
fn idle_agents_time_out_on_tick_1500() {
    let mut ep = episode();
    let mut tracker = ContactTracker::default();
    let (ticks, steps) = run_until_terminal(&mut ep, &mut tracker, 2_000, Vec2::ZERO, Vec2::ZERO);

    assert_eq!(ticks, 1_500);
    let last = steps.last().unwrap();
    assert_eq!(last.terminal, Some(EpisodeOutcome::EvaderSurvivedTimeout));
    assert!((last.chaser_reward + 10.0).abs() < 1e-9);
    assert!((last.evader_reward - 10.0).abs() < 1e-9);
    assert!(steps[..ticks - 1].iter().all(|s| s.terminal.is_none()));
}

/// Ticks `role` while it stays stunned, pushing into the wall each tick.
/// Every tick that starts stunned may only pay the wall-stay penalty.
fn ticks_until_recovered(
    ep: &mut PursuitEpisode,
    tracker: &mut ContactTracker,
    role: Role,
    push: Vec2,
    stay_penalty: f64,
) -> usize {
    let (chaser_action, evader_action) = match role {
        Role::Chaser => (push, Vec2::ZERO),
        Role::Evader => (Vec2::ZERO, push),
    };
    let mut stunned_ticks = 0;
    while ep.agent(role).unwrap().is_stunned() {
        let events = tracker.detect(ep);
        let staying = events
            .iter()
            .any(|e| e.agent == role && e.kind == CollisionKind::WallStay);
        let step = ep.advance(DT, chaser_action, evader_action, &events);
        let expected = if staying { stay_penalty } else { 0.0 };
        stunned_ticks += 1;
        assert!(
            (step.reward(role) - expected).abs() < 1e-12,
            "{role} tick {stunned_ticks} paid {}",
            step.reward(role)
        );
        assert!(stunned_ticks < 200);
    }
    stunned_ticks
}

#[test]
fn evader_striking_wall_is_penalized_and_stunned() {
    let mut ep = episode();
    ep.agent_mut(Role::Evader).unwrap().body.position = Vec2::new(7.6, 0.0);
    let mut tracker = ContactTracker::default();

    let events = tracker.detect(&ep);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, CollisionKind::Wall);
    let hit = ep.advance(DT, Vec2::ZERO, Vec2::RIGHT, &events);
    assert!((hit.evader_reward + 10.0).abs() < 1e-9);
    let evader = ep.agent(Role::Evader).unwrap();
    assert!(evader.is_stunned());
    assert!(evader.body.velocity.x < 0.0);

    let events = tracker.detect(&ep);
    assert_eq!(events[0].kind, CollisionKind::WallStay);
    let stay = ep.advance(DT, Vec2::ZERO, Vec2::RIGHT, &events);
    assert!((stay.evader_reward + 2.0).abs() < 1e-9);

    let stunned_ticks =
        1 + ticks_until_recovered(&mut ep, &mut tracker, Role::Evader, Vec2::RIGHT, -2.0);
    assert!((100..=101).contains(&stunned_ticks), "{stunned_ticks}");
}

#[test]
fn chaser_earns_nothing_until_its_stun_ends() {
    let mut ep = episode();
    ep.agent_mut(Role::Chaser).unwrap().body.position = Vec2::new(-7.6, 0.0);
    let mut tracker = ContactTracker::default();

    let events = tracker.detect(&ep);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].agent, Role::Chaser);
    assert_eq!(events[0].kind, CollisionKind::Wall);
    let hit = ep.advance(DT, Vec2::LEFT, Vec2::ZERO, &events);
    assert!((hit.chaser_reward + 2.0).abs() < 1e-9);
    assert!(ep.agent(Role::Chaser).unwrap().is_stunned());

    let stunned_ticks =
        ticks_until_recovered(&mut ep, &mut tracker, Role::Chaser, Vec2::LEFT, -1.0);
    assert!((50..=51).contains(&stunned_ticks), "{stunned_ticks}");
}

#[test]
fn missing_chaser_zero_fills_threat_block() {
    let mut ep = episode();
    ep.detach(Role::Chaser);

    let step = ep.advance(
        DT,
        Vec2::RIGHT,
        Vec2::UP,
        &[CollisionEvent::opponent(Role::Evader)],
    );
    assert!(step.terminal.is_none());
    assert!(step.chaser_reward.abs() < f64::EPSILON);
    assert!((step.evader_reward - 0.01).abs() < 1e-12);

    let obs = ep.observe(Role::Evader);
    assert_eq!(obs.len(), 16);
    assert!(obs[EVADER_THREAT_BLOCK].iter().all(|v| *v == 0.0));
    assert!((obs[0] - 0.5).abs() < 1e-9);
    assert!(obs[3] > 0.0);
    assert!(obs[13] > 0.99);
    assert!(ep.observe(Role::Chaser).iter().all(|v| *v == 0.0));
}

#[test]
fn identical_inputs_replay_identically() {
    let actions = [
        (Vec2::new(1.0, 0.3), Vec2::new(0.0, 1.0)),
        (Vec2::new(0.8, -0.2), Vec2::new(-0.5, 1.0)),
        (Vec2::new(1.0, 1.0), Vec2::new(1.0, 0.0)),
    ];
    let run = || {
        let mut ep = episode();
        let mut tracker = ContactTracker::default();
        let mut trace = Vec::new();
        for tick in 0..300 {
            let (c, e) = actions[tick % actions.len()];
            let events = tracker.detect(&ep);
            trace.push(ep.advance(DT, c, e, &events));
            if ep.is_terminated() {
                break;
            }
        }
        trace
    };
    assert_eq!(run(), run());
}

#[test]
fn per_tick_rewards_match_episode_totals() {
    let mut ep = episode();
    let mut tracker = ContactTracker::default();
    let mut chaser_sum = 0.0;
    for _ in 0..120 {
        let events = tracker.detect(&ep);
        let step = ep.advance(DT, Vec2::new(1.0, 0.5), Vec2::new(0.0, 1.0), &events);
        chaser_sum += step.chaser_reward;
        if step.terminal.is_some() {
            break;
        }
    }
    let snapshot = ep.snapshot();
    let recorded = snapshot.chaser.unwrap().episode_reward;
    assert!((recorded - chaser_sum).abs() < 1e-9);
}
