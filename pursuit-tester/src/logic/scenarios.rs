use anyhow::{Context, Result};
use pursuit_game::{
    CollisionKind, ContactTracker, EpisodeConfig, EpisodeOutcome, MemoryRecordStorage,
    PursuitEpisode, RecordStorage, Role, RotationSettings, SceneCatalog, SceneProgressionStore,
    SceneRotationRecord, SharedProgression, TrainingSession, Vec2,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::duration_serde;
use super::policy::Strategy;
use super::runner::{RunPlan, run_episodes};

/// Fixed step the physics checks are calibrated against.
const CHECK_DT: f64 = 1.0 / 50.0;

#[derive(Debug, Clone, Copy)]
pub struct ScenarioCtx {
    pub seed: u64,
    pub dt: f64,
    pub verbose: bool,
}

/// Collects failed expectations instead of stopping at the first one.
#[derive(Debug, Default)]
pub struct Checks {
    run: usize,
    failures: Vec<String>,
}

impl Checks {
    pub fn expect(&mut self, passed: bool, message: impl Into<String>) {
        self.run += 1;
        if !passed {
            self.failures.push(message.into());
        }
    }

    pub fn expect_close(&mut self, actual: f64, expected: f64, what: &str) {
        self.expect(
            (actual - expected).abs() < 1e-9,
            format!("{what}: expected {expected}, got {actual}"),
        );
    }

    #[must_use]
    pub const fn run(&self) -> usize {
        self.run
    }

    #[must_use]
    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

type ScenarioFn = fn(&ScenarioCtx, &mut Checks) -> Result<()>;

pub struct LogicScenario {
    pub key: &'static str,
    pub description: &'static str,
    run: ScenarioFn,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub passed: bool,
    pub checks_run: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl ScenarioResult {
    fn unknown(name: &str) -> Self {
        Self {
            scenario_name: name.to_string(),
            passed: false,
            checks_run: 0,
            failures: vec![format!("unknown scenario '{name}'")],
            duration: Duration::ZERO,
        }
    }
}

const SCENARIOS: &[LogicScenario] = &[
    LogicScenario {
        key: "smoke",
        description: "Scripted episodes end and are each counted once",
        run: smoke,
    },
    LogicScenario {
        key: "capture",
        description: "Pursuing chaser catches an idle evader from 10 units",
        run: capture,
    },
    LogicScenario {
        key: "timeout",
        description: "Idle agents time out on exactly tick 1500",
        run: timeout,
    },
    LogicScenario {
        key: "wall-stun",
        description: "Wall hit pays -10, stays pay -2, stun lasts 2 seconds",
        run: wall_stun,
    },
    LogicScenario {
        key: "rotation",
        description: "Progressive rotation switches scene every 200 episodes",
        run: rotation,
    },
    LogicScenario {
        key: "corrupt-state",
        description: "Corrupt progression data loads as zero and is overwritten",
        run: corrupt_state,
    },
];

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS
        .iter()
        .map(|scenario| (scenario.key, scenario.description))
        .collect()
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<&'static LogicScenario> {
    SCENARIOS.iter().find(|scenario| scenario.key == name)
}

/// Resolve a scenario list, expanding `all` to every registered key.
#[must_use]
pub fn expand_scenarios(names: &[String]) -> Vec<String> {
    if names.iter().any(|name| name == "all") {
        return SCENARIOS.iter().map(|s| s.key.to_string()).collect();
    }
    names.to_vec()
}

impl LogicScenario {
    #[must_use]
    pub fn execute(&self, ctx: &ScenarioCtx) -> ScenarioResult {
        let started = Instant::now();
        let mut checks = Checks::default();
        if let Err(err) = (self.run)(ctx, &mut checks) {
            checks.expect(false, format!("{err:#}"));
        }
        ScenarioResult {
            scenario_name: self.key.to_string(),
            passed: checks.failures.is_empty(),
            checks_run: checks.run,
            failures: checks.failures,
            duration: started.elapsed(),
        }
    }
}

/// Run each named scenario, reporting unknown names as failures.
#[must_use]
pub fn run_scenarios(names: &[String], ctx: &ScenarioCtx) -> Vec<ScenarioResult> {
    names
        .iter()
        .map(|name| match get_scenario(name) {
            Some(scenario) => {
                if ctx.verbose {
                    println!("▶ {}", scenario.key);
                }
                scenario.execute(ctx)
            }
            None => {
                log::warn!("unknown scenario '{name}'");
                ScenarioResult::unknown(name)
            }
        })
        .collect()
}

fn fresh_episode() -> Result<PursuitEpisode> {
    PursuitEpisode::new(EpisodeConfig::compiled()).context("compiled episode config rejected")
}

fn smoke(ctx: &ScenarioCtx, checks: &mut Checks) -> Result<()> {
    let catalog = SceneCatalog::load_from_static();
    let settings = RotationSettings::for_catalog(&catalog).with_episodes_per_scene(2);
    let progression = SharedProgression::open(MemoryRecordStorage::new(), settings)?;
    let mut session = TrainingSession::new(EpisodeConfig::compiled(), catalog, progression)?;

    let plan = RunPlan::new(3, ctx.dt, ctx.seed).with_policies(Strategy::Pursue, Strategy::Random);
    let summary = run_episodes(&mut session, &plan, ctx.verbose);

    checks.expect(summary.unfinished() == 0, "every episode should end");
    checks.expect(
        summary.record.total_episodes == 3,
        format!("expected 3 counted episodes, got {}", summary.record.total_episodes),
    );
    checks.expect(
        summary.record.chaser_wins + summary.record.evader_wins <= 3,
        "wins exceed episodes",
    );
    checks.expect(session.scene_index() == 1, "two episodes per scene should reach scene 2");
    checks.expect(
        summary
            .episodes
            .iter()
            .all(|ep| ep.chaser_reward.is_finite() && ep.evader_reward.is_finite()),
        "rewards must stay finite",
    );
    Ok(())
}

fn capture(_ctx: &ScenarioCtx, checks: &mut Checks) -> Result<()> {
    let mut episode = fresh_episode()?;
    let mut contacts = ContactTracker::default();
    let mut chaser_total = 0.0;
    let mut outcome = None;
    let mut ticks = 0;
    while ticks < 200 && outcome.is_none() {
        let events = contacts.detect(&episode);
        let step = episode.advance(CHECK_DT, Vec2::RIGHT, Vec2::ZERO, &events);
        chaser_total += step.chaser_reward;
        outcome = step.terminal;
        ticks += 1;
    }
    checks.expect(
        outcome == Some(EpisodeOutcome::ChaserCaughtEvader),
        format!("expected a capture within 200 ticks, got {outcome:?}"),
    );
    checks.expect(
        chaser_total > 0.0,
        format!("chaser reward sum should be positive, got {chaser_total:.3}"),
    );
    Ok(())
}

fn timeout(_ctx: &ScenarioCtx, checks: &mut Checks) -> Result<()> {
    let mut episode = fresh_episode()?;
    let mut contacts = ContactTracker::default();
    for tick in 1..=1_600_u32 {
        let events = contacts.detect(&episode);
        let step = episode.advance(CHECK_DT, Vec2::ZERO, Vec2::ZERO, &events);
        if let Some(outcome) = step.terminal {
            checks.expect(tick == 1_500, format!("timed out on tick {tick}"));
            checks.expect(
                outcome == EpisodeOutcome::EvaderSurvivedTimeout,
                format!("unexpected outcome {outcome}"),
            );
            checks.expect_close(step.chaser_reward, -10.0, "chaser timeout reward");
            checks.expect_close(step.evader_reward, 10.0, "evader timeout reward");
            return Ok(());
        }
    }
    checks.expect(false, "episode never timed out");
    Ok(())
}

fn wall_stun(_ctx: &ScenarioCtx, checks: &mut Checks) -> Result<()> {
    let mut episode = fresh_episode()?;
    let mut contacts = ContactTracker::default();
    episode
        .agent_mut(Role::Evader)
        .context("evader missing")?
        .body
        .position = Vec2::new(7.6, 0.0);

    let events = contacts.detect(&episode);
    checks.expect(
        events.first().map(|e| e.kind) == Some(CollisionKind::Wall),
        "evader should start touching the wall",
    );
    let hit = episode.advance(CHECK_DT, Vec2::ZERO, Vec2::RIGHT, &events);
    checks.expect_close(hit.evader_reward, -10.0, "wall hit reward");

    let events = contacts.detect(&episode);
    checks.expect(
        events.first().map(|e| e.kind) == Some(CollisionKind::WallStay),
        "second tick should be a wall stay",
    );
    let stay = episode.advance(CHECK_DT, Vec2::ZERO, Vec2::RIGHT, &events);
    checks.expect_close(stay.evader_reward, -2.0, "wall stay reward");

    let mut stunned_ticks = 1;
    while episode.agent(Role::Evader).is_some_and(|a| a.is_stunned()) && stunned_ticks < 200 {
        let events = contacts.detect(&episode);
        episode.advance(CHECK_DT, Vec2::ZERO, Vec2::RIGHT, &events);
        stunned_ticks += 1;
    }
    checks.expect(
        (100..=101).contains(&stunned_ticks),
        format!("stun lasted {stunned_ticks} ticks"),
    );
    Ok(())
}

fn rotation(_ctx: &ScenarioCtx, checks: &mut Checks) -> Result<()> {
    let shared =
        SharedProgression::open(MemoryRecordStorage::new(), RotationSettings::progressive(11))?;
    let mut switches = Vec::new();
    for _ in 0..2_000 {
        let advance = shared.record_episode_end(EpisodeOutcome::ChaserCaughtEvader);
        if advance.scene_changed {
            switches.push(advance.record.total_episodes);
        }
        if advance.record.total_episodes == 1_999 {
            checks.expect(
                advance.new_scene_index == 9,
                format!("episode 1999 should stay on index 9, got {}", advance.new_scene_index),
            );
        }
    }
    let expected: Vec<u64> = (1..=10).map(|n| n * 200).collect();
    checks.expect(switches == expected, format!("switches at {switches:?}"));
    checks.expect(
        shared.current_scene_index() == 10,
        "episode 2000 should reach the last scene",
    );
    Ok(())
}

fn corrupt_state(_ctx: &ScenarioCtx, checks: &mut Checks) -> Result<()> {
    let storage = MemoryRecordStorage::with_text("{\"totalEpisodes\": tons");
    let mut store = SceneProgressionStore::open(storage.clone(), RotationSettings::progressive(6))?;
    checks.expect(
        store.record() == SceneRotationRecord::default(),
        "corrupt data should load as a zero record",
    );
    store.record_episode_end(EpisodeOutcome::EvaderSurvivedTimeout);
    let saved = storage.load_record().context("rewritten record unreadable")?;
    checks.expect(
        saved.is_some_and(|record| record.total_episodes == 1 && record.evader_wins == 1),
        format!("unexpected rewritten record {saved:?}"),
    );
    Ok(())
}
