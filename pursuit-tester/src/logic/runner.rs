use colored::Colorize;
use pursuit_game::numbers::f64_to_u64_ceil_saturating;
use pursuit_game::{EpisodeOutcome, RecordStorage, Role, SceneRotationRecord, TrainingSession};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::duration_serde;
use super::policy::Strategy;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunPlan {
    pub episodes: u64,
    pub dt: f64,
    pub seed: u64,
    pub chaser: Strategy,
    pub evader: Strategy,
}

impl RunPlan {
    #[must_use]
    pub const fn new(episodes: u64, dt: f64, seed: u64) -> Self {
        Self {
            episodes,
            dt,
            seed,
            chaser: Strategy::Pursue,
            evader: Strategy::Flee,
        }
    }

    #[must_use]
    pub const fn with_policies(mut self, chaser: Strategy, evader: Strategy) -> Self {
        self.chaser = chaser;
        self.evader = evader;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub index: u64,
    pub scene: String,
    /// `None` when the tick budget ran out before the episode ended.
    pub outcome: Option<EpisodeOutcome>,
    pub ticks: u64,
    pub sim_seconds: f64,
    pub chaser_reward: f64,
    pub evader_reward: f64,
    pub scene_changed: bool,
    pub total_episodes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub plan: RunPlan,
    pub chaser_policy: String,
    pub evader_policy: String,
    pub episodes: Vec<EpisodeSummary>,
    pub record: SceneRotationRecord,
    #[serde(with = "duration_serde")]
    pub wall_clock: Duration,
}

impl RunSummary {
    #[must_use]
    pub fn count(&self, outcome: EpisodeOutcome) -> usize {
        self.episodes
            .iter()
            .filter(|ep| ep.outcome == Some(outcome))
            .count()
    }

    #[must_use]
    pub fn unfinished(&self) -> usize {
        self.episodes.iter().filter(|ep| ep.outcome.is_none()).count()
    }

    #[must_use]
    pub fn scene_changes(&self) -> usize {
        self.episodes.iter().filter(|ep| ep.scene_changed).count()
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_ticks(&self) -> f64 {
        if self.episodes.is_empty() {
            return 0.0;
        }
        let total: u64 = self.episodes.iter().map(|ep| ep.ticks).sum();
        total as f64 / self.episodes.len() as f64
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_reward(&self, role: Role) -> f64 {
        if self.episodes.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .episodes
            .iter()
            .map(|ep| match role {
                Role::Chaser => ep.chaser_reward,
                Role::Evader => ep.evader_reward,
            })
            .sum();
        total / self.episodes.len() as f64
    }

    /// Share of finished episodes won by the chaser, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn capture_rate(&self) -> f64 {
        let finished = self.episodes.len() - self.unfinished();
        if finished == 0 {
            return 0.0;
        }
        self.count(EpisodeOutcome::ChaserCaughtEvader) as f64 / finished as f64 * 100.0
    }
}

/// Ticks allowed before an episode is abandoned: the full timer plus one.
fn tick_budget(max_episode_time: f64, dt: f64) -> u64 {
    f64_to_u64_ceil_saturating(max_episode_time / dt).saturating_add(1)
}

#[allow(clippy::cast_precision_loss)]
fn ticks_to_seconds(ticks: u64, dt: f64) -> f64 {
    ticks as f64 * dt
}

/// Play `plan.episodes` episodes through `session` with scripted policies.
pub fn run_episodes<S: RecordStorage>(
    session: &mut TrainingSession<S>,
    plan: &RunPlan,
    verbose: bool,
) -> RunSummary {
    let started = Instant::now();
    let mut chaser = plan.chaser.create_policy(plan.seed);
    let mut evader = plan.evader.create_policy(plan.seed.wrapping_add(1));
    let mut episodes = Vec::new();
    if verbose {
        println!(
            "  {} chaser={} evader={}",
            "▶".cyan(),
            chaser.name().bold(),
            evader.name().bold()
        );
    }

    for index in 1..=plan.episodes {
        let scene = session.current_scene().name.clone();
        let budget = tick_budget(session.episode().config().max_episode_time, plan.dt);
        let mut observations = session.observations();
        let mut ticks = 0;
        let mut chaser_reward = 0.0;
        let mut evader_reward = 0.0;
        let mut finished = None;

        while ticks < budget {
            let chaser_action = chaser.act(Role::Chaser, observations.get(Role::Chaser));
            let evader_action = evader.act(Role::Evader, observations.get(Role::Evader));
            let report = session.tick(plan.dt, chaser_action, evader_action);
            ticks += 1;
            chaser_reward += report.step.chaser_reward;
            evader_reward += report.step.evader_reward;
            if let (Some(outcome), Some(advance)) = (report.step.terminal, report.episode_end) {
                finished = Some((outcome, advance));
                break;
            }
            observations = report.observations;
        }

        let sim_seconds = session.episode().elapsed();
        let summary = match finished {
            Some((outcome, advance)) => EpisodeSummary {
                index,
                scene,
                outcome: Some(outcome),
                ticks,
                sim_seconds: ticks_to_seconds(ticks, plan.dt),
                chaser_reward,
                evader_reward,
                scene_changed: advance.scene_changed,
                total_episodes: advance.record.total_episodes,
            },
            None => {
                log::warn!("episode {index} did not finish within {budget} ticks");
                session.episode_mut().reset();
                EpisodeSummary {
                    index,
                    scene,
                    outcome: None,
                    ticks,
                    sim_seconds,
                    chaser_reward,
                    evader_reward,
                    scene_changed: false,
                    total_episodes: session.progression().record().total_episodes,
                }
            }
        };

        if verbose {
            let outcome = summary
                .outcome
                .map_or_else(|| "unfinished".yellow(), |o| o.label().green());
            println!(
                "  episode {:>4} [{}] {} after {} ticks (chaser {:+.2}, evader {:+.2})",
                summary.index,
                summary.scene,
                outcome,
                summary.ticks,
                summary.chaser_reward,
                summary.evader_reward
            );
            if summary.scene_changed {
                println!("  {} {}", "↪".cyan(), session.current_scene().name.cyan());
            }
        }
        episodes.push(summary);
    }

    RunSummary {
        plan: *plan,
        chaser_policy: chaser.name().to_string(),
        evader_policy: evader.name().to_string(),
        episodes,
        record: session.progression().record(),
        wall_clock: started.elapsed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pursuit_game::{
        EpisodeConfig, MemoryRecordStorage, RotationSettings, SceneCatalog, SharedProgression,
    };

    fn session(per_scene: u64) -> TrainingSession<MemoryRecordStorage> {
        let catalog = SceneCatalog::load_from_static();
        let settings = RotationSettings::for_catalog(&catalog).with_episodes_per_scene(per_scene);
        let progression = SharedProgression::open(MemoryRecordStorage::new(), settings).unwrap();
        TrainingSession::new(EpisodeConfig::compiled(), catalog, progression).unwrap()
    }

    #[test]
    fn budget_covers_the_full_timer() {
        assert_eq!(tick_budget(30.0, 0.02), 1_501);
        assert_eq!(tick_budget(1.0, 0.3), 5);
    }

    #[test]
    fn idle_agents_always_time_out() {
        let mut session = session(200);
        let plan = RunPlan::new(2, 0.02, 7).with_policies(Strategy::Idle, Strategy::Idle);
        let summary = run_episodes(&mut session, &plan, false);

        assert_eq!(summary.episodes.len(), 2);
        assert_eq!(summary.count(EpisodeOutcome::EvaderSurvivedTimeout), 2);
        assert!(summary.episodes.iter().all(|ep| ep.ticks == 1_500));
        assert_eq!(summary.record.total_episodes, 2);
        assert_eq!(summary.record.evader_wins, 2);
        assert!(summary.capture_rate().abs() < f64::EPSILON);
    }

    #[test]
    fn summary_names_the_policies_that_played() {
        let mut session = session(200);
        let plan = RunPlan::new(0, 0.02, 3).with_policies(Strategy::Sweep, Strategy::Flee);
        let summary = run_episodes(&mut session, &plan, true);

        assert_eq!(summary.chaser_policy, "Sweep");
        assert_eq!(summary.evader_policy, "Flee");
        assert!(summary.episodes.is_empty());
    }

    #[test]
    fn every_episode_is_counted_once() {
        let mut session = session(2);
        let plan = RunPlan::new(5, 0.02, 11).with_policies(Strategy::Pursue, Strategy::Random);
        let summary = run_episodes(&mut session, &plan, false);

        assert_eq!(summary.unfinished(), 0);
        let totals: Vec<u64> = summary.episodes.iter().map(|ep| ep.total_episodes).collect();
        assert_eq!(totals, [1, 2, 3, 4, 5]);
        assert_eq!(summary.scene_changes(), 2);
        assert_eq!(summary.episodes[2].scene, "Scene 2");
        assert!(summary.average_ticks() > 0.0);
    }

    #[test]
    fn empty_summary_has_zero_stats() {
        let summary = RunSummary {
            plan: RunPlan::new(0, 0.02, 1),
            chaser_policy: "Idle".to_string(),
            evader_policy: "Idle".to_string(),
            episodes: Vec::new(),
            record: SceneRotationRecord::default(),
            wall_clock: Duration::ZERO,
        };
        assert!(summary.average_ticks().abs() < f64::EPSILON);
        assert!(summary.average_reward(Role::Chaser).abs() < f64::EPSILON);
        assert!(summary.capture_rate().abs() < f64::EPSILON);
    }
}
