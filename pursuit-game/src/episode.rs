//! Single pursuit episode: tick integration, collision handling, terminal
//! detection, and reward flushing for both agents.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::agent::{Agent, AgentConfig, Role};
use crate::body::ArenaBody;
use crate::constants::{
    ARENA_SIZE, CAPTURE_REWARD, CAPTURE_TIME_BONUS, CAUGHT_PENALTY, ELAPSED_EPSILON,
    MAX_EPISODE_TIME, TIMEOUT_CHASER_REWARD, TIMEOUT_EVADER_REWARD,
};
use crate::contact::{CollisionEvent, CollisionKind};
use crate::facing::Facing;
use crate::observation::{self, ObservationContext};
use crate::patrol::Patroller;
use crate::scene::Scene;
use crate::vector::Vec2;

const DEFAULT_EPISODE_DATA: &str = include_str!("../data/episode.json");

/// How an episode ended. Produced once per episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeOutcome {
    ChaserCaughtEvader,
    EvaderSurvivedTimeout,
    ChaserTimedOut,
}

impl EpisodeOutcome {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ChaserCaughtEvader => "chaser_caught_evader",
            Self::EvaderSurvivedTimeout => "evader_survived_timeout",
            Self::ChaserTimedOut => "chaser_timed_out",
        }
    }

    #[must_use]
    pub const fn is_capture(self) -> bool {
        matches!(self, Self::ChaserCaughtEvader)
    }

    /// Role credited with the win, if any.
    #[must_use]
    pub const fn winner(self) -> Option<Role> {
        match self {
            Self::ChaserCaughtEvader => Some(Role::Chaser),
            Self::EvaderSurvivedTimeout => Some(Role::Evader),
            Self::ChaserTimedOut => None,
        }
    }
}

impl fmt::Display for EpisodeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which outcome a timeout produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutVerdict {
    /// Timeout is an evader win.
    #[default]
    EvaderSurvives,
    /// Timeout is a chaser failure; neither win counter moves.
    ChaserFails,
}

impl TimeoutVerdict {
    #[must_use]
    pub const fn outcome(self) -> EpisodeOutcome {
        match self {
            Self::EvaderSurvives => EpisodeOutcome::EvaderSurvivedTimeout,
            Self::ChaserFails => EpisodeOutcome::ChaserTimedOut,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeoutPolicy {
    #[serde(default)]
    pub verdict: TimeoutVerdict,
    #[serde(default = "TimeoutPolicy::default_chaser_reward")]
    pub chaser_reward: f64,
    #[serde(default = "TimeoutPolicy::default_evader_reward")]
    pub evader_reward: f64,
}

impl TimeoutPolicy {
    const fn default_chaser_reward() -> f64 {
        TIMEOUT_CHASER_REWARD
    }

    const fn default_evader_reward() -> f64 {
        TIMEOUT_EVADER_REWARD
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            verdict: TimeoutVerdict::default(),
            chaser_reward: Self::default_chaser_reward(),
            evader_reward: Self::default_evader_reward(),
        }
    }
}

/// Terminal rewards on capture. The chaser's share grows with time left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureRewards {
    #[serde(default = "CaptureRewards::default_catcher_reward")]
    pub catcher_reward: f64,
    #[serde(default = "CaptureRewards::default_time_bonus")]
    pub time_bonus: f64,
    #[serde(default = "CaptureRewards::default_caught_reward")]
    pub caught_reward: f64,
}

impl CaptureRewards {
    const fn default_catcher_reward() -> f64 {
        CAPTURE_REWARD
    }

    const fn default_time_bonus() -> f64 {
        CAPTURE_TIME_BONUS
    }

    const fn default_caught_reward() -> f64 {
        CAUGHT_PENALTY
    }

    /// Chaser reward for a capture with `fraction_left` of the clock remaining.
    #[must_use]
    pub fn catcher_total(&self, fraction_left: f64) -> f64 {
        self.time_bonus
            .mul_add(fraction_left.clamp(0.0, 1.0), self.catcher_reward)
    }
}

impl Default for CaptureRewards {
    fn default() -> Self {
        Self {
            catcher_reward: Self::default_catcher_reward(),
            time_bonus: Self::default_time_bonus(),
            caught_reward: Self::default_caught_reward(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum EpisodeConfigError {
    #[error("{field} must be a positive finite number (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{slot} slot holds a {found} config")]
    RoleMismatch { slot: Role, found: Role },
}

/// Everything needed to run episodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeConfig {
    #[serde(default = "EpisodeConfig::default_arena_size")]
    pub arena_size: f64,
    #[serde(default = "EpisodeConfig::default_max_episode_time")]
    pub max_episode_time: f64,
    #[serde(default = "AgentConfig::chaser_default")]
    pub chaser: AgentConfig,
    #[serde(default = "AgentConfig::evader_default")]
    pub evader: AgentConfig,
    #[serde(default)]
    pub timeout: TimeoutPolicy,
    #[serde(default)]
    pub capture: CaptureRewards,
}

impl EpisodeConfig {
    const fn default_arena_size() -> f64 {
        ARENA_SIZE
    }

    const fn default_max_episode_time() -> f64 {
        MAX_EPISODE_TIME
    }

    /// Parse the embedded tuning file, falling back to compiled constants.
    #[must_use]
    pub fn load_from_static() -> Self {
        serde_json::from_str(DEFAULT_EPISODE_DATA).unwrap_or_else(|err| {
            log::warn!("embedded episode config is invalid ({err}); using compiled defaults");
            Self::compiled()
        })
    }

    #[must_use]
    pub fn compiled() -> Self {
        Self {
            arena_size: Self::default_arena_size(),
            max_episode_time: Self::default_max_episode_time(),
            chaser: AgentConfig::chaser_default(),
            evader: AgentConfig::evader_default(),
            timeout: TimeoutPolicy::default(),
            capture: CaptureRewards::default(),
        }
    }

    #[must_use]
    pub const fn agent(&self, role: Role) -> &AgentConfig {
        match role {
            Role::Chaser => &self.chaser,
            Role::Evader => &self.evader,
        }
    }

    /// Reject values that would make the simulation divide by zero or stall.
    ///
    /// # Errors
    ///
    /// Returns the first non-positive or non-finite field, or a role placed in
    /// the wrong slot.
    pub fn validate(&self) -> Result<(), EpisodeConfigError> {
        let checks = [
            ("arena_size", self.arena_size),
            ("max_episode_time", self.max_episode_time),
            ("chaser.max_speed", self.chaser.max_speed),
            ("chaser.mass", self.chaser.mass),
            ("evader.max_speed", self.evader.max_speed),
            ("evader.mass", self.evader.mass),
        ];
        for (field, value) in checks {
            if !value.is_finite() || value <= 0.0 {
                return Err(EpisodeConfigError::NotPositive { field, value });
            }
        }
        for role in Role::ALL {
            let found = self.agent(role).role;
            if found != role {
                return Err(EpisodeConfigError::RoleMismatch { slot: role, found });
            }
        }
        Ok(())
    }
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self::load_from_static()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "outcome")]
pub enum EpisodePhase {
    Running,
    Terminated(EpisodeOutcome),
}

/// What one tick produced for the driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub chaser_reward: f64,
    pub evader_reward: f64,
    pub terminal: Option<EpisodeOutcome>,
    pub chaser_facing: Facing,
    pub evader_facing: Facing,
}

impl StepResult {
    #[must_use]
    pub const fn reward(&self, role: Role) -> f64 {
        match role {
            Role::Chaser => self.chaser_reward,
            Role::Evader => self.evader_reward,
        }
    }

    #[must_use]
    pub const fn facing(&self, role: Role) -> Facing {
        match role {
            Role::Chaser => self.chaser_facing,
            Role::Evader => self.evader_facing,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentView {
    pub position: Vec2,
    pub velocity: Vec2,
    pub facing: Facing,
    pub stunned: bool,
    pub episode_reward: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatrolView {
    pub position: Vec2,
    pub facing: Facing,
    pub alternate_frame: bool,
}

/// Read-only view of an episode for presentation and reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSnapshot {
    pub elapsed: f64,
    pub time_remaining: f64,
    pub max_episode_time: f64,
    pub chaser: Option<AgentView>,
    pub evader: Option<AgentView>,
    pub patrols: Vec<PatrolView>,
    /// Outcome of this episode, if it has ended.
    pub outcome: Option<EpisodeOutcome>,
    /// Outcome of the most recent finished episode, surviving resets.
    pub last_outcome: Option<EpisodeOutcome>,
}

/// Owns both agents and the scene's patrol NPCs for one episode at a time.
#[derive(Debug, Clone)]
pub struct PursuitEpisode {
    config: EpisodeConfig,
    agents: [Option<Agent>; 2],
    patrols: Vec<Patroller>,
    elapsed: f64,
    phase: EpisodePhase,
    last_outcome: Option<EpisodeOutcome>,
}

impl PursuitEpisode {
    /// Build an episode with both agents at their configured spawns.
    ///
    /// # Errors
    ///
    /// Returns an error when the config fails [`EpisodeConfig::validate`].
    pub fn new(config: EpisodeConfig) -> Result<Self, EpisodeConfigError> {
        config.validate()?;
        let agents = [
            Some(Agent::new(config.chaser.clone())),
            Some(Agent::new(config.evader.clone())),
        ];
        Ok(Self {
            config,
            agents,
            patrols: Vec::new(),
            elapsed: 0.0,
            phase: EpisodePhase::Running,
            last_outcome: None,
        })
    }

    /// Build an episode already placed into `scene`.
    ///
    /// # Errors
    ///
    /// Returns an error when the config fails [`EpisodeConfig::validate`].
    pub fn in_scene(config: EpisodeConfig, scene: &Scene) -> Result<Self, EpisodeConfigError> {
        let mut episode = Self::new(config)?;
        episode.reset_with_scene(scene);
        Ok(episode)
    }

    #[must_use]
    pub const fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    #[must_use]
    pub const fn agent(&self, role: Role) -> Option<&Agent> {
        self.agents[role.index()].as_ref()
    }

    pub const fn agent_mut(&mut self, role: Role) -> Option<&mut Agent> {
        self.agents[role.index()].as_mut()
    }

    #[must_use]
    pub fn body(&self, role: Role) -> Option<&ArenaBody> {
        self.agent(role).map(|agent| &agent.body)
    }

    /// Remove an agent. The other side then plays against nobody: it cannot
    /// capture or be captured and its opponent-relative inputs read zero.
    pub const fn detach(&mut self, role: Role) -> Option<Agent> {
        self.agents[role.index()].take()
    }

    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.elapsed
    }

    #[must_use]
    pub fn time_remaining(&self) -> f64 {
        (self.config.max_episode_time - self.elapsed).max(0.0)
    }

    #[must_use]
    pub const fn phase(&self) -> EpisodePhase {
        self.phase
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<EpisodeOutcome> {
        match self.phase {
            EpisodePhase::Running => None,
            EpisodePhase::Terminated(outcome) => Some(outcome),
        }
    }

    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        matches!(self.phase, EpisodePhase::Terminated(_))
    }

    #[must_use]
    pub fn patrols(&self) -> &[Patroller] {
        &self.patrols
    }

    /// Advance one fixed tick.
    ///
    /// `events` are the contacts observed for this tick, in order. Once the
    /// episode has ended every further call returns zero rewards and the same
    /// outcome without changing any state.
    pub fn advance(
        &mut self,
        dt: f64,
        chaser_action: Vec2,
        evader_action: Vec2,
        events: &[CollisionEvent],
    ) -> StepResult {
        if let EpisodePhase::Terminated(outcome) = self.phase {
            return self.step_result(0.0, 0.0, Some(outcome));
        }

        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt;
        if self.elapsed + ELAPSED_EPSILON >= self.config.max_episode_time {
            return self.time_out();
        }

        let mut acted = [false; 2];
        for (role, action) in [(Role::Chaser, chaser_action), (Role::Evader, evader_action)] {
            if let Some(agent) = self.agent_mut(role) {
                acted[role.index()] = agent.drive(action, dt);
                agent.body.step(dt);
            }
        }

        for event in events {
            let role = event.agent;
            match event.kind {
                CollisionKind::Opponent => {
                    if self.agent(role).is_some() && self.agent(role.opponent()).is_some() {
                        return self.capture();
                    }
                }
                CollisionKind::Wall => {
                    if let Some(agent) = self.agent_mut(role) {
                        agent.hit_wall(event.normal);
                    }
                }
                CollisionKind::WallStay => {
                    if let Some(agent) = self.agent_mut(role) {
                        agent.hug_wall();
                    }
                }
            }
        }

        let positions = Role::ALL.map(|role| self.body(role).map(|body| body.position));
        let arena_size = self.config.arena_size;
        for role in Role::ALL {
            let opponent = positions[role.opponent().index()];
            if let Some(agent) = self.agent_mut(role) {
                agent.shape(opponent, arena_size, acted[role.index()]);
            }
        }

        for patrol in &mut self.patrols {
            patrol.advance(dt);
        }
        self.flush(None)
    }

    fn capture(&mut self) -> StepResult {
        let capture = self.config.capture;
        let fraction_left = 1.0 - self.elapsed / self.config.max_episode_time;
        if let Some(chaser) = self.agent_mut(Role::Chaser) {
            chaser.rewards.add(capture.catcher_total(fraction_left));
        }
        if let Some(evader) = self.agent_mut(Role::Evader) {
            evader.rewards.add(capture.caught_reward);
        }
        log::debug!("evader caught after {:.2}s", self.elapsed);
        self.finish(EpisodeOutcome::ChaserCaughtEvader)
    }

    fn time_out(&mut self) -> StepResult {
        let timeout = self.config.timeout;
        if let Some(chaser) = self.agent_mut(Role::Chaser) {
            chaser.rewards.add(timeout.chaser_reward);
        }
        if let Some(evader) = self.agent_mut(Role::Evader) {
            evader.rewards.add(timeout.evader_reward);
        }
        let outcome = timeout.verdict.outcome();
        log::debug!("episode timed out after {:.2}s: {outcome}", self.elapsed);
        self.finish(outcome)
    }

    fn finish(&mut self, outcome: EpisodeOutcome) -> StepResult {
        self.phase = EpisodePhase::Terminated(outcome);
        self.last_outcome = Some(outcome);
        self.flush(Some(outcome))
    }

    fn flush(&mut self, terminal: Option<EpisodeOutcome>) -> StepResult {
        let mut rewards = [0.0; 2];
        for (slot, agent) in self.agents.iter_mut().enumerate() {
            if let Some(agent) = agent {
                agent.refresh_facing();
                rewards[slot] = agent.rewards.take_and_reset();
            }
        }
        self.step_result(rewards[0], rewards[1], terminal)
    }

    fn facing_of(&self, role: Role) -> Facing {
        self.agent(role).map_or_else(Facing::default, |agent| agent.facing)
    }

    fn step_result(
        &self,
        chaser_reward: f64,
        evader_reward: f64,
        terminal: Option<EpisodeOutcome>,
    ) -> StepResult {
        StepResult {
            chaser_reward,
            evader_reward,
            terminal,
            chaser_facing: self.facing_of(Role::Chaser),
            evader_facing: self.facing_of(Role::Evader),
        }
    }

    /// Observation for `role`. A detached role observes all zeros.
    #[must_use]
    pub fn observe(&self, role: Role) -> Vec<f64> {
        let ctx = ObservationContext {
            arena_size: self.config.arena_size,
            elapsed: self.elapsed,
            max_episode_time: self.config.max_episode_time,
        };
        self.agent(role).map_or_else(
            || vec![0.0; self.config.agent(role).observation.len()],
            |me| observation::observe(me, self.agent(role.opponent()), &ctx),
        )
    }

    /// Start a new episode on the current spawns.
    pub fn reset(&mut self) {
        for agent in self.agents.iter_mut().flatten() {
            agent.reset();
        }
        for patrol in &mut self.patrols {
            patrol.reset();
        }
        self.elapsed = 0.0;
        self.phase = EpisodePhase::Running;
    }

    /// Start a new episode in `scene`: new spawns and a new patrol roster.
    pub fn reset_with_scene(&mut self, scene: &Scene) {
        for (role, spawn) in [
            (Role::Chaser, scene.chaser_spawn),
            (Role::Evader, scene.evader_spawn),
        ] {
            if let Some(agent) = self.agent_mut(role) {
                agent.respawn_at(spawn);
            }
        }
        self.patrols = scene.patrols.iter().map(Patroller::new).collect();
        self.reset();
    }

    #[must_use]
    pub fn snapshot(&self) -> EpisodeSnapshot {
        let view = |role: Role| {
            self.agent(role).map(|agent| AgentView {
                position: agent.body.position,
                velocity: agent.body.velocity,
                facing: agent.facing,
                stunned: agent.is_stunned(),
                episode_reward: agent.rewards.episode_total(),
            })
        };
        EpisodeSnapshot {
            elapsed: self.elapsed,
            time_remaining: self.time_remaining(),
            max_episode_time: self.config.max_episode_time,
            chaser: view(Role::Chaser),
            evader: view(Role::Evader),
            patrols: self
                .patrols
                .iter()
                .map(|patrol| PatrolView {
                    position: patrol.position,
                    facing: patrol.facing(),
                    alternate_frame: patrol.alternate_frame(),
                })
                .collect(),
            outcome: self.outcome(),
            last_outcome: self.last_outcome,
        }
    }
}
