//! Generic arena agent, parameterized by role and tuning.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::body::{ArenaBody, MovementMode, WallResponse};
use crate::constants::{
    CHASER_LINEAR_DAMPING, CHASER_MAX_SPEED, CHASER_MOVE_FORCE, CHASER_SPAWN,
    CHASER_STUN_SECONDS, CHASER_WALL_IMPULSE, CHASER_WALL_PENALTY, CHASER_WALL_STAY_PENALTY,
    EVADER_ACCELERATION, EVADER_LINEAR_DAMPING, EVADER_MOVE_SPEED, EVADER_SPAWN,
    EVADER_STUN_SECONDS, EVADER_WALL_IMPULSE, EVADER_WALL_PENALTY, EVADER_WALL_STAY_PENALTY,
};
use crate::facing::Facing;
use crate::observation::ObservationLayout;
use crate::reward::{RewardAccumulator, RewardShaping, ShapingContext};
use crate::stun::{StunController, StunTick};
use crate::vector::Vec2;

/// Which side of the pursuit an agent plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Chaser,
    Evader,
}

impl Role {
    pub const ALL: [Self; 2] = [Self::Chaser, Self::Evader];

    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Chaser => Self::Evader,
            Self::Evader => Self::Chaser,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Chaser => 0,
            Self::Evader => 1,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Chaser => "chaser",
            Self::Evader => "evader",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Penalties and physical response for wall contact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WallTuning {
    pub hit_penalty: f64,
    pub stay_penalty: f64,
    pub stun_duration: f64,
    pub response: WallResponse,
}

/// Everything that distinguishes one agent type from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub role: Role,
    pub spawn: Vec2,
    pub max_speed: f64,
    #[serde(default = "AgentConfig::default_mass")]
    pub mass: f64,
    #[serde(default)]
    pub linear_damping: f64,
    pub movement: MovementMode,
    pub wall: WallTuning,
    pub shaping: RewardShaping,
    pub observation: ObservationLayout,
}

impl AgentConfig {
    const fn default_mass() -> f64 {
        1.0
    }

    /// Force-driven pursuer with a short stun and a hard bounce.
    #[must_use]
    pub fn chaser_default() -> Self {
        Self {
            role: Role::Chaser,
            spawn: Vec2::from(CHASER_SPAWN),
            max_speed: CHASER_MAX_SPEED,
            mass: Self::default_mass(),
            linear_damping: CHASER_LINEAR_DAMPING,
            movement: MovementMode::Force {
                force: CHASER_MOVE_FORCE,
            },
            wall: WallTuning {
                hit_penalty: CHASER_WALL_PENALTY,
                stay_penalty: CHASER_WALL_STAY_PENALTY,
                stun_duration: CHASER_STUN_SECONDS,
                response: WallResponse::Impulse {
                    scale: CHASER_WALL_IMPULSE,
                },
            },
            shaping: RewardShaping::chaser_default(),
            observation: ObservationLayout::Pursuer,
        }
    }

    /// Velocity-driven evader with a longer stun and a soft bounce.
    #[must_use]
    pub fn evader_default() -> Self {
        Self {
            role: Role::Evader,
            spawn: Vec2::from(EVADER_SPAWN),
            max_speed: EVADER_MOVE_SPEED,
            mass: Self::default_mass(),
            linear_damping: EVADER_LINEAR_DAMPING,
            movement: MovementMode::VelocityTarget {
                acceleration: EVADER_ACCELERATION,
            },
            wall: WallTuning {
                hit_penalty: EVADER_WALL_PENALTY,
                stay_penalty: EVADER_WALL_STAY_PENALTY,
                stun_duration: EVADER_STUN_SECONDS,
                response: WallResponse::Impulse {
                    scale: EVADER_WALL_IMPULSE,
                },
            },
            shaping: RewardShaping::evader_default(),
            observation: ObservationLayout::Evader,
        }
    }
}

/// One agent's mutable episode state.
#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    config: AgentConfig,
    pub body: ArenaBody,
    pub stun: StunController,
    pub rewards: RewardAccumulator,
    pub facing: Facing,
    last_distance: Option<f64>,
}

impl Agent {
    #[must_use]
    pub fn new(config: AgentConfig) -> Self {
        let body = ArenaBody::new(config.spawn, config.max_speed)
            .with_mass(config.mass)
            .with_damping(config.linear_damping);
        Self {
            config,
            body,
            stun: StunController::new(),
            rewards: RewardAccumulator::new(),
            facing: Facing::default(),
            last_distance: None,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.config.role
    }

    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.stun.is_active()
    }

    /// Tick the stun timer when stunned; otherwise apply the clamped action.
    ///
    /// Returns `true` when the action was applied.
    pub fn drive(&mut self, raw_action: Vec2, dt: f64) -> bool {
        if self.stun.is_active() {
            if self.stun.tick(dt) == StunTick::Released {
                log::trace!("{} recovered from stun", self.role());
            }
            return false;
        }
        self.apply_action(raw_action, dt);
        true
    }

    /// Clamp each axis to `[-1, 1]` and integrate with the configured mode.
    pub fn apply_action(&mut self, raw_action: Vec2, dt: f64) {
        let action = raw_action.clamp_axes(-1.0, 1.0);
        match self.config.movement {
            MovementMode::Force { force } => {
                self.body.apply_force(action * force, dt);
            }
            MovementMode::VelocityTarget { acceleration } => {
                let magnitude = action.length().min(1.0);
                let target = action.direction() * (self.config.max_speed * magnitude);
                self.body.apply_velocity_target(target, acceleration, dt);
            }
        }
    }

    /// Strike a wall: bounce, penalize, and stun.
    pub fn hit_wall(&mut self, normal: Vec2) {
        let wall = self.config.wall;
        self.body.on_wall_contact(normal, wall.response);
        self.rewards.add(wall.hit_penalty);
        self.stun.trigger(wall.stun_duration);
    }

    /// Continued wall contact: smaller penalty, no new stun.
    pub fn hug_wall(&mut self) {
        self.rewards.add(self.config.wall.stay_penalty);
    }

    /// Add this tick's shaping terms given the opponent's position, if any.
    ///
    /// `acted` is what [`Agent::drive`] returned this tick, so an agent that
    /// began the tick stunned earns nothing even on the tick its stun ends.
    /// Agents that did not act, or that a wall stunned this tick, still track
    /// the pair distance so the gap term does not pay out for ground covered
    /// while stunned.
    pub fn shape(&mut self, opponent: Option<Vec2>, arena_size: f64, acted: bool) {
        let relative = opponent.map(|target| {
            let to_opponent = target - self.body.position;
            (to_opponent, to_opponent.length())
        });
        if !acted || self.is_stunned() {
            if let Some((_, distance)) = relative {
                self.remember_distance(distance);
            }
            return;
        }

        self.rewards.add(self.config.shaping.per_tick);
        let Some((to_opponent, distance)) = relative else {
            return;
        };
        let ctx = ShapingContext {
            arena_size,
            distance,
            previous_distance: self.last_distance,
            velocity: self.body.velocity,
            to_opponent,
        };
        self.config.shaping.apply(&ctx, &mut self.rewards);
        self.remember_distance(distance);
    }

    #[must_use]
    pub const fn last_distance(&self) -> Option<f64> {
        self.last_distance
    }

    pub const fn remember_distance(&mut self, distance: f64) {
        self.last_distance = Some(distance);
    }

    pub fn refresh_facing(&mut self) {
        self.facing = self.facing.update(self.body.velocity);
    }

    /// Back to spawn with cleared timers and rewards.
    pub fn reset(&mut self) {
        self.body.reset();
        self.stun.clear();
        self.rewards.reset_episode();
        self.facing = Facing::default();
        self.last_distance = None;
    }

    /// Reset onto a new spawn point.
    pub fn respawn_at(&mut self, spawn: Vec2) {
        self.config.spawn = spawn;
        self.body.respawn_at(spawn);
        self.reset();
    }
}
