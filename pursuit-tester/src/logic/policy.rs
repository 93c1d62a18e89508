use std::fmt;

use clap::ValueEnum;
use pursuit_game::{Role, Vec2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

// Observation slots the scripted policies read.
const PURSUER_DIRECTION: usize = 0;
const EVADER_THREAT_OFFSET: usize = 4;
const EVADER_ESCAPE_DIRECTION: usize = 7;

/// Scripted stand-in for a trained policy. Sees only the observation vector.
pub trait PursuitPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Pick a raw action for `role` given its current observation.
    fn act(&mut self, role: Role, observation: &[f64]) -> Vec2;
}

/// Built-in scripted policies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Never move.
    Idle,
    /// Head straight for the opponent.
    Pursue,
    /// Head straight away from the opponent.
    Flee,
    /// Uniform random action every tick.
    Random,
    /// Turn slowly in a circle regardless of the opponent.
    Sweep,
}

impl Strategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pursue => "pursue",
            Self::Flee => "flee",
            Self::Random => "random",
            Self::Sweep => "sweep",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PursuitPolicy + Send> {
        match self {
            Self::Idle => Box::new(IdlePolicy),
            Self::Pursue => Box::new(PursuePolicy),
            Self::Flee => Box::new(FleePolicy),
            Self::Random => Box::new(RandomPolicy::new(seed)),
            Self::Sweep => Box::new(SweepPolicy::default()),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn pair(observation: &[f64], start: usize) -> Vec2 {
    match observation.get(start..start + 2) {
        Some([x, y]) => Vec2::new(*x, *y),
        _ => Vec2::ZERO,
    }
}

/// Unit direction toward the opponent as seen in `role`'s layout.
fn toward_opponent(role: Role, observation: &[f64]) -> Vec2 {
    match role {
        Role::Chaser => pair(observation, PURSUER_DIRECTION),
        Role::Evader => pair(observation, EVADER_THREAT_OFFSET).direction(),
    }
}

fn away_from_opponent(role: Role, observation: &[f64]) -> Vec2 {
    match role {
        Role::Chaser => -pair(observation, PURSUER_DIRECTION),
        Role::Evader => pair(observation, EVADER_ESCAPE_DIRECTION),
    }
}

struct IdlePolicy;

impl PursuitPolicy for IdlePolicy {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn act(&mut self, _role: Role, _observation: &[f64]) -> Vec2 {
        Vec2::ZERO
    }
}

struct PursuePolicy;

impl PursuitPolicy for PursuePolicy {
    fn name(&self) -> &'static str {
        "Pursue"
    }

    fn act(&mut self, role: Role, observation: &[f64]) -> Vec2 {
        toward_opponent(role, observation)
    }
}

struct FleePolicy;

impl PursuitPolicy for FleePolicy {
    fn name(&self) -> &'static str {
        "Flee"
    }

    fn act(&mut self, role: Role, observation: &[f64]) -> Vec2 {
        away_from_opponent(role, observation)
    }
}

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PursuitPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn act(&mut self, _role: Role, _observation: &[f64]) -> Vec2 {
        Vec2::new(self.rng.gen_range(-1.0..=1.0), self.rng.gen_range(-1.0..=1.0))
    }
}

#[derive(Default)]
struct SweepPolicy {
    heading: f64,
}

impl SweepPolicy {
    const TURN_PER_TICK: f64 = 0.05;
}

impl PursuitPolicy for SweepPolicy {
    fn name(&self) -> &'static str {
        "Sweep"
    }

    fn act(&mut self, _role: Role, _observation: &[f64]) -> Vec2 {
        let (sin, cos) = self.heading.sin_cos();
        self.heading = (self.heading + Self::TURN_PER_TICK) % std::f64::consts::TAU;
        Vec2::new(cos, sin)
    }
}
