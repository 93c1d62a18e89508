//! Observation vectors handed to external policies.
//!
//! Layouts are fixed-width. When the opponent is missing the opponent-relative
//! block is zero-filled in place so the width never changes. The evader layout
//! carries 14 live values followed by two zero pad slots, matching the declared
//! 16-wide sensor that trainers are configured for.
use serde::{Deserialize, Serialize};

use crate::agent::Agent;

/// Chaser layout width.
pub const PURSUER_OBSERVATION_LEN: usize = 7;
/// Evader layout width.
pub const EVADER_OBSERVATION_LEN: usize = 16;
/// Evader slots that depend on the threat.
pub const EVADER_THREAT_BLOCK: std::ops::Range<usize> = 4..13;
const EVADER_TIME_SLOT: usize = 13;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationLayout {
    /// direction to target (2), distance (1), own velocity (2), target velocity (2)
    Pursuer,
    /// position (2), own velocity (2), offset to threat (2), distance (1),
    /// escape direction (2), threat velocity (2), relative velocity (2),
    /// time remaining (1), padding (2)
    Evader,
}

impl ObservationLayout {
    #[must_use]
    pub const fn len(self) -> usize {
        match self {
            Self::Pursuer => PURSUER_OBSERVATION_LEN,
            Self::Evader => EVADER_OBSERVATION_LEN,
        }
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        false
    }
}

/// Shared inputs for building any layout.
#[derive(Debug, Clone, Copy)]
pub struct ObservationContext {
    pub arena_size: f64,
    pub elapsed: f64,
    pub max_episode_time: f64,
}

impl ObservationContext {
    fn time_remaining_fraction(&self) -> f64 {
        if self.max_episode_time <= 0.0 {
            return 0.0;
        }
        1.0 - self.elapsed / self.max_episode_time
    }
}

/// Build the observation for `me` using its configured layout.
#[must_use]
pub fn observe(me: &Agent, opponent: Option<&Agent>, ctx: &ObservationContext) -> Vec<f64> {
    match me.config().observation {
        ObservationLayout::Pursuer => observe_pursuer(me, opponent, ctx),
        ObservationLayout::Evader => observe_evader(me, opponent, ctx),
    }
}

fn ratio(value: f64, scale: f64) -> f64 {
    if scale > 0.0 { value / scale } else { 0.0 }
}

fn observe_pursuer(me: &Agent, target: Option<&Agent>, ctx: &ObservationContext) -> Vec<f64> {
    let mut obs = vec![0.0; PURSUER_OBSERVATION_LEN];
    let Some(target) = target else {
        return obs;
    };
    let offset = target.body.position - me.body.position;
    let direction = offset.direction();
    let own_speed = me.body.max_speed;
    let target_speed = target.body.max_speed;

    obs[0] = direction.x;
    obs[1] = direction.y;
    obs[2] = ratio(offset.length(), ctx.arena_size);
    obs[3] = ratio(me.body.velocity.x, own_speed);
    obs[4] = ratio(me.body.velocity.y, own_speed);
    obs[5] = ratio(target.body.velocity.x, target_speed);
    obs[6] = ratio(target.body.velocity.y, target_speed);
    obs
}

fn observe_evader(me: &Agent, threat: Option<&Agent>, ctx: &ObservationContext) -> Vec<f64> {
    let mut obs = vec![0.0; EVADER_OBSERVATION_LEN];
    let own_speed = me.body.max_speed;

    obs[0] = ratio(me.body.position.x, ctx.arena_size);
    obs[1] = ratio(me.body.position.y, ctx.arena_size);
    obs[2] = ratio(me.body.velocity.x, own_speed);
    obs[3] = ratio(me.body.velocity.y, own_speed);

    if let Some(threat) = threat {
        let offset = threat.body.position - me.body.position;
        let away = -offset.direction();
        let relative = me.body.velocity - threat.body.velocity;

        obs[4] = ratio(offset.x, ctx.arena_size);
        obs[5] = ratio(offset.y, ctx.arena_size);
        obs[6] = ratio(offset.length(), ctx.arena_size);
        obs[7] = away.x;
        obs[8] = away.y;
        obs[9] = ratio(threat.body.velocity.x, own_speed);
        obs[10] = ratio(threat.body.velocity.y, own_speed);
        obs[11] = ratio(relative.x, own_speed);
        obs[12] = ratio(relative.y, own_speed);
    }

    obs[EVADER_TIME_SLOT] = ctx.time_remaining_fraction();
    obs
}
