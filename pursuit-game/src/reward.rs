//! Per-agent reward accumulation and distance-based shaping tables.
use serde::{Deserialize, Serialize};

use crate::constants::{
    CHASER_PROXIMITY_WEIGHT, CHASER_URGENCY_PER_TICK, EVADER_GAP_GAIN, EVADER_SPRINT_MIN_SPEED,
    EVADER_SPRINT_RADIUS, EVADER_SPRINT_REWARD, EVADER_SURVIVAL_PER_TICK,
};
use crate::vector::Vec2;

/// Running reward total for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RewardAccumulator {
    total: f64,
    episode_total: f64,
}

impl RewardAccumulator {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            total: 0.0,
            episode_total: 0.0,
        }
    }

    pub fn add(&mut self, delta: f64) {
        if delta.is_finite() {
            self.total += delta;
            self.episode_total += delta;
        }
    }

    /// Return everything added since the last take and zero the pending total.
    pub const fn take_and_reset(&mut self) -> f64 {
        let taken = self.total;
        self.total = 0.0;
        taken
    }

    #[must_use]
    pub const fn total(&self) -> f64 {
        self.total
    }

    /// Sum of every reward since the episode began.
    #[must_use]
    pub const fn episode_total(&self) -> f64 {
        self.episode_total
    }

    pub const fn reset_episode(&mut self) {
        self.total = 0.0;
        self.episode_total = 0.0;
    }
}

/// Shape of the continuous distance reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Envelope {
    /// Grows as the opponent gets closer.
    Proximity,
    /// Grows as the opponent gets farther away.
    Separation,
}

/// Flat reward granted while the agent-pair distance sits in `[min, max)`.
/// A missing `max` leaves the band open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceBand {
    #[serde(default)]
    pub min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    pub reward: f64,
}

impl DistanceBand {
    #[must_use]
    pub const fn new(min: f64, max: f64, reward: f64) -> Self {
        Self {
            min,
            max: Some(max),
            reward,
        }
    }

    #[must_use]
    pub const fn beyond(min: f64, reward: f64) -> Self {
        Self {
            min,
            max: None,
            reward,
        }
    }

    #[must_use]
    pub fn contains(&self, distance: f64) -> bool {
        distance >= self.min && self.max.is_none_or(|max| distance < max)
    }
}

/// Bonus for moving fast while the opponent is close.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SprintBonus {
    pub within: f64,
    pub min_speed: f64,
    pub reward: f64,
}

/// Inputs for one shaping evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ShapingContext {
    pub arena_size: f64,
    pub distance: f64,
    pub previous_distance: Option<f64>,
    pub velocity: Vec2,
    pub to_opponent: Vec2,
}

/// Per-tick shaping table for one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardShaping {
    #[serde(default)]
    pub per_tick: f64,
    #[serde(default = "RewardShaping::default_envelope")]
    pub envelope: Envelope,
    #[serde(default)]
    pub envelope_weight: f64,
    #[serde(default)]
    pub bands: Vec<DistanceBand>,
    #[serde(default)]
    pub gap_gain: f64,
    #[serde(default)]
    pub sprint: Option<SprintBonus>,
    #[serde(default)]
    pub alignment_gain: f64,
}

impl RewardShaping {
    const fn default_envelope() -> Envelope {
        Envelope::Proximity
    }

    /// Aggressive pursuit shaping: closeness pays, distance costs.
    #[must_use]
    pub fn chaser_default() -> Self {
        Self {
            per_tick: CHASER_URGENCY_PER_TICK,
            envelope: Envelope::Proximity,
            envelope_weight: CHASER_PROXIMITY_WEIGHT,
            bands: vec![
                DistanceBand::new(0.0, 2.0, 0.5),
                DistanceBand::new(2.0, 4.0, 0.1),
                DistanceBand::beyond(8.0, -0.1),
            ],
            gap_gain: 0.0,
            sprint: None,
            alignment_gain: 0.0,
        }
    }

    /// Survival shaping: staying alive and opening gaps pays.
    #[must_use]
    pub const fn evader_default() -> Self {
        Self {
            per_tick: EVADER_SURVIVAL_PER_TICK,
            envelope: Envelope::Separation,
            envelope_weight: 0.0,
            bands: Vec::new(),
            gap_gain: EVADER_GAP_GAIN,
            sprint: Some(SprintBonus {
                within: EVADER_SPRINT_RADIUS,
                min_speed: EVADER_SPRINT_MIN_SPEED,
                reward: EVADER_SPRINT_REWARD,
            }),
            alignment_gain: 0.0,
        }
    }

    #[must_use]
    pub fn envelope_reward(&self, arena_size: f64, distance: f64) -> f64 {
        if self.envelope_weight == 0.0 || arena_size <= 0.0 {
            return 0.0;
        }
        let normalized = match self.envelope {
            Envelope::Proximity => (arena_size - distance) / arena_size,
            Envelope::Separation => distance / arena_size,
        };
        normalized * self.envelope_weight
    }

    #[must_use]
    pub fn band_reward(&self, distance: f64) -> f64 {
        self.bands
            .iter()
            .filter(|band| band.contains(distance))
            .map(|band| band.reward)
            .sum()
    }

    #[must_use]
    pub fn gap_reward(&self, distance: f64, previous: Option<f64>) -> f64 {
        match previous {
            Some(prev) if prev > 0.0 && distance > prev => (distance - prev) * self.gap_gain,
            _ => 0.0,
        }
    }

    #[must_use]
    pub fn sprint_reward(&self, distance: f64, speed: f64) -> f64 {
        match self.sprint {
            Some(bonus) if distance < bonus.within && speed > bonus.min_speed => bonus.reward,
            _ => 0.0,
        }
    }

    #[must_use]
    pub fn alignment_reward(&self, velocity: Vec2, to_opponent: Vec2) -> f64 {
        if self.alignment_gain == 0.0 {
            return 0.0;
        }
        velocity.direction().dot(to_opponent.direction()) * self.alignment_gain
    }

    /// Feed every opponent-relative shaping term into `acc`.
    pub fn apply(&self, ctx: &ShapingContext, acc: &mut RewardAccumulator) {
        acc.add(self.envelope_reward(ctx.arena_size, ctx.distance));
        acc.add(self.band_reward(ctx.distance));
        acc.add(self.gap_reward(ctx.distance, ctx.previous_distance));
        acc.add(self.sprint_reward(ctx.distance, ctx.velocity.length()));
        acc.add(self.alignment_reward(ctx.velocity, ctx.to_opponent));
    }

    /// Sum of the opponent-relative terms, without touching an accumulator.
    #[must_use]
    pub fn evaluate(&self, ctx: &ShapingContext) -> f64 {
        let mut scratch = RewardAccumulator::new();
        self.apply(ctx, &mut scratch);
        scratch.total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(distance: f64) -> ShapingContext {
        ShapingContext {
            arena_size: 10.0,
            distance,
            previous_distance: None,
            velocity: Vec2::ZERO,
            to_opponent: Vec2::new(distance, 0.0),
        }
    }

    #[test]
    fn accumulator_take_and_reset() {
        let mut acc = RewardAccumulator::new();
        acc.add(0.5);
        acc.add(-0.25);
        acc.add(f64::NAN);
        assert!((acc.take_and_reset() - 0.25).abs() < f64::EPSILON);
        assert!(acc.total().abs() < f64::EPSILON);
        assert!((acc.episode_total() - 0.25).abs() < f64::EPSILON);
        acc.reset_episode();
        assert!(acc.episode_total().abs() < f64::EPSILON);
    }

    #[test]
    fn chaser_reward_grows_as_distance_shrinks() {
        let shaping = RewardShaping::chaser_default();
        let samples = [9.0, 6.0, 3.0, 1.0];
        let rewards: Vec<f64> = samples.iter().map(|d| shaping.evaluate(&ctx(*d))).collect();
        assert!(rewards.windows(2).all(|w| w[0] < w[1]), "{rewards:?}");
    }

    #[test]
    fn separation_envelope_grows_with_distance() {
        let shaping = RewardShaping {
            envelope_weight: 0.05,
            ..RewardShaping::evader_default()
        };
        assert!(shaping.evaluate(&ctx(8.0)) > shaping.evaluate(&ctx(2.0)));
    }

    #[test]
    fn gap_reward_only_counts_opening() {
        let shaping = RewardShaping::evader_default();
        assert!((shaping.gap_reward(5.5, Some(5.0)) - 0.5).abs() < 1e-12);
        assert!(shaping.gap_reward(4.5, Some(5.0)).abs() < f64::EPSILON);
        assert!(shaping.gap_reward(4.5, None).abs() < f64::EPSILON);
    }

    #[test]
    fn sprint_bonus_requires_speed_and_danger() {
        let shaping = RewardShaping::evader_default();
        assert!((shaping.sprint_reward(2.0, 3.0) - 0.005).abs() < f64::EPSILON);
        assert!(shaping.sprint_reward(2.0, 1.0).abs() < f64::EPSILON);
        assert!(shaping.sprint_reward(4.0, 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn alignment_uses_unit_vectors() {
        let shaping = RewardShaping {
            alignment_gain: 0.2,
            ..RewardShaping::chaser_default()
        };
        let toward = shaping.alignment_reward(Vec2::new(3.0, 0.0), Vec2::new(10.0, 0.0));
        let away = shaping.alignment_reward(Vec2::new(-3.0, 0.0), Vec2::new(10.0, 0.0));
        assert!((toward - 0.2).abs() < 1e-12);
        assert!((away + 0.2).abs() < 1e-12);
    }

    #[test]
    fn shaping_table_deserializes_with_open_bands() {
        let json = r#"{ "per_tick": -0.001, "bands": [ { "min": 8.0, "reward": -0.1 } ] }"#;
        let shaping: RewardShaping = serde_json::from_str(json).unwrap();
        assert!(shaping.bands[0].contains(1_000.0));
        assert_eq!(shaping.envelope, Envelope::Proximity);
    }
}
