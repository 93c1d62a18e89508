//! Wall-collision stun timer.
use serde::{Deserialize, Serialize};

/// Result of advancing the stun timer by one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StunTick {
    /// No stun was active.
    Idle,
    /// Still stunned after this tick.
    Holding,
    /// The stun expired during this tick.
    Released,
}

/// Timer that locks out an agent's actions after a wall hit.
///
/// `active` is derived from `remaining > 0`, so the two can never disagree.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StunController {
    remaining: f64,
}

impl StunController {
    #[must_use]
    pub const fn new() -> Self {
        Self { remaining: 0.0 }
    }

    /// Stun for `duration` seconds. Non-positive durations leave the agent idle.
    pub fn trigger(&mut self, duration: f64) {
        if duration > 0.0 && duration.is_finite() {
            self.remaining = duration;
        }
    }

    pub fn tick(&mut self, dt: f64) -> StunTick {
        if !self.is_active() {
            return StunTick::Idle;
        }
        self.remaining -= dt.max(0.0);
        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            StunTick::Released
        } else {
            StunTick::Holding
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.remaining > 0.0
    }

    #[must_use]
    pub const fn remaining(&self) -> f64 {
        self.remaining
    }

    pub const fn clear(&mut self) {
        self.remaining = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_then_tick_releases_once() {
        let mut stun = StunController::new();
        stun.trigger(1.0);
        assert!(stun.is_active());
        let mut releases = 0;
        for _ in 0..80 {
            if stun.tick(0.02) == StunTick::Released {
                releases += 1;
            }
        }
        assert_eq!(releases, 1);
        assert!(!stun.is_active());
        assert_eq!(stun.tick(0.02), StunTick::Idle);
    }

    #[test]
    fn non_positive_duration_never_activates() {
        let mut stun = StunController::new();
        stun.trigger(0.0);
        assert!(!stun.is_active());
        stun.trigger(-3.0);
        assert!(!stun.is_active());
        stun.trigger(f64::NAN);
        assert!(!stun.is_active());
    }

    #[test]
    fn retrigger_rearms_timer() {
        let mut stun = StunController::new();
        stun.trigger(1.0);
        assert_eq!(stun.tick(0.5), StunTick::Holding);
        stun.trigger(2.0);
        assert!((stun.remaining() - 2.0).abs() < f64::EPSILON);
        stun.clear();
        assert!(!stun.is_active());
    }
}
