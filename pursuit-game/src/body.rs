//! Rigid-body state and integration rules for arena agents.
use serde::{Deserialize, Serialize};

use crate::vector::Vec2;

/// How an agent's action turns into motion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum MovementMode {
    /// Accumulate `action * force` into velocity every tick.
    Force { force: f64 },
    /// Ease velocity toward `action * max_speed` at the given rate.
    VelocityTarget { acceleration: f64 },
}

/// Response applied to a body when it strikes a wall or boundary zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum WallResponse {
    /// Stop dead, then push off along the contact normal.
    Impulse { scale: f64 },
    /// Bounce back along the incoming path, losing energy.
    Reflect { dampening: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaBody {
    pub position: Vec2,
    pub velocity: Vec2,
    pub max_speed: f64,
    pub mass: f64,
    #[serde(default)]
    pub linear_damping: f64,
    pub spawn: Vec2,
}

impl ArenaBody {
    #[must_use]
    pub fn new(spawn: Vec2, max_speed: f64) -> Self {
        Self {
            position: spawn,
            velocity: Vec2::ZERO,
            max_speed: max_speed.max(0.0),
            mass: 1.0,
            linear_damping: 0.0,
            spawn,
        }
    }

    #[must_use]
    pub fn with_mass(mut self, mass: f64) -> Self {
        if mass > 0.0 {
            self.mass = mass;
        }
        self
    }

    #[must_use]
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.linear_damping = damping.max(0.0);
        self
    }

    /// Integrate a force over `dt` and clamp to the speed limit.
    pub fn apply_force(&mut self, force: Vec2, dt: f64) {
        self.velocity += force * (dt / self.mass);
        self.clamp_speed();
    }

    /// Ease velocity toward `target` by `clamp(accel * dt, 0, 1)`.
    pub fn apply_velocity_target(&mut self, target: Vec2, acceleration: f64, dt: f64) {
        self.velocity = self.velocity.lerp(target, acceleration * dt);
        self.clamp_speed();
    }

    /// Advance position by one tick, applying linear damping first.
    pub fn step(&mut self, dt: f64) {
        if self.linear_damping > 0.0 {
            self.velocity = self.velocity * (1.0 / self.linear_damping.mul_add(dt, 1.0));
        }
        self.position += self.velocity * dt;
    }

    pub fn on_wall_contact(&mut self, normal: Vec2, response: WallResponse) {
        match response {
            WallResponse::Impulse { scale } => {
                self.velocity = normal.direction() * (scale / self.mass);
            }
            WallResponse::Reflect { dampening } => {
                self.velocity = -self.velocity * dampening.clamp(0.0, 1.0);
            }
        }
        self.clamp_speed();
    }

    pub fn clamp_speed(&mut self) {
        self.velocity = self.velocity.clamp_length(self.max_speed);
    }

    #[must_use]
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    /// Return to the spawn point at rest.
    pub fn reset(&mut self) {
        self.position = self.spawn;
        self.velocity = Vec2::ZERO;
    }

    /// Move the spawn point and reset onto it.
    pub fn respawn_at(&mut self, spawn: Vec2) {
        self.spawn = spawn;
        self.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_integration_respects_speed_cap() {
        let mut body = ArenaBody::new(Vec2::ZERO, 5.0);
        for _ in 0..100 {
            body.apply_force(Vec2::new(20.0, 0.0), 0.02);
        }
        assert!(body.speed() <= 5.0 + 1e-12);
        assert!((body.velocity.x - 5.0).abs() < 1e-9);
    }

    #[test]
    fn velocity_target_lerps_and_caps() {
        let mut body = ArenaBody::new(Vec2::ZERO, 4.5);
        body.apply_velocity_target(Vec2::new(4.5, 0.0), 15.0, 0.02);
        assert!((body.velocity.x - 1.35).abs() < 1e-9);
        body.apply_velocity_target(Vec2::new(100.0, 0.0), 1_000.0, 1.0);
        assert!((body.speed() - 4.5).abs() < 1e-9);
    }

    #[test]
    fn impulse_wall_response_pushes_along_normal() {
        let mut body = ArenaBody::new(Vec2::ZERO, 5.0);
        body.velocity = Vec2::new(4.0, 0.0);
        body.on_wall_contact(Vec2::LEFT, WallResponse::Impulse { scale: 3.0 });
        assert_eq!(body.velocity, Vec2::new(-3.0, 0.0));
        body.on_wall_contact(Vec2::RIGHT, WallResponse::Impulse { scale: 10.0 });
        assert!((body.speed() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn reflect_wall_response_dampens() {
        let mut body = ArenaBody::new(Vec2::ZERO, 5.0);
        body.velocity = Vec2::new(2.0, -1.0);
        body.on_wall_contact(Vec2::LEFT, WallResponse::Reflect { dampening: 0.5 });
        assert_eq!(body.velocity, Vec2::new(-1.0, 0.5));
    }

    #[test]
    fn damping_slows_and_step_moves() {
        let mut body = ArenaBody::new(Vec2::ZERO, 5.0).with_damping(2.0);
        body.velocity = Vec2::new(5.0, 0.0);
        body.step(0.5);
        assert!((body.velocity.x - 2.5).abs() < 1e-9);
        assert!((body.position.x - 1.25).abs() < 1e-9);
        body.reset();
        assert_eq!(body.position, Vec2::ZERO);
        assert_eq!(body.velocity, Vec2::ZERO);
    }
}
