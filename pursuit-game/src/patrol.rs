//! Scripted bystanders that walk a looping route through a scene.
use serde::{Deserialize, Serialize};

use crate::constants::{PATROL_FRAME_SECONDS, PATROL_SPEED};
use crate::facing::Facing;
use crate::vector::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatrolLeg {
    pub direction: Vec2,
    pub distance: f64,
}

impl PatrolLeg {
    #[must_use]
    pub const fn new(direction: Vec2, distance: f64) -> Self {
        Self {
            direction,
            distance,
        }
    }
}

/// Ordered legs; after the last leg the route resumes at `loop_to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolRoute {
    pub legs: Vec<PatrolLeg>,
    #[serde(default)]
    pub loop_to: usize,
}

impl Default for PatrolRoute {
    /// Left, down, right, up, left; then back to the down leg since the
    /// walker is already on the left side.
    fn default() -> Self {
        Self {
            legs: vec![
                PatrolLeg::new(Vec2::LEFT, 5.5),
                PatrolLeg::new(Vec2::DOWN, 6.5),
                PatrolLeg::new(Vec2::RIGHT, 11.5),
                PatrolLeg::new(Vec2::UP, 6.5),
                PatrolLeg::new(Vec2::LEFT, 11.5),
            ],
            loop_to: 1,
        }
    }
}

/// Where a patrol starts within a scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatrolSpawn {
    pub position: Vec2,
    #[serde(default = "PatrolSpawn::default_speed")]
    pub speed: f64,
    #[serde(default)]
    pub route: PatrolRoute,
}

impl PatrolSpawn {
    const fn default_speed() -> f64 {
        PATROL_SPEED
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Patroller {
    spawn: Vec2,
    speed: f64,
    route: PatrolRoute,
    pub position: Vec2,
    leg: usize,
    traveled: f64,
    frame_timer: f64,
    alternate_frame: bool,
}

impl Patroller {
    #[must_use]
    pub fn new(spawn: &PatrolSpawn) -> Self {
        Self {
            spawn: spawn.position,
            speed: spawn.speed.max(0.0),
            route: spawn.route.clone(),
            position: spawn.position,
            leg: 0,
            traveled: 0.0,
            frame_timer: 0.0,
            alternate_frame: false,
        }
    }

    fn current_leg(&self) -> Option<PatrolLeg> {
        self.route.legs.get(self.leg).copied()
    }

    pub fn advance(&mut self, dt: f64) {
        let Some(leg) = self.current_leg() else {
            return;
        };
        let step = self.speed * dt;
        self.position += leg.direction * step;
        self.traveled += step;
        if self.traveled >= leg.distance {
            self.next_leg();
        }

        self.frame_timer += dt;
        if self.frame_timer >= PATROL_FRAME_SECONDS {
            self.frame_timer = 0.0;
            self.alternate_frame = !self.alternate_frame;
        }
    }

    fn next_leg(&mut self) {
        self.traveled = 0.0;
        self.leg += 1;
        if self.leg >= self.route.legs.len() {
            self.leg = self.route.loop_to.min(self.route.legs.len().saturating_sub(1));
        }
    }

    #[must_use]
    pub fn facing(&self) -> Facing {
        self.current_leg()
            .and_then(|leg| Facing::from_velocity(leg.direction))
            .unwrap_or_default()
    }

    #[must_use]
    pub const fn leg_index(&self) -> usize {
        self.leg
    }

    /// Which of the two walk-cycle frames is showing.
    #[must_use]
    pub const fn alternate_frame(&self) -> bool {
        self.alternate_frame
    }

    pub fn reset(&mut self) {
        self.position = self.spawn;
        self.leg = 0;
        self.traveled = 0.0;
        self.frame_timer = 0.0;
        self.alternate_frame = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walker() -> Patroller {
        Patroller::new(&PatrolSpawn {
            position: Vec2::ZERO,
            speed: 2.0,
            route: PatrolRoute::default(),
        })
    }

    #[test]
    fn walks_first_leg_then_turns_down() {
        let mut npc = walker();
        assert_eq!(npc.facing(), Facing::Left);
        for _ in 0..280 {
            npc.advance(0.01);
        }
        assert_eq!(npc.leg_index(), 1);
        assert_eq!(npc.facing(), Facing::Down);
        assert!((npc.position.x + 5.5).abs() < 0.05);
    }

    #[test]
    fn loops_back_to_second_leg() {
        let mut npc = walker();
        let total: f64 = PatrolRoute::default().legs.iter().map(|l| l.distance).sum();
        let mut elapsed = 0.0;
        while elapsed < (total + 3.0) / 2.0 {
            npc.advance(0.05);
            elapsed += 0.05;
        }
        assert_eq!(npc.leg_index(), 1);
    }

    #[test]
    fn animation_frame_flips_on_interval() {
        let mut npc = walker();
        npc.advance(0.2);
        assert!(!npc.alternate_frame());
        npc.advance(0.25);
        assert!(npc.alternate_frame());
        npc.reset();
        assert_eq!(npc.position, Vec2::ZERO);
        assert!(!npc.alternate_frame());
    }
}
