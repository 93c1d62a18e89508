//! Collision events and a reference contact detector for headless drivers.
//!
//! The episode only consumes [`CollisionEvent`]s. Engines with their own
//! physics feed events directly; [`ContactTracker`] derives them from plain
//! circle-vs-box geometry for drivers that have no engine.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::agent::Role;
use crate::body::ArenaBody;
use crate::constants::{AGENT_RADIUS, ARENA_HALF_EXTENT};
use crate::episode::PursuitEpisode;
use crate::vector::Vec2;

/// Events for one tick; most ticks carry zero to two.
pub type CollisionEvents = SmallVec<[CollisionEvent; 4]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionKind {
    /// Touched the other agent.
    Opponent,
    /// First tick of contact with a wall or boundary.
    Wall,
    /// Later ticks of the same wall contact.
    WallStay,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub agent: Role,
    pub kind: CollisionKind,
    /// Contact normal pointing away from the obstacle.
    #[serde(default)]
    pub normal: Vec2,
}

impl CollisionEvent {
    #[must_use]
    pub const fn opponent(agent: Role) -> Self {
        Self {
            agent,
            kind: CollisionKind::Opponent,
            normal: Vec2::ZERO,
        }
    }

    #[must_use]
    pub const fn wall(agent: Role, normal: Vec2) -> Self {
        Self {
            agent,
            kind: CollisionKind::Wall,
            normal,
        }
    }

    #[must_use]
    pub const fn wall_stay(agent: Role, normal: Vec2) -> Self {
        Self {
            agent,
            kind: CollisionKind::WallStay,
            normal,
        }
    }
}

/// Axis-aligned arena walls centred on the origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArenaBounds {
    pub half_width: f64,
    pub half_height: f64,
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self::square(ARENA_HALF_EXTENT)
    }
}

impl ArenaBounds {
    #[must_use]
    pub const fn square(half_extent: f64) -> Self {
        Self {
            half_width: half_extent,
            half_height: half_extent,
        }
    }

    /// Inward normal for a circle overlapping any wall, if it does.
    #[must_use]
    pub fn wall_normal(&self, position: Vec2, radius: f64) -> Option<Vec2> {
        let mut normal = Vec2::ZERO;
        if position.x - radius <= -self.half_width {
            normal.x += 1.0;
        }
        if position.x + radius >= self.half_width {
            normal.x -= 1.0;
        }
        if position.y - radius <= -self.half_height {
            normal.y += 1.0;
        }
        if position.y + radius >= self.half_height {
            normal.y -= 1.0;
        }
        (normal != Vec2::ZERO).then(|| normal.direction())
    }

    #[must_use]
    pub fn contains(&self, position: Vec2, radius: f64) -> bool {
        self.wall_normal(position, radius).is_none()
    }
}

/// Remembers which agents were touching a wall last tick so repeat contact
/// reports as [`CollisionKind::WallStay`].
#[derive(Debug, Clone, PartialEq)]
pub struct ContactTracker {
    bounds: ArenaBounds,
    agent_radius: f64,
    touching: [bool; 2],
}

impl ContactTracker {
    #[must_use]
    pub const fn new(bounds: ArenaBounds, agent_radius: f64) -> Self {
        Self {
            bounds,
            agent_radius,
            touching: [false; 2],
        }
    }

    #[must_use]
    pub const fn bounds(&self) -> ArenaBounds {
        self.bounds
    }

    #[must_use]
    pub const fn agent_radius(&self) -> f64 {
        self.agent_radius
    }

    /// Swap walls, e.g. after a scene change. Clears remembered contacts.
    pub const fn set_bounds(&mut self, bounds: ArenaBounds) {
        self.bounds = bounds;
        self.reset();
    }

    pub const fn reset(&mut self) {
        self.touching = [false; 2];
    }

    /// Derive this tick's events from the episode's current body positions.
    pub fn detect(&mut self, episode: &PursuitEpisode) -> CollisionEvents {
        self.detect_bodies(episode.body(Role::Chaser), episode.body(Role::Evader))
    }

    pub fn detect_bodies(
        &mut self,
        chaser: Option<&ArenaBody>,
        evader: Option<&ArenaBody>,
    ) -> CollisionEvents {
        let mut events = CollisionEvents::new();

        if let (Some(c), Some(e)) = (chaser, evader)
            && c.position.distance(e.position) <= self.agent_radius * 2.0
        {
            events.push(CollisionEvent::opponent(Role::Chaser));
            events.push(CollisionEvent::opponent(Role::Evader));
        }

        for (role, body) in [(Role::Chaser, chaser), (Role::Evader, evader)] {
            let slot = role.index();
            let Some(body) = body else {
                self.touching[slot] = false;
                continue;
            };
            match self.bounds.wall_normal(body.position, self.agent_radius) {
                Some(normal) if self.touching[slot] => {
                    events.push(CollisionEvent::wall_stay(role, normal));
                }
                Some(normal) => {
                    self.touching[slot] = true;
                    events.push(CollisionEvent::wall(role, normal));
                }
                None => self.touching[slot] = false,
            }
        }

        events
    }
}

impl Default for ContactTracker {
    fn default() -> Self {
        Self::new(ArenaBounds::default(), AGENT_RADIUS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_at(x: f64, y: f64) -> ArenaBody {
        ArenaBody::new(Vec2::new(x, y), 5.0)
    }

    #[test]
    fn overlapping_agents_emit_opponent_pair() {
        let mut tracker = ContactTracker::default();
        let events = tracker.detect_bodies(Some(&body_at(0.0, 0.0)), Some(&body_at(0.9, 0.0)));
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.kind == CollisionKind::Opponent));
    }

    #[test]
    fn wall_contact_enters_then_stays_then_clears() {
        let mut tracker = ContactTracker::default();
        let edge = body_at(7.8, 0.0);
        let first = tracker.detect_bodies(Some(&edge), None);
        assert_eq!(first.as_slice(), &[CollisionEvent::wall(Role::Chaser, Vec2::LEFT)]);
        let second = tracker.detect_bodies(Some(&edge), None);
        assert_eq!(second[0].kind, CollisionKind::WallStay);
        let clear = tracker.detect_bodies(Some(&body_at(0.0, 0.0)), None);
        assert!(clear.is_empty());
        let again = tracker.detect_bodies(Some(&edge), None);
        assert_eq!(again[0].kind, CollisionKind::Wall);
    }

    #[test]
    fn corner_normal_points_inward_diagonally() {
        let bounds = ArenaBounds::square(5.0);
        let normal = bounds.wall_normal(Vec2::new(-4.9, 4.9), 0.5).unwrap();
        assert!(normal.x > 0.0 && normal.y < 0.0);
        assert!((normal.length() - 1.0).abs() < 1e-12);
        assert!(bounds.contains(Vec2::ZERO, 0.5));
    }
}
