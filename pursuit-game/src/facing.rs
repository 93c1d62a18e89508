//! Eight-way facing buckets derived from velocity, for sprite selection.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{FACING_AXIS_EPSILON, FACING_DIAGONAL_RATIO, FACING_MIN_SPEED};
use crate::vector::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Facing {
    /// Bucket a velocity, or `None` when the body is too slow to turn.
    #[must_use]
    pub fn from_velocity(velocity: Vec2) -> Option<Self> {
        if !velocity.is_finite() || velocity.length() < FACING_MIN_SPEED {
            return None;
        }
        let abs_x = velocity.x.abs();
        let abs_y = velocity.y.abs();

        if abs_x > FACING_AXIS_EPSILON && abs_y > FACING_AXIS_EPSILON {
            let ratio = abs_x.min(abs_y) / abs_x.max(abs_y);
            if ratio > FACING_DIAGONAL_RATIO {
                return Some(match (velocity.x > 0.0, velocity.y > 0.0) {
                    (true, true) => Self::UpRight,
                    (false, true) => Self::UpLeft,
                    (true, false) => Self::DownRight,
                    (false, false) => Self::DownLeft,
                });
            }
        }

        if abs_x > abs_y {
            Some(if velocity.x > 0.0 {
                Self::Right
            } else {
                Self::Left
            })
        } else {
            Some(if velocity.y > 0.0 { Self::Up } else { Self::Down })
        }
    }

    /// Keep `self` unless the velocity is fast enough to pick a new bucket.
    #[must_use]
    pub fn update(self, velocity: Vec2) -> Self {
        Self::from_velocity(velocity).unwrap_or(self)
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
            Self::UpLeft => "up_left",
            Self::UpRight => "up_right",
            Self::DownLeft => "down_left",
            Self::DownRight => "down_right",
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
