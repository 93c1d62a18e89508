//! Minimal 2D vector math for the arena.
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use crate::constants::DIRECTION_EPSILON;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };
    pub const UP: Self = Self { x: 0.0, y: 1.0 };
    pub const DOWN: Self = Self { x: 0.0, y: -1.0 };
    pub const LEFT: Self = Self { x: -1.0, y: 0.0 };
    pub const RIGHT: Self = Self { x: 1.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.y * other.y)
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Unit vector, or zero when the length is below `epsilon`.
    #[must_use]
    pub fn normalized_or_zero(self, epsilon: f64) -> Self {
        let len = self.length();
        if !len.is_finite() || len < epsilon {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len)
    }

    /// Unit vector using the arena-wide direction epsilon.
    #[must_use]
    pub fn direction(self) -> Self {
        self.normalized_or_zero(DIRECTION_EPSILON)
    }

    /// Rescale so the length never exceeds `max`.
    #[must_use]
    pub fn clamp_length(self, max: f64) -> Self {
        if !self.is_finite() {
            return Self::ZERO;
        }
        let len = self.length();
        if len > max && len > 0.0 {
            self * (max.max(0.0) / len)
        } else {
            self
        }
    }

    /// Component-wise clamp into `[min, max]`; NaN components collapse to zero.
    #[must_use]
    pub fn clamp_axes(self, min: f64, max: f64) -> Self {
        let clamp = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(min, max) };
        Self::new(clamp(self.x), clamp(self.y))
    }

    /// Linear interpolation; `t` is clamped to `[0, 1]`.
    #[must_use]
    pub fn lerp(self, target: Self, t: f64) -> Self {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        self + (target - self) * t
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizing_tiny_vectors_yields_zero() {
        assert_eq!(Vec2::new(0.001, 0.0).direction(), Vec2::ZERO);
        assert_eq!(Vec2::ZERO.direction(), Vec2::ZERO);
        let unit = Vec2::new(3.0, 4.0).direction();
        assert!((unit.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn clamp_length_preserves_direction() {
        let v = Vec2::new(30.0, 40.0).clamp_length(5.0);
        assert!((v.length() - 5.0).abs() < 1e-9);
        assert!((v.x - 3.0).abs() < 1e-9);
        assert_eq!(Vec2::new(1.0, 1.0).clamp_length(5.0), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn lerp_clamps_parameter() {
        let a = Vec2::ZERO;
        let b = Vec2::new(10.0, 0.0);
        assert_eq!(a.lerp(b, 2.0), b);
        assert_eq!(a.lerp(b, -1.0), a);
        assert_eq!(a.lerp(b, 0.5), Vec2::new(5.0, 0.0));
    }

    #[test]
    fn axis_clamp_scrubs_nan() {
        let v = Vec2::new(f64::NAN, 7.0).clamp_axes(-1.0, 1.0);
        assert_eq!(v, Vec2::new(0.0, 1.0));
    }
}
