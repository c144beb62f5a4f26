//! Planar vector on the (x, z) ground plane.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Tolerance used by equality.
pub const EPSILON: f32 = 1e-5;

/// Position or direction on the ground plane. There is no vertical axis.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// X coordinate.
    pub x: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Vec2 {
    /// Origin.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Creates a vector.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// True when neither component is NaN or infinite.
    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.z.is_finite()
    }

    /// Squared length.
    #[inline]
    #[must_use]
    pub fn sqr_magnitude(self) -> f32 {
        self.x * self.x + self.z * self.z
    }

    /// Length.
    #[inline]
    #[must_use]
    pub fn magnitude(self) -> f32 {
        self.sqr_magnitude().sqrt()
    }

    /// Unit vector in the same direction, or zero for the zero vector.
    #[must_use]
    pub fn normalized(self) -> Self {
        let magnitude = self.magnitude();
        if magnitude > 0.0 {
            self / magnitude
        } else {
            Self::ZERO
        }
    }

    /// Distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (other - self).magnitude()
    }

    /// Squared distance to `other`.
    #[inline]
    #[must_use]
    pub fn sqr_distance(self, other: Self) -> f32 {
        (other - self).sqr_magnitude()
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.z * other.z
    }

    /// Linear interpolation, `t` clamped to [0, 1].
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        self + (other - self) * t
    }

    /// Moves from `self` toward `target` by at most `max_step`.
    #[must_use]
    pub fn move_towards(self, target: Self, max_step: f32) -> Self {
        let delta = target - self;
        let distance = delta.magnitude();
        if distance <= max_step || distance == 0.0 {
            target
        } else {
            self + delta / distance * max_step
        }
    }
}

impl PartialEq for Vec2 {
    fn eq(&self, other: &Self) -> bool {
        (self.x - other.x).abs() < EPSILON && (self.z - other.z).abs() < EPSILON
    }
}

impl std::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.z)
    }
}

impl Add for Vec2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.z + rhs.z)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.z += rhs.z;
    }
}

impl Sub for Vec2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.z - rhs.z)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.z -= rhs.z;
    }
}

impl Neg for Vec2 {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.z)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;
    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;
    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.z / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude_and_normalize() {
        let v = Vec2::new(3.0, 4.0);
        assert!((v.magnitude() - 5.0).abs() < EPSILON);
        assert_eq!(v.normalized(), Vec2::new(0.6, 0.8));
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
    }

    #[test]
    fn test_move_towards_stops_at_target() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(1.0, 0.0);
        assert_eq!(a.move_towards(b, 0.25), Vec2::new(0.25, 0.0));
        assert_eq!(a.move_towards(b, 5.0), b);
    }

    #[test]
    fn test_equality_uses_epsilon() {
        assert_eq!(Vec2::new(1.0, 1.0), Vec2::new(1.0 + 1e-7, 1.0));
        assert_ne!(Vec2::new(1.0, 1.0), Vec2::new(1.01, 1.0));
    }

    #[test]
    fn test_is_finite() {
        assert!(Vec2::new(-1e30, 4.0).is_finite());
        assert!(!Vec2::new(f32::INFINITY, 0.0).is_finite());
        assert!(!Vec2::new(0.0, f32::NAN).is_finite());
    }

    #[test]
    fn test_lerp_clamps() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(2.0, 2.0);
        assert_eq!(a.lerp(b, 0.5), Vec2::new(1.0, 1.0));
        assert_eq!(a.lerp(b, 3.0), b);
    }
}
