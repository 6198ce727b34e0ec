//! Two-dimensional vector algebra.
//!
//! [`Vec2`] is a plain value; [`VectorValue`] pairs two
//! [`AnimatedValue`]s so each axis can be driven by its own animation.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use crate::value::{AnimatedValue, FrameRuntime};

/// A plain 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
}

impl Vec2 {
    /// The zero vector.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a vector.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// A vector with both components set to `v`.
    #[must_use]
    pub const fn splat(v: f64) -> Self {
        Self { x: v, y: v }
    }

    /// Component-wise clamp into `[min, max]`.
    #[must_use]
    pub fn clamp(self, min: Self, max: Self) -> Self {
        Self {
            x: self.x.max(min.x).min(max.x),
            y: self.y.max(min.y).min(max.y),
        }
    }

    /// Component-wise division; a zero divisor yields zero for that axis.
    #[must_use]
    pub fn divide(self, by: Self) -> Self {
        let safe = |a: f64, b: f64| if b == 0.0 { 0.0 } else { a / b };
        Self {
            x: safe(self.x, by.x),
            y: safe(self.y, by.y),
        }
    }

    /// Component-wise multiplication.
    #[must_use]
    pub fn scale_by(self, by: Self) -> Self {
        Self {
            x: self.x * by.x,
            y: self.y * by.y,
        }
    }

    /// Whether both components are exactly zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    /// Component-wise minimum.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y))
    }

    /// Component-wise maximum.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y))
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

impl From<(f64, f64)> for Vec2 {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// A pair of animated values, one per axis.
#[derive(Debug, Clone)]
pub struct VectorValue {
    /// Horizontal cell.
    pub x: AnimatedValue,
    /// Vertical cell.
    pub y: AnimatedValue,
}

impl VectorValue {
    /// Create a vector value on `runtime`.
    #[must_use]
    pub fn new(runtime: &FrameRuntime, initial: Vec2) -> Self {
        Self {
            x: runtime.value(initial.x),
            y: runtime.value(initial.y),
        }
    }

    /// Create a zero vector value.
    #[must_use]
    pub fn zero(runtime: &FrameRuntime) -> Self {
        Self::new(runtime, Vec2::ZERO)
    }

    /// Read both axes (latest frame values when animating).
    #[must_use]
    pub fn get(&self) -> Vec2 {
        Vec2::new(self.x.get(), self.y.get())
    }

    /// Set both axes immediately.
    pub fn set(&self, value: impl IntoVec2) {
        let v = value.into_vec2();
        self.x.set(v.x);
        self.y.set(v.y);
    }

    /// Cancel animations on both axes.
    pub fn cancel(&self) {
        self.x.cancel();
        self.y.cancel();
    }

    /// Whether both axes read zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.get().is_zero()
    }

    /// Whether either axis is animating.
    #[must_use]
    pub fn is_animating(&self) -> bool {
        self.x.is_animating() || self.y.is_animating()
    }
}

/// Conversion used by the vector helpers so plain vectors, scalars, and
/// animated vectors can be mixed.
pub trait IntoVec2 {
    /// Resolve to a plain vector.
    fn into_vec2(self) -> Vec2;
}

impl IntoVec2 for Vec2 {
    fn into_vec2(self) -> Vec2 {
        self
    }
}

impl IntoVec2 for f64 {
    fn into_vec2(self) -> Vec2 {
        Vec2::splat(self)
    }
}

impl IntoVec2 for &VectorValue {
    fn into_vec2(self) -> Vec2 {
        self.get()
    }
}

/// Sum of any number of vector-like values.
#[must_use]
pub fn sum<I>(items: I) -> Vec2
where
    I: IntoIterator,
    I::Item: IntoVec2,
{
    items
        .into_iter()
        .fold(Vec2::ZERO, |acc, v| acc + v.into_vec2())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = Vec2::new(1.0, 2.0);
        let b = Vec2::new(3.0, -1.0);
        assert_eq!(a + b, Vec2::new(4.0, 1.0));
        assert_eq!(a - b, Vec2::new(-2.0, 3.0));
        assert_eq!(a * 2.0, Vec2::new(2.0, 4.0));
        assert_eq!(-a, Vec2::new(-1.0, -2.0));
    }

    #[test]
    fn test_clamp() {
        let v = Vec2::new(500.0, -20.0);
        let clamped = v.clamp(Vec2::new(-100.0, -10.0), Vec2::new(100.0, 10.0));
        assert_eq!(clamped, Vec2::new(100.0, -10.0));
    }

    #[test]
    fn test_divide_by_zero_is_zero() {
        let v = Vec2::new(10.0, 10.0).divide(Vec2::new(0.0, 2.0));
        assert_eq!(v, Vec2::new(0.0, 5.0));
    }

    #[test]
    fn test_vector_value_set_and_sum() {
        let rt = FrameRuntime::new();
        let a = VectorValue::new(&rt, Vec2::new(1.0, 1.0));
        let b = VectorValue::zero(&rt);
        b.set(2.0);
        assert_eq!(b.get(), Vec2::new(2.0, 2.0));
        assert_eq!(sum([&a, &b]), Vec2::new(3.0, 3.0));
        assert!(!a.is_zero());
        a.set(Vec2::ZERO);
        assert!(a.is_zero());
    }
}
