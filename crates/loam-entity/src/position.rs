//! World-space positions.

use std::ops::{Add, Mul};

/// A point in world space, measured in tiles.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    #[inline]
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Exact, inclusive circle membership.
    ///
    /// Every radius query funnels through this one predicate so the indexed
    /// and the linear paths agree bit for bit. Non-finite positions never
    /// match.
    #[inline]
    #[must_use]
    pub fn within(self, center: Self, radius_sq: f64) -> bool {
        self.is_finite() && self.distance_squared(center) <= radius_sq
    }

    /// Tile containing this position.
    #[must_use]
    pub fn tile(self) -> (i64, i64) {
        (self.x.floor() as i64, self.y.floor() as i64)
    }
}

impl Add<Velocity> for Position {
    type Output = Self;

    fn add(self, rhs: Velocity) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Displacement per unit of simulated time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

impl Velocity {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Velocity of magnitude `speed` pointing from `from` to `to`.
    ///
    /// Zero when the two points coincide.
    #[must_use]
    pub fn towards(from: Position, to: Position, speed: f64) -> Self {
        let distance = from.distance(to);
        if distance <= f64::EPSILON {
            return Self::ZERO;
        }
        Self::new(
            (to.x - from.x) / distance * speed,
            (to.y - from.y) / distance * speed,
        )
    }

    #[must_use]
    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

impl Mul<f64> for Velocity {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn within_is_inclusive() {
        let center = Position::new(0.0, 0.0);

        assert!(Position::new(10.0, 0.0).within(center, 100.0));
        assert!(Position::new(6.0, 8.0).within(center, 100.0));
        assert!(!Position::new(10.0, 0.01).within(center, 100.0));
    }

    #[test]
    fn non_finite_never_within() {
        let center = Position::new(0.0, 0.0);

        assert!(!Position::new(f64::NAN, 0.0).within(center, f64::MAX));
        assert!(!Position::new(f64::INFINITY, 0.0).within(center, f64::MAX));
    }

    #[test]
    fn towards_has_requested_speed() {
        let v = Velocity::towards(Position::new(0.0, 0.0), Position::new(3.0, 4.0), 2.0);

        assert!((v.x - 1.2).abs() < 1e-12);
        assert!((v.y - 1.6).abs() < 1e-12);
        assert!(Velocity::towards(Position::default(), Position::default(), 5.0).is_zero());
    }

    #[test]
    fn negative_tile() {
        assert_eq!(Position::new(-0.5, 3.9).tile(), (-1, 3));
    }
}
