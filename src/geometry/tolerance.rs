//! Tolerance based comparisons.
//!
//! Raw `==` on floating point coordinates is never used for geometric
//! decisions in this crate; everything goes through a [`Tolerance`].

use crate::float_types::{Real, TAU, tolerance};
use nalgebra::{Point2, Point3, Vector3};

/// An explicit comparison epsilon threaded through the predicates.
///
/// `Tolerance::default()` reads the process default from
/// [`float_types::tolerance`](crate::float_types::tolerance); tests and callers
/// that need isolation build their own with [`Tolerance::new`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub epsilon: Real,
    /// Used by [`Tolerance::compare_angle`], in radians.
    pub angle_epsilon: Real,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(tolerance())
    }
}

impl Tolerance {
    pub const fn new(epsilon: Real) -> Self {
        Self {
            epsilon,
            angle_epsilon: epsilon,
        }
    }

    pub const fn with_angle(mut self, angle_epsilon: Real) -> Self {
        self.angle_epsilon = angle_epsilon;
        self
    }

    #[inline]
    pub fn compare(&self, a: Real, b: Real) -> bool {
        (a - b).abs() <= self.epsilon
    }

    #[inline]
    pub fn is_zero(&self, value: Real) -> bool {
        value.abs() <= self.epsilon
    }

    /// Component-wise comparison.
    pub fn compare_vectors(&self, a: &Vector3<Real>, b: &Vector3<Real>) -> bool {
        self.compare(a.x, b.x) && self.compare(a.y, b.y) && self.compare(a.z, b.z)
    }

    pub fn compare_points(&self, a: &Point3<Real>, b: &Point3<Real>) -> bool {
        self.compare_vectors(&a.coords, &b.coords)
    }

    pub fn compare_points_2d(&self, a: &Point2<Real>, b: &Point2<Real>) -> bool {
        self.compare(a.x, b.x) && self.compare(a.y, b.y)
    }

    /// Compares two angles in radians modulo a full turn.
    pub fn compare_angle(&self, a: Real, b: Real) -> bool {
        let delta = (a - b).rem_euclid(TAU);
        delta <= self.angle_epsilon || TAU - delta <= self.angle_epsilon
    }

    /// True when the vectors are parallel or anti-parallel.
    pub fn vectors_collinear(&self, a: &Vector3<Real>, b: &Vector3<Real>) -> bool {
        let (na, nb) = (a.norm(), b.norm());
        if na <= self.epsilon || nb <= self.epsilon {
            return true;
        }
        a.cross(b).norm() / (na * nb) <= self.epsilon
    }

    pub fn points_collinear(&self, a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> bool {
        self.vectors_collinear(&(b - a), &(c - a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn angle_wraps_around_full_turn() {
        let tol = Tolerance::new(1e-9);
        assert!(tol.compare_angle(0.0, TAU));
        assert!(tol.compare_angle(-0.5, TAU - 0.5));
        assert!(!tol.compare_angle(0.0, 0.1));
    }

    #[test]
    fn collinear_vectors() {
        let tol = Tolerance::new(1e-9);
        assert!(tol.vectors_collinear(&Vector3::x(), &(-3.0 * Vector3::x())));
        assert!(!tol.vectors_collinear(&Vector3::x(), &Vector3::new(1.0, 1e-3, 0.0)));
    }
}
