//! Geometry and triangulation errors

use crate::float_types::Real;
use nalgebra::Point3;

/// Structural problems with caller supplied geometry.
///
/// These are precondition violations: the input describes something that
/// cannot be built, so the operation refuses to proceed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeometryError {
    /// (TooFewPoints) An outline needs at least three points
    #[error("(TooFewPoints) an outline needs at least 3 points, got {count}")]
    TooFewPoints { count: usize },
    /// (NotCoplanar) A point does not lie on the plane of the first three
    #[error("(NotCoplanar) point {index} at {point} is not on the outline plane")]
    NotCoplanar { index: usize, point: Point3<Real> },
    /// (ClosedOutline) The first and last points coincide
    #[error("(ClosedOutline) first and last points coincide at {0}")]
    ClosedOutline(Point3<Real>),
    /// (DegeneratePlane) The first three points do not define a plane
    #[error("(DegeneratePlane) the first three points are collinear")]
    DegeneratePlane,
    /// (DegenerateDirection) The extrusion vector has no length
    #[error("(DegenerateDirection) extrusion vector has zero length")]
    DegenerateDirection,
    /// (ParallelDirection) The extrusion vector lies in the outline plane
    #[error("(ParallelDirection) extrusion vector is parallel to the outline plane")]
    ParallelDirection,
    /// (InvalidLength) The extrusion length must be finite and positive
    #[error("(InvalidLength) extrusion length must be positive and finite, got {0}")]
    InvalidLength(Real),
    /// (IndexOutOfRange) A point or edge index refers past the outline
    #[error("(IndexOutOfRange) index {index} is out of range (len = {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Reasons a triangulation strategy gave up.
///
/// Public entry points never return these: they are the explicit decision
/// points that route a polygon to the ear clipping fallback.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TriangulationError {
    #[error("polygon has {0} distinct points, need at least 3")]
    TooFewPoints(usize),
    #[error("point {index} is {distance} away from the supporting plane")]
    NotPlanar { index: usize, distance: Real },
    #[error("projected points {first} and {second} coincide")]
    DuplicateProjectedPoints { first: usize, second: usize },
    #[error("constrained triangulation failed: {0}")]
    Engine(String),
    #[error("expected {expected} triangle indices, got {actual}")]
    IndexMismatch { expected: usize, actual: usize },
}
