//! Oriented planes `Ax + By + Cz + D = 0`, stored as a unit normal and an offset.

use crate::engine::{polygon::Polygon, vertex::Vertex};
use crate::float_types::{Real, tolerance};
use crate::geometry::Tolerance;
use nalgebra::{Isometry3, Matrix4, Point3, Rotation3, Translation3, Vector3};
use std::fmt::Debug;

// Point / polygon classification, combined as a bitmask
pub const COPLANAR: i8 = 0;
pub const FRONT: i8 = 1;
pub const BACK: i8 = 2;
pub const SPANNING: i8 = 3;

/// A plane with normal `normal` and offset `w`, i.e. all points `p` with `normal · p = w`.
///
/// In coefficient form `A, B, C = normal` and `D = -w`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub normal: Vector3<Real>,
    pub w: Real,
}

impl Plane {
    /// Create a plane from a normal (need not be unit) and an offset along it.
    /// The pair is rescaled so that the stored normal is unit length.
    pub fn from_normal(normal: Vector3<Real>, w: Real) -> Self {
        let mut plane = Plane { normal, w };
        plane.normalize();
        plane
    }

    /// Plane through `point` with the given normal.
    pub fn from_normal_and_point(normal: Vector3<Real>, point: &Point3<Real>) -> Self {
        let normal = normal.normalize();
        Plane {
            normal,
            w: normal.dot(&point.coords),
        }
    }

    /// Plane from coefficients of `Ax + By + Cz + D = 0`.
    pub fn from_coefficients(a: Real, b: Real, c: Real, d: Real) -> Self {
        Self::from_normal(Vector3::new(a, b, c), -d)
    }

    /// Plane through three points, `None` when they are collinear.
    /// The normal follows the right-hand rule: `(b - a) × (c - a)`.
    pub fn try_from_points(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Option<Self> {
        let normal = (b - a).cross(&(c - a));
        let length = normal.norm();
        if length <= Real::EPSILON || !length.is_finite() {
            return None;
        }
        let normal = normal / length;
        Some(Plane {
            normal,
            w: normal.dot(&a.coords),
        })
    }

    /// Plane through three points; collinear input yields the XY plane through `a`.
    pub fn from_points(a: &Point3<Real>, b: &Point3<Real>, c: &Point3<Real>) -> Self {
        Self::try_from_points(a, b, c)
            .unwrap_or_else(|| Self::from_normal_and_point(Vector3::z(), a))
    }

    /// Plane through the first three vertices.
    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        match vertices {
            [a, b, c, ..] => Self::from_points(&a.pos, &b.pos, &c.pos),
            _ => Plane {
                normal: Vector3::z(),
                w: 0.0,
            },
        }
    }

    pub const fn normal(&self) -> Vector3<Real> {
        self.normal
    }

    pub const fn offset(&self) -> Real {
        self.w
    }

    /// `[A, B, C, D]`
    pub fn coefficients(&self) -> [Real; 4] {
        [self.normal.x, self.normal.y, self.normal.z, -self.w]
    }

    /// Rescale so the normal is unit length. A zero normal is left untouched.
    pub fn normalize(&mut self) {
        let length = self.normal.norm();
        if length > Real::EPSILON {
            self.normal /= length;
            self.w /= length;
        }
    }

    pub fn flip(&mut self) {
        self.normal = -self.normal;
        self.w = -self.w;
    }

    pub fn flipped(&self) -> Self {
        Plane {
            normal: -self.normal,
            w: -self.w,
        }
    }

    /// Signed distance, positive on the side the normal points to.
    /// Assumes a unit normal.
    #[inline]
    pub fn distance_to_point(&self, point: &Point3<Real>) -> Real {
        self.normal.dot(&point.coords) - self.w
    }

    pub fn contains_point(&self, point: &Point3<Real>, tol: &Tolerance) -> bool {
        tol.is_zero(self.distance_to_point(point))
    }

    /// Same plane up to tolerance, orientation included.
    pub fn coincides(&self, other: &Plane, tol: &Tolerance) -> bool {
        tol.compare_vectors(&self.normal, &other.normal) && tol.compare(self.w, other.w)
    }

    /// Classify a point as [`FRONT`], [`BACK`] or [`COPLANAR`].
    pub fn orient_point(&self, point: &Point3<Real>) -> i8 {
        let t = self.distance_to_point(point);
        let eps = tolerance();
        if t < -eps {
            BACK
        } else if t > eps {
            FRONT
        } else {
            COPLANAR
        }
    }

    /// Bitmask of the classifications of all vertices.
    pub fn classify_polygon<S: Clone>(&self, polygon: &Polygon<S>) -> i8 {
        polygon
            .vertices
            .iter()
            .fold(COPLANAR, |acc, v| acc | self.orient_point(&v.pos))
    }

    /// Splits a polygon by this plane, returning four buckets:
    /// `(coplanar_front, coplanar_back, front, back)`.
    ///
    /// Coplanar polygons go to the front bucket when they face the same way as the plane.
    #[allow(clippy::type_complexity)]
    pub fn split_polygon<S: Clone + Send + Sync + Debug>(
        &self,
        polygon: &Polygon<S>,
    ) -> (Vec<Polygon<S>>, Vec<Polygon<S>>, Vec<Polygon<S>>, Vec<Polygon<S>>) {
        let mut coplanar_front = Vec::new();
        let mut coplanar_back = Vec::new();
        let mut front = Vec::new();
        let mut back = Vec::new();

        let types: Vec<i8> = polygon
            .vertices
            .iter()
            .map(|v| self.orient_point(&v.pos))
            .collect();
        let polygon_type = types.iter().fold(COPLANAR, |acc, &t| acc | t);

        match polygon_type {
            COPLANAR => {
                if self.normal.dot(&polygon.plane.normal) > 0.0 {
                    coplanar_front.push(polygon.clone());
                } else {
                    coplanar_back.push(polygon.clone());
                }
            },
            FRONT => front.push(polygon.clone()),
            BACK => back.push(polygon.clone()),
            _ => {
                let count = polygon.vertices.len();
                let mut split_front = Vec::with_capacity(count + 1);
                let mut split_back = Vec::with_capacity(count + 1);

                for i in 0..count {
                    let j = (i + 1) % count;
                    let (type_i, type_j) = (types[i], types[j]);
                    let vertex_i = &polygon.vertices[i];
                    let vertex_j = &polygon.vertices[j];

                    if type_i != BACK {
                        split_front.push(*vertex_i);
                    }
                    if type_i != FRONT {
                        split_back.push(*vertex_i);
                    }

                    if (type_i | type_j) == SPANNING {
                        let denom = self.normal.dot(&(vertex_j.pos - vertex_i.pos));
                        if denom.abs() > Real::EPSILON {
                            let t = (self.w - self.normal.dot(&vertex_i.pos.coords)) / denom;
                            let vertex_new = vertex_i.interpolate(vertex_j, t);
                            split_front.push(vertex_new);
                            split_back.push(vertex_new);
                        }
                    }
                }

                // keep the parent plane, recomputing it from slivers is less stable
                if split_front.len() >= 3 {
                    front.push(polygon.with_vertices(split_front));
                }
                if split_back.len() >= 3 {
                    back.push(polygon.with_vertices(split_back));
                }
            },
        }

        (coplanar_front, coplanar_back, front, back)
    }

    /// Returns (T, T_inv), where:
    /// - `T` maps a point on this plane into XY plane (z=0) with the plane's normal going to +Z
    /// - `T_inv` is the inverse transform, mapping back
    pub fn to_xy_transform(&self) -> (Matrix4<Real>, Matrix4<Real>) {
        let n = self.normal;
        let n_len = n.norm();
        if n_len < Real::EPSILON {
            return (Matrix4::identity(), Matrix4::identity());
        }
        let norm_dir = n / n_len;

        let rot = rotation_to_z(&norm_dir);
        let iso_rot = Isometry3::from_parts(Translation3::identity(), rot.into());

        // a point on the plane must land on z = 0
        let p0 = Point3::from(norm_dir * (self.w / n_len));
        let p0_rot = iso_rot.transform_point(&p0);
        let iso_trans = Translation3::new(0.0, 0.0, -p0_rot.z);

        let transform_to_xy = iso_trans.to_homogeneous() * iso_rot.to_homogeneous();
        let transform_from_xy = transform_to_xy
            .try_inverse()
            .unwrap_or_else(Matrix4::identity);

        (transform_to_xy, transform_from_xy)
    }
}

/// Rotation taking the unit vector `normal` onto +Z.
///
/// `Rotation3::rotation_between` has no unique answer for `-Z`, so that case
/// is a half turn around X.
pub fn rotation_to_z(normal: &Vector3<Real>) -> Rotation3<Real> {
    Rotation3::rotation_between(normal, &Vector3::z()).unwrap_or_else(|| {
        if normal.z < 0.0 {
            Rotation3::from_axis_angle(&Vector3::x_axis(), crate::float_types::PI)
        } else {
            Rotation3::identity()
        }
    })
}
