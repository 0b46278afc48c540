use crate::float_types::parry3d::bounding_volume::Aabb;
use crate::float_types::{Real, tolerance};
use crate::geometry::Plane;
use nalgebra::{Matrix3, Matrix4, Rotation3, Translation3, Vector3};

/// Boolean operations + transformations over closed solids.
pub trait CSGOps: Sized + Clone {
    fn new() -> Self;
    fn union(&self, other: &Self) -> Self;
    fn difference(&self, other: &Self) -> Self;
    fn intersection(&self, other: &Self) -> Self;
    fn xor(&self, other: &Self) -> Self;
    fn transform(&self, matrix: &Matrix4<Real>) -> Self;
    fn bounding_box(&self) -> Aabb;
    fn invalidate_bounding_box(&mut self);
    fn inverse(&self) -> Self;

    /// Returns a new Self translated by vector.
    fn translate_vector(&self, vector: Vector3<Real>) -> Self {
        self.transform(&Translation3::from(vector).to_homogeneous())
    }

    /// Returns a new Self translated by x, y, and z.
    fn translate(&self, x: Real, y: Real, z: Real) -> Self {
        self.translate_vector(Vector3::new(x, y, z))
    }

    /// Translated so that the bounding-box center is at the origin.
    fn center(&self) -> Self {
        let aabb = self.bounding_box();
        let center = (aabb.mins.coords + aabb.maxs.coords) * 0.5;
        self.translate_vector(-center)
    }

    /// Rotates by x, y then z degrees about the world axes.
    fn rotate(&self, x_deg: Real, y_deg: Real, z_deg: Real) -> Self {
        let rx = Rotation3::from_axis_angle(&Vector3::x_axis(), x_deg.to_radians());
        let ry = Rotation3::from_axis_angle(&Vector3::y_axis(), y_deg.to_radians());
        let rz = Rotation3::from_axis_angle(&Vector3::z_axis(), z_deg.to_radians());
        self.transform(&(rz * ry * rx).to_homogeneous())
    }

    /// Scales by sx, sy, sz
    fn scale(&self, sx: Real, sy: Real, sz: Real) -> Self {
        self.transform(&Matrix4::new_nonuniform_scaling(&Vector3::new(sx, sy, sz)))
    }

    /// Reflect about `plane`. Implementors of [`transform`](CSGOps::transform)
    /// restore the winding for matrices with a negative determinant.
    fn mirror(&self, plane: Plane) -> Self {
        let len = plane.normal().norm();
        if len < tolerance() {
            return self.clone();
        }

        let n = plane.normal() / len;
        let offset = n * (plane.offset() / len);

        // R = I - 2 n n^T around a plane through the origin
        let mut reflect = Matrix4::identity();
        let reflect_3 = Matrix3::identity() - 2.0 * n * n.transpose();
        reflect.fixed_view_mut::<3, 3>(0, 0).copy_from(&reflect_3);

        let to_origin = Translation3::from(-offset).to_homogeneous();
        let back = Translation3::from(offset).to_homogeneous();

        self.transform(&(back * reflect * to_origin))
    }
}
