//! Convex planar polygons, the unit the BSP tree splits and clips.

use crate::engine::vertex::Vertex;
use crate::float_types::{Real, parry3d::bounding_volume::Aabb};
use crate::geometry::Plane;
use nalgebra::Point3;
use std::sync::OnceLock;

/// A polygon, defined by a list of vertices and the plane they lie on.
#[derive(Debug, Clone)]
pub struct Polygon<S: Clone> {
    pub vertices: Vec<Vertex>,
    pub plane: Plane,
    /// Lazily-computed bounding box
    pub bounding_box: OnceLock<Aabb>,
    /// Generic metadata, the engine adapter stores the material id here
    pub metadata: Option<S>,
}

impl<S: Clone + PartialEq> PartialEq for Polygon<S> {
    fn eq(&self, other: &Self) -> bool {
        self.vertices == other.vertices
            && self.plane == other.plane
            && self.metadata == other.metadata
    }
}

impl<S: Clone + Send + Sync> Polygon<S> {
    /// Create a polygon from vertices, the plane comes from the first three.
    pub fn new(vertices: Vec<Vertex>, metadata: Option<S>) -> Self {
        assert!(vertices.len() >= 3, "degenerate polygon");

        let plane = Plane::from_vertices(&vertices);
        Polygon {
            vertices,
            plane,
            bounding_box: OnceLock::new(),
            metadata,
        }
    }

    /// A piece of this polygon: same plane and metadata, new vertices.
    pub fn with_vertices(&self, vertices: Vec<Vertex>) -> Self {
        Polygon {
            vertices,
            plane: self.plane,
            bounding_box: OnceLock::new(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        *self.bounding_box.get_or_init(|| {
            let mut mins = Point3::new(Real::MAX, Real::MAX, Real::MAX);
            let mut maxs = Point3::new(-Real::MAX, -Real::MAX, -Real::MAX);
            for v in &self.vertices {
                mins = mins.inf(&v.pos);
                maxs = maxs.sup(&v.pos);
            }
            Aabb::new(mins, maxs)
        })
    }

    /// Reverse winding, flip normals and plane.
    pub fn flip(&mut self) {
        self.vertices.reverse();
        for v in &mut self.vertices {
            v.flip();
        }
        self.plane.flip();
    }

    /// Fan triangulation; polygons produced by plane splits of triangles stay convex.
    pub fn triangulate(&self) -> Vec<[Vertex; 3]> {
        let first = self.vertices[0];
        self.vertices
            .windows(2)
            .skip(1)
            .map(|pair| [first, pair[0], pair[1]])
            .collect()
    }

    /// Directed edges `(start, end)` including the closing one.
    pub fn edges(&self) -> impl Iterator<Item = (&Vertex, &Vertex)> {
        self.vertices.iter().zip(self.vertices.iter().cycle().skip(1))
    }
}
