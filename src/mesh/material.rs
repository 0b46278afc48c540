//! Materials attached to groups of mesh primitives.

use std::sync::atomic::{AtomicU32, Ordering};

pub type MaterialId = u32;

/// Id 0 is reserved for [`Material::default`].
static NEXT_MATERIAL_ID: AtomicU32 = AtomicU32::new(1);

/// Minimal render material: identity plus a diffuse colour.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    id: MaterialId,
    name: String,
    diffuse: [f32; 4],
}

impl Material {
    /// A material with a fresh process-unique id.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(NEXT_MATERIAL_ID.fetch_add(1, Ordering::Relaxed), name)
    }

    pub fn with_id(id: MaterialId, name: impl Into<String>) -> Self {
        Material {
            id,
            name: name.into(),
            diffuse: [0.8, 0.8, 0.8, 1.0],
        }
    }

    pub const fn with_diffuse(mut self, rgba: [f32; 4]) -> Self {
        self.diffuse = rgba;
        self
    }

    pub const fn id(&self) -> MaterialId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn diffuse(&self) -> [f32; 4] {
        self.diffuse
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::with_id(0, "default")
    }
}
