//! Scene container: the primitive hierarchy plus analytic lights.

use crate::{Bvh, Light, Primitive};

/// Everything a render pass reads. Immutable once built.
pub struct Scene {
    bvh: Bvh,
    lights: Vec<Light>,
}

impl Scene {
    /// Build a scene, taking ownership of the primitives and lights.
    pub fn new(primitives: Vec<Box<dyn Primitive>>, lights: Vec<Light>) -> Self {
        Self {
            bvh: Bvh::new(primitives),
            lights,
        }
    }

    /// A scene with nothing in it; every ray misses.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn primitive_count(&self) -> usize {
        self.bvh.len()
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::empty()
    }
}
