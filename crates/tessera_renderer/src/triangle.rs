//! Triangle primitive for ray tracing.
//!
//! Uses the Möller-Trumbore algorithm for ray-triangle intersection.

use crate::{Hit, Material, Primitive};
use tessera_math::{Aabb, Interval, Ray, Vec3};

/// A triangle primitive, hittable from either side.
#[derive(Debug, Clone)]
pub struct Triangle {
    v0: Vec3,
    v1: Vec3,
    v2: Vec3,
    /// Pre-computed face normal (unit length)
    normal: Vec3,
    material: Material,
    bbox: Aabb,
}

impl Triangle {
    /// Create a new triangle from three vertices (counter-clockwise winding
    /// gives the outward normal).
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: Material) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        Self {
            v0,
            v1,
            v2,
            normal,
            material,
            bbox: Self::bounds(v0, v1, v2),
        }
    }

    fn bounds(v0: Vec3, v1: Vec3, v2: Vec3) -> Aabb {
        // from_points pads thin dimensions
        Aabb::from_points(v0.min(v1).min(v2), v0.max(v1).max(v2))
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }
}

impl Primitive for Triangle {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Hit<'_> {
        let edge1 = self.v1 - self.v0;
        let edge2 = self.v2 - self.v0;

        let h = ray.direction().cross(edge2);
        let a = edge1.dot(h);

        // Ray is parallel to triangle
        if a.abs() < 1e-8 {
            return Hit::MISS;
        }

        let f = 1.0 / a;
        let s = ray.origin() - self.v0;
        let u = f * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return Hit::MISS;
        }

        let q = s.cross(edge1);
        let v = f * ray.direction().dot(q);
        if v < 0.0 || u + v > 1.0 {
            return Hit::MISS;
        }

        let t = f * edge2.dot(q);
        if !ray_t.surrounds(t) {
            return Hit::MISS;
        }

        Hit::from_outward_normal(ray, t, self.normal, (u, v), &self.material)
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn translate(&mut self, offset: Vec3) {
        self.v0 += offset;
        self.v1 += offset;
        self.v2 += offset;
        self.bbox = Self::bounds(self.v0, self.v1, self.v2);
    }
}
