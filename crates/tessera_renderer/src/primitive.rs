//! Primitive trait for ray-object intersection.

use crate::Hit;
use tessera_math::{Aabb, Interval, Ray, Vec3};

/// Geometry the BVH can be built over.
pub trait Primitive: Send + Sync {
    /// Test if a ray hits this object strictly within `ray_t`.
    ///
    /// Returns [`Hit::MISS`] when it does not.
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Hit<'_>;

    /// Get the axis-aligned bounding box of this object.
    fn bounding_box(&self) -> Aabb;

    /// Move the primitive by `offset`. Only valid before the BVH is built.
    fn translate(&mut self, offset: Vec3);
}
