//! Intersection result shared by primitives and the BVH.

use crate::Material;
use tessera_math::{Ray, Vec3};

/// Distance stored in a [`Hit`] that did not hit anything.
pub const NO_HIT: f32 = f32::MAX;

/// Primitive index stored in a [`Hit`] that no BVH has claimed.
pub const NO_PRIMITIVE: usize = usize::MAX;

/// Material referenced by the miss sentinel. Never shaded.
const MISS_MATERIAL: Material = Material::Lambertian { albedo: Vec3::ZERO };

/// Record of a ray-primitive intersection.
///
/// Absence of a hit is the sentinel value [`Hit::MISS`] (distance
/// [`NO_HIT`]) rather than an `Option`, so the hot path stays branch-light
/// and a hit can always be copied around by value.
#[derive(Debug, Clone, Copy)]
pub struct Hit<'a> {
    /// Parameter t where the intersection occurs
    pub t: f32,
    /// Point of intersection
    pub p: Vec3,
    /// Geometric normal, always pointing against the incoming ray
    pub normal: Vec3,
    /// +1.0 for a front-face hit, -1.0 when the ray hit the back face
    /// (i.e. it travels inside the object)
    pub side: f32,
    /// Surface parameters
    pub u: f32,
    pub v: f32,
    /// Material at the intersection point
    pub material: &'a Material,
    /// Index of the hit primitive in the scene
    pub primitive: usize,
}

impl Hit<'static> {
    /// The "no hit" sentinel.
    pub const MISS: Hit<'static> = Hit {
        t: NO_HIT,
        p: Vec3::ZERO,
        normal: Vec3::ZERO,
        side: 1.0,
        u: 0.0,
        v: 0.0,
        material: &MISS_MATERIAL,
        primitive: NO_PRIMITIVE,
    };
}

impl<'a> Hit<'a> {
    /// Build a hit from the surface's outward normal.
    ///
    /// The stored normal is flipped to face the ray, and `side` records
    /// which face was hit.
    pub fn from_outward_normal(
        ray: &Ray,
        t: f32,
        outward_normal: Vec3,
        (u, v): (f32, f32),
        material: &'a Material,
    ) -> Self {
        let front_face = ray.direction().dot(outward_normal) < 0.0;
        Self {
            t,
            p: ray.at(t),
            normal: if front_face { outward_normal } else { -outward_normal },
            side: if front_face { 1.0 } else { -1.0 },
            u,
            v,
            material,
            primitive: NO_PRIMITIVE,
        }
    }

    /// True unless this is the miss sentinel.
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.t < NO_HIT
    }

    /// True when the ray hit the outside of the surface.
    #[inline]
    pub fn front_face(&self) -> bool {
        self.side > 0.0
    }

    /// Tag the hit with the index of the primitive that produced it.
    #[inline]
    pub fn with_primitive(mut self, index: usize) -> Self {
        self.primitive = index;
        self
    }
}
