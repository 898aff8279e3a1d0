//! Sphere primitive for ray tracing.

use crate::{Hit, Material, Primitive};
use std::f32::consts::PI;
use tessera_math::{Aabb, Interval, Ray, Vec3};

/// A sphere primitive.
#[derive(Debug, Clone)]
pub struct Sphere {
    center: Vec3,
    radius: f32,
    material: Material,
    bbox: Aabb,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f32, material: Material) -> Self {
        let radius = radius.max(0.0);
        Self {
            center,
            radius,
            material,
            bbox: Self::bounds(center, radius),
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    fn bounds(center: Vec3, radius: f32) -> Aabb {
        let rvec = Vec3::splat(radius);
        Aabb::from_points(center - rvec, center + rvec)
    }

    /// Get the UV coordinates for a point on the unit sphere.
    fn get_sphere_uv(p: Vec3) -> (f32, f32) {
        // theta: angle down from +Y, phi: angle around Y from -X
        let theta = (-p.y).clamp(-1.0, 1.0).acos();
        let phi = (-p.z).atan2(p.x) + PI;
        (phi / (2.0 * PI), theta / PI)
    }
}

impl Primitive for Sphere {
    fn hit(&self, ray: &Ray, ray_t: Interval) -> Hit<'_> {
        // Direction is unit length, so the quadratic's `a` term is 1.
        let oc = self.center - ray.origin();
        let h = ray.direction().dot(oc);
        let c = oc.length_squared() - self.radius * self.radius;

        let discriminant = h * h - c;
        if discriminant < 0.0 {
            return Hit::MISS;
        }

        let sqrtd = discriminant.sqrt();

        // Find the nearest root in the acceptable range
        let mut root = h - sqrtd;
        if !ray_t.surrounds(root) {
            root = h + sqrtd;
            if !ray_t.surrounds(root) {
                return Hit::MISS;
            }
        }

        let outward_normal = (ray.at(root) - self.center) / self.radius;
        Hit::from_outward_normal(
            ray,
            root,
            outward_normal,
            Self::get_sphere_uv(outward_normal),
            &self.material,
        )
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }

    fn translate(&mut self, offset: Vec3) {
        self.center += offset;
        self.bbox = Self::bounds(self.center, self.radius);
    }
}
