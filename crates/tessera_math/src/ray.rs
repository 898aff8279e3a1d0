use crate::Vec3;

/// Refractive index of the medium a ray starts in (air / vacuum).
pub const AIR_IOR: f32 = 1.0;

/// A ray in 3D space.
///
/// The direction is normalized on construction so shading math can rely on
/// unit length. Each ray also carries the refractive index of the medium it
/// currently travels through, which lets nested dielectrics pick the right
/// index ratio, and an upper bound on the distances it will accept.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
    /// Component-wise reciprocal of `direction`, cached for slab tests.
    pub inv_direction: Vec3,
    /// Refractive index of the medium the ray is travelling through.
    pub medium_ior: f32,
    /// Largest hit distance this ray accepts.
    pub t_max: f32,
}

impl Ray {
    /// Create a new ray in air with an unbounded extent.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        let direction = direction.normalize_or_zero();
        Self {
            origin,
            direction,
            inv_direction: direction.recip(),
            medium_ior: AIR_IOR,
            t_max: f32::MAX,
        }
    }

    /// Create a ray whose origin is pushed `bias` units along `direction`.
    ///
    /// Secondary rays start this way so they do not immediately re-hit the
    /// surface they leave because of floating point error.
    pub fn biased(origin: Vec3, direction: Vec3, bias: f32) -> Self {
        let mut ray = Self::new(origin, direction);
        ray.origin += ray.direction * bias;
        ray
    }

    /// Set the refractive index of the medium this ray travels through.
    #[inline]
    pub fn with_medium(mut self, ior: f32) -> Self {
        self.medium_ior = ior;
        self
    }

    /// Limit the distances this ray accepts.
    #[inline]
    pub fn with_max_distance(mut self, t_max: f32) -> Self {
        self.t_max = t_max;
        self
    }

    /// Get the origin point of the ray.
    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Get the unit direction of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_normalizes_direction() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 4.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
        assert!((ray.direction - Vec3::new(0.0, 0.6, 0.8)).length() < 1e-6);
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X);

        assert_eq!(ray.at(0.0), Vec3::ZERO);
        assert_eq!(ray.at(1.0), Vec3::X);
        assert_eq!(ray.at(2.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(ray.at(-1.0), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn test_ray_defaults() {
        let ray = Ray::new(Vec3::ONE, Vec3::Y);
        assert_eq!(ray.medium_ior, AIR_IOR);
        assert_eq!(ray.t_max, f32::MAX);
        assert_eq!(ray.inv_direction.y, 1.0);
        assert!(ray.inv_direction.x.is_infinite());
    }

    #[test]
    fn test_ray_biased_moves_origin_along_direction() {
        let ray = Ray::biased(Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), 0.01);
        assert!((ray.origin - Vec3::new(0.0, 0.0, 0.01)).length() < 1e-7);
        assert_eq!(ray.direction, Vec3::Z);
    }

    #[test]
    fn test_ray_builders() {
        let ray = Ray::new(Vec3::ZERO, Vec3::X)
            .with_medium(1.5)
            .with_max_distance(10.0);
        assert_eq!(ray.medium_ior, 1.5);
        assert_eq!(ray.t_max, 10.0);
    }
}
