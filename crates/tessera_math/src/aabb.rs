use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box for spatial acceleration structures (BVH).
///
/// An AABB is defined by three intervals (one per axis) that bound a 3D volume.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// Create a new AABB from three intervals.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        let mut aabb = Self { x, y, z };
        aabb.pad_to_minimums();
        aabb
    }

    /// Create an AABB from two corner points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let x = Interval::new(a.x.min(b.x), a.x.max(b.x));
        let y = Interval::new(a.y.min(b.y), a.y.max(b.y));
        let z = Interval::new(a.z.min(b.z), a.z.max(b.z));
        Self::new(x, y, z)
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&box0.x, &box1.x),
            y: Interval::surrounding(&box0.y, &box1.y),
            z: Interval::surrounding(&box0.z, &box1.z),
        }
    }

    /// Grow this box in place so it also covers `other`.
    #[inline]
    pub fn grow(&mut self, other: &Aabb) {
        *self = Aabb::surrounding(self, other);
    }

    /// Grow this box in place so it also covers the point `p`.
    #[inline]
    pub fn grow_point(&mut self, p: Vec3) {
        self.x = Interval::new(self.x.min.min(p.x), self.x.max.max(p.x));
        self.y = Interval::new(self.y.min.min(p.y), self.y.max.max(p.y));
        self.z = Interval::new(self.z.min.min(p.z), self.z.max.max(p.z));
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, n: usize) -> Interval {
        match n {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    /// True when no point has been added to the box yet.
    pub fn is_empty(&self) -> bool {
        self.x.min > self.x.max || self.y.min > self.y.max || self.z.min > self.z.max
    }

    /// Slab test against the ray within `ray_t`.
    ///
    /// Returns the parametric distance at which the ray enters the box
    /// (clamped to `ray_t.min`), or `None` when the ray misses it.
    pub fn hit(&self, r: &Ray, ray_t: Interval) -> Option<f32> {
        let mut t_enter = ray_t.min;
        let mut t_exit = ray_t.max;

        for axis in 0..3 {
            let slab = self.axis_interval(axis);
            let inv = r.inv_direction[axis];
            let orig = r.origin[axis];

            let mut t0 = (slab.min - orig) * inv;
            let mut t1 = (slab.max - orig) * inv;
            if inv < 0.0 {
                std::mem::swap(&mut t0, &mut t1);
            }

            t_enter = t0.max(t_enter);
            t_exit = t1.min(t_exit);
            if t_exit <= t_enter {
                return None;
            }
        }

        Some(t_enter)
    }

    /// Pad intervals to avoid zero-width AABBs (degenerate cases).
    fn pad_to_minimums(&mut self) {
        let delta = 0.0001;
        if self.x.size() < delta {
            self.x = self.x.expand(delta);
        }
        if self.y.size() < delta {
            self.y = self.y.expand(delta);
        }
        if self.z.size() < delta {
            self.z = self.z.expand(delta);
        }
    }

    /// Translate (move) the AABB by an offset vector.
    pub fn translate(&self, offset: Vec3) -> Aabb {
        Aabb::new(
            self.x.add_scalar(offset.x),
            self.y.add_scalar(offset.y),
            self.z.add_scalar(offset.z),
        )
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    pub fn longest_axis(&self) -> usize {
        let x_size = self.x.size();
        let y_size = self.y.size();
        let z_size = self.z.size();

        if x_size > y_size && x_size > z_size {
            0
        } else if y_size > z_size {
            1
        } else {
            2
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        Vec3::new(
            (self.x.min + self.x.max) * 0.5,
            (self.y.min + self.y.max) * 0.5,
            (self.z.min + self.z.max) * 0.5,
        )
    }

    /// Size of the box along each axis.
    pub fn extent(&self) -> Vec3 {
        Vec3::new(self.x.size(), self.y.size(), self.z.size())
    }

    /// Surface area used by the SAH cost model. Empty boxes have zero area.
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.extent();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Returns true if `other` lies entirely inside this box.
    pub fn encloses(&self, other: &Aabb) -> bool {
        self.x.encloses(&other.x) && self.y.encloses(&other.y) && self.z.encloses(&other.z)
    }

    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_from_points_orders_corners() {
        let aabb = Aabb::from_points(Vec3::new(10.0, 0.0, 10.0), Vec3::new(0.0, 10.0, 0.0));
        assert_eq!(aabb.x, Interval::new(0.0, 10.0));
        assert_eq!(aabb.y, Interval::new(0.0, 10.0));
        assert_eq!(aabb.z, Interval::new(0.0, 10.0));
    }

    #[test]
    fn test_aabb_hit_reports_entry_distance() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let t = aabb.hit(&ray, Interval::new(0.0, 100.0)).unwrap();
        assert!((t - 4.0).abs() < 1e-5);

        // Pointing away
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z);
        assert!(aabb.hit(&ray, Interval::new(0.0, 100.0)).is_none());

        // Parallel to the box, offset
        let ray = Ray::new(Vec3::new(10.0, 0.0, 0.0), Vec3::Z);
        assert!(aabb.hit(&ray, Interval::new(0.0, 100.0)).is_none());
    }

    #[test]
    fn test_aabb_hit_respects_interval() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(aabb.hit(&ray, Interval::new(0.0, 3.0)).is_none());
    }

    #[test]
    fn test_aabb_hit_from_inside_enters_at_min() {
        let aabb = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
        assert_eq!(aabb.hit(&ray, Interval::new(0.0, 100.0)), Some(0.0));
    }

    #[test]
    fn test_aabb_grow_and_encloses() {
        let mut bbox = Aabb::EMPTY;
        assert!(bbox.is_empty());
        assert_eq!(bbox.surface_area(), 0.0);

        let a = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_points(Vec3::splat(2.0), Vec3::splat(3.0));
        bbox.grow(&a);
        bbox.grow(&b);
        assert!(bbox.encloses(&a));
        assert!(bbox.encloses(&b));
        assert!(!a.encloses(&bbox));

        bbox.grow_point(Vec3::new(-1.0, 0.0, 0.0));
        assert_eq!(bbox.x.min, -1.0);
    }

    #[test]
    fn test_aabb_surface_area() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0));
        assert!((aabb.surface_area() - 22.0).abs() < 1e-4);
    }

    #[test]
    fn test_aabb_longest_axis() {
        assert_eq!(Aabb::from_points(Vec3::ZERO, Vec3::new(10.0, 1.0, 1.0)).longest_axis(), 0);
        assert_eq!(Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 10.0, 1.0)).longest_axis(), 1);
        assert_eq!(Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 1.0, 10.0)).longest_axis(), 2);
    }

    #[test]
    fn test_flat_box_is_padded() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0));
        assert!(aabb.z.size() > 0.0);
    }

    #[test]
    fn test_aabb_translate() {
        let aabb = Aabb::from_points(Vec3::ZERO, Vec3::ONE).translate(Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(aabb.x, Interval::new(5.0, 6.0));
        assert_eq!(aabb.centroid(), Vec3::new(5.5, 0.5, 0.5));
    }
}
