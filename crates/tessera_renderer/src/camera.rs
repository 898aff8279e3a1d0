//! Camera for ray generation.
//!
//! A thin-lens pinhole camera with a free orientation. Primary rays are
//! jittered inside their pixel and, when the aperture is open, start from a
//! random point on the lens so only the focus plane stays sharp.

use crate::sampling::random_in_unit_disk;
use crate::{gen_f32, Ray};
use rand::RngCore;
use tessera_math::{Mat3, Quat, Vec3};

const MIN_VFOV: f32 = 1.0;
const MAX_VFOV: f32 = 170.0;
const MIN_FOCUS_DISTANCE: f32 = 1e-3;

/// Camera for generating rays into the scene.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    image_width: u32,
    image_height: u32,

    // Camera positioning
    position: Vec3,
    orientation: Quat,

    // Lens settings
    vfov: f32,       // Vertical field of view in degrees
    aperture: f32,   // Lens radius, 0 for a pinhole
    focus_dist: f32, // Distance from camera to plane of perfect focus

    // Cached computed values (set by initialize())
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
}

impl Camera {
    /// Create a camera at the origin looking down -Z.
    pub fn new() -> Self {
        let mut camera = Self {
            image_width: 640,
            image_height: 480,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            vfov: 60.0,
            aperture: 0.0,
            focus_dist: 1.0,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
            u: Vec3::X,
            v: Vec3::Y,
            w: Vec3::Z,
        };
        camera.initialize();
        camera
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.set_resolution(width, height);
        self
    }

    /// Place the camera at `look_from`, facing `look_at`.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        let w = (look_from - look_at).normalize_or_zero();
        let u = vup.cross(w).normalize_or_zero();
        if w == Vec3::ZERO || u == Vec3::ZERO {
            log::warn!("Degenerate camera orientation, keeping the previous one");
        } else {
            let v = w.cross(u);
            self.orientation = Quat::from_mat3(&Mat3::from_cols(u, v, w)).normalize();
        }
        self.position = look_from;
        self.initialize();
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, vfov: f32, aperture: f32, focus_dist: f32) -> Self {
        self.vfov = vfov.clamp(MIN_VFOV, MAX_VFOV);
        self.aperture = aperture.max(0.0);
        self.focus_dist = focus_dist.max(MIN_FOCUS_DISTANCE);
        self.initialize();
        self
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.image_width = width.max(1);
        self.image_height = height.max(1);
        self.initialize();
    }

    /// Move in camera space: x right, y up, z forward.
    pub fn move_by(&mut self, delta: Vec3) {
        self.position += self.u * delta.x + self.v * delta.y - self.w * delta.z;
        self.initialize();
    }

    /// Rotate in camera space, in radians: x turns left, y tilts down and
    /// z rolls clockwise.
    pub fn rotate(&mut self, delta: Vec3) {
        let yaw = Quat::from_axis_angle(Vec3::Y, delta.x);
        let pitch = Quat::from_axis_angle(Vec3::X, -delta.y);
        let roll = Quat::from_axis_angle(Vec3::Z, -delta.z);
        self.orientation = (self.orientation * yaw * pitch * roll).normalize();
        self.initialize();
    }

    /// Narrow the field of view by `delta` (a fraction of the current one);
    /// negative values widen it.
    pub fn zoom(&mut self, delta: f32) {
        self.vfov = (self.vfov * (1.0 - delta)).clamp(MIN_VFOV, MAX_VFOV);
        self.initialize();
    }

    /// Grow or shrink the lens radius. Never goes below a pinhole.
    pub fn change_aperture(&mut self, delta: f32) {
        self.aperture = (self.aperture + delta).max(0.0);
    }

    pub fn set_focus_distance(&mut self, distance: f32) {
        self.focus_dist = distance.max(MIN_FOCUS_DISTANCE);
        self.initialize();
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        -self.w
    }

    pub fn up(&self) -> Vec3 {
        self.v
    }

    pub fn vfov(&self) -> f32 {
        self.vfov
    }

    pub fn aperture(&self) -> f32 {
        self.aperture
    }

    pub fn focus_distance(&self) -> f32 {
        self.focus_dist
    }

    pub fn resolution(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    /// Recompute the cached viewport after any change.
    fn initialize(&mut self) {
        // Calculate viewport dimensions on the focus plane
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h * self.focus_dist;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Calculate camera basis vectors
        self.u = self.orientation * Vec3::X;
        self.v = self.orientation * Vec3::Y;
        self.w = self.orientation * Vec3::Z;

        let viewport_u = viewport_width * self.u;
        let viewport_v = -viewport_height * self.v;

        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        // Calculate upper left pixel location
        let viewport_upper_left =
            self.position - self.focus_dist * self.w - viewport_u / 2.0 - viewport_v / 2.0;

        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);
    }

    /// Generate a jittered ray through pixel (i, j).
    pub fn primary_ray(&self, i: u32, j: u32, rng: &mut dyn RngCore) -> Ray {
        let offset_x = gen_f32(rng) - 0.5;
        let offset_y = gen_f32(rng) - 0.5;

        let pixel_sample = self.pixel00_loc
            + (i as f32 + offset_x) * self.pixel_delta_u
            + (j as f32 + offset_y) * self.pixel_delta_v;

        let ray_origin = if self.aperture <= 0.0 {
            self.position
        } else {
            self.lens_sample(rng)
        };

        Ray::new(ray_origin, pixel_sample - ray_origin)
    }

    /// The unjittered pinhole ray through the center of the image.
    pub fn focus_ray(&self) -> Ray {
        Ray::new(self.position, -self.w)
    }

    /// Sample a point on the lens.
    fn lens_sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let p = random_in_unit_disk(rng) * self.aperture;
        self.position + p.x * self.u + p.y * self.v
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}
