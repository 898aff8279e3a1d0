//! Progressive renderer.
//!
//! Owns the scene, the camera and the accumulation buffer. Every call to
//! [`Renderer::advance_frame`] renders one sample per pixel over all tiles
//! in parallel and adds it to the running sums; camera changes throw the
//! sums away so the image restarts from the new view.

use crate::{
    generate_tiles, render_tile, resolve, AccumulationBuffer, BvhStats, Camera, ConfigError, Frame, Integrator,
    RenderConfig, Scene, Tile, TileResult,
};
use rayon::prelude::*;
use std::time::Instant;
use tessera_math::Vec3;

/// Summary of the renderer's state, for logging and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderStats {
    pub width: u32,
    pub height: u32,
    pub primitives: usize,
    pub lights: usize,
    pub bvh: BvhStats,
    pub tiles: usize,
    pub samples_taken: u32,
    pub max_samples: u32,
}

pub struct Renderer {
    scene: Scene,
    camera: Camera,
    config: RenderConfig,
    accum: AccumulationBuffer,
    tiles: Vec<Tile>,
    debug: bool,
}

impl Renderer {
    /// Create a renderer. The camera is resized to the configured
    /// resolution.
    pub fn new(scene: Scene, camera: Camera, config: RenderConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut camera = camera;
        camera.set_resolution(config.width, config.height);
        let tiles = generate_tiles(config.width, config.height, config.tile_size);

        log::info!(
            "Renderer: {}x{}, {} tiles of {}px, max depth {}, {:?} sampling",
            config.width,
            config.height,
            tiles.len(),
            config.tile_size,
            config.max_depth,
            config.sampling
        );

        Ok(Self {
            scene,
            camera,
            accum: AccumulationBuffer::new(config.width, config.height),
            tiles,
            config,
            debug: false,
        })
    }

    /// Render one more sample for every pixel.
    ///
    /// Returns false, leaving the buffer untouched, once the configured
    /// number of samples has been reached.
    pub fn advance_frame(&mut self) -> bool {
        if self.is_converged() {
            return false;
        }

        let start = Instant::now();
        let pass = self.accum.samples_taken();
        let seed = self.config.seed;
        let camera = &self.camera;
        let integrator = Integrator::new(&self.scene, &self.config).with_debug(self.debug);

        let results: Vec<TileResult> = self
            .tiles
            .par_iter()
            .map(|tile| render_tile(tile, camera, &integrator, seed, pass))
            .collect();

        // Tiles are disjoint, so each pixel is written by exactly one result
        for result in &results {
            self.accum.accumulate_tile(result);
        }
        self.accum.finish_pass();

        log::trace!("Pass {} rendered in {:.2?}", pass + 1, start.elapsed());
        if self.is_converged() {
            log::info!("Converged after {} samples per pixel", self.accum.samples_taken());
        }

        true
    }

    /// Discard every accumulated sample.
    pub fn invalidate(&mut self) {
        log::debug!("Invalidating after {} samples", self.accum.samples_taken());
        self.accum.reset();
    }

    /// The current image.
    pub fn read_output(&self) -> Frame {
        resolve(&self.accum, self.config.depth_filter, self.config.depth_filter_bias)
    }

    /// Move the camera in its own frame: x right, y up, z forward.
    pub fn move_camera(&mut self, delta: Vec3) {
        self.invalidate();
        self.camera.move_by(delta);
        log::debug!("Camera moved to {:?}", self.camera.position());
    }

    /// Rotate the camera by yaw (x), pitch (y) and roll (z), in radians.
    pub fn rotate_camera(&mut self, delta: Vec3) {
        self.invalidate();
        self.camera.rotate(delta);
        log::debug!("Camera facing {:?}", self.camera.forward());
    }

    pub fn zoom_camera(&mut self, delta: f32) {
        self.invalidate();
        self.camera.zoom(delta);
        log::debug!("Camera field of view {:.1} degrees", self.camera.vfov());
    }

    pub fn change_aperture(&mut self, delta: f32) {
        self.invalidate();
        self.camera.change_aperture(delta);
        log::debug!("Camera aperture {:.3}", self.camera.aperture());
    }

    /// Focus on whatever is at the center of the image. The focus distance
    /// is left alone when nothing is there.
    pub fn focus_camera(&mut self) {
        self.invalidate();
        let hit = self.scene.bvh().intersect(&self.camera.focus_ray());
        if hit.is_hit() {
            self.camera.set_focus_distance(hit.t);
            log::debug!("Camera focused at {:.3}", hit.t);
        }
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.invalidate();
        self.debug = debug;
    }

    pub fn toggle_debug(&mut self) {
        self.set_debug(!self.debug);
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn accumulation(&self) -> &AccumulationBuffer {
        &self.accum
    }

    pub fn samples_taken(&self) -> u32 {
        self.accum.samples_taken()
    }

    pub fn is_converged(&self) -> bool {
        self.accum.samples_taken() >= self.config.max_samples
    }

    /// Describe the scene and progress, and log it.
    pub fn report(&self) -> RenderStats {
        let stats = RenderStats {
            width: self.config.width,
            height: self.config.height,
            primitives: self.scene.primitive_count(),
            lights: self.scene.light_count(),
            bvh: self.scene.bvh().stats(),
            tiles: self.tiles.len(),
            samples_taken: self.accum.samples_taken(),
            max_samples: self.config.max_samples,
        };

        log::info!(
            "Scene: {} primitives, {} lights; BVH {} nodes, {} leaves, depth {}; {}/{} samples",
            stats.primitives,
            stats.lights,
            stats.bvh.nodes,
            stats.bvh.leaves,
            stats.bvh.depth,
            stats.samples_taken,
            stats.max_samples
        );

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Material, Primitive, Sphere};

    fn small_config() -> RenderConfig {
        RenderConfig {
            width: 16,
            height: 12,
            tile_size: 8,
            max_samples: 3,
            ..RenderConfig::default()
        }
    }

    fn one_sphere() -> Scene {
        let sphere: Box<dyn Primitive> = Box::new(Sphere::new(-4.0 * Vec3::Z, 1.0, Material::emitter(Color::ONE)));
        Scene::new(vec![sphere], vec![])
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = RenderConfig {
            width: 0,
            ..RenderConfig::default()
        };
        assert!(Renderer::new(Scene::empty(), Camera::new(), config).is_err());
    }

    #[test]
    fn test_camera_takes_configured_resolution() {
        let renderer = Renderer::new(Scene::empty(), Camera::new(), small_config()).unwrap();
        assert_eq!(renderer.camera().resolution(), (16, 12));
    }

    #[test]
    fn test_stops_at_sample_budget() {
        let mut renderer = Renderer::new(one_sphere(), Camera::new(), small_config()).unwrap();
        assert!(renderer.advance_frame());
        assert!(renderer.advance_frame());
        assert!(renderer.advance_frame());
        assert!(renderer.is_converged());
        assert!(!renderer.advance_frame());
        assert_eq!(renderer.samples_taken(), 3);
    }

    #[test]
    fn test_focus_camera() {
        let mut renderer = Renderer::new(one_sphere(), Camera::new(), small_config()).unwrap();
        renderer.advance_frame();
        renderer.focus_camera();
        assert!((renderer.camera().focus_distance() - 3.0).abs() < 1e-4);
        assert_eq!(renderer.samples_taken(), 0);

        // Looking away: focus distance unchanged
        renderer.rotate_camera(Vec3::new(std::f32::consts::PI, 0.0, 0.0));
        renderer.focus_camera();
        assert!((renderer.camera().focus_distance() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_toggle_debug_invalidates() {
        let mut renderer = Renderer::new(one_sphere(), Camera::new(), small_config()).unwrap();
        renderer.advance_frame();
        renderer.toggle_debug();
        assert!(renderer.is_debug());
        assert_eq!(renderer.samples_taken(), 0);
        assert_eq!(renderer.accumulation().sample_counter(), crate::INITIAL_SAMPLE_COUNTER);
    }

    #[test]
    fn test_report() {
        let mut renderer = Renderer::new(one_sphere(), Camera::new(), small_config()).unwrap();
        renderer.advance_frame();
        let stats = renderer.report();
        assert_eq!(stats.primitives, 1);
        assert_eq!(stats.lights, 0);
        assert_eq!(stats.tiles, 4);
        assert_eq!(stats.samples_taken, 1);
        assert_eq!(stats.bvh.leaves, 1);
    }
}
