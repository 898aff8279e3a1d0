//! Tessera - progressive CPU path tracing.
//!
//! A Monte Carlo path tracer built around three pieces:
//!
//! - a flat, SAH-built BVH over the scene's primitives
//! - a recursive integrator with diffuse, mirror and glass shading
//! - a progressive accumulation buffer fed by tile-parallel passes
//!
//! Each call to [`Renderer::advance_frame`] adds one sample per pixel; any
//! camera change invalidates the accumulated samples.

mod accumulator;
mod bvh;
mod camera;
mod config;
mod hit;
mod integrator;
mod light;
mod material;
mod output;
mod primitive;
mod renderer;
mod sampling;
mod scene;
mod sphere;
mod tile;
mod triangle;

pub use accumulator::{AccumulationBuffer, INITIAL_SAMPLE_COUNTER};
pub use bvh::{Bvh, BvhStats};
pub use camera::Camera;
pub use config::{ConfigError, RenderConfig, SamplingStrategy};
pub use hit::{Hit, NO_HIT, NO_PRIMITIVE};
pub use integrator::{Integrator, PixelSample, SKY_DEPTH};
pub use light::{Light, LightSample};
pub use material::{
    beer_attenuation, dielectric_split, fresnel, reflect, refract, Color, DielectricSplit, Material,
};
pub use output::{color_to_rgba, depth_aware_filter, linear_to_gamma, resolve, ExportError, Frame};
pub use primitive::Primitive;
pub use renderer::{RenderStats, Renderer};
pub use sampling::{gen_f32, local_basis, random_in_unit_disk, sample_hemisphere, uniform_sample_hemisphere};
pub use scene::Scene;
pub use sphere::Sphere;
pub use tile::{generate_tiles, render_tile, Tile, TileResult, DEFAULT_TILE_SIZE};
pub use triangle::Triangle;

/// Re-export Vec3 and common math types from tessera_math
pub use tessera_math::{Aabb, Interval, Ray, Vec3, AIR_IOR};
