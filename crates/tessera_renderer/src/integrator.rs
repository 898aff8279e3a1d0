//! Recursive path integrator.
//!
//! `shoot_ray` follows one path through the scene and returns the radiance
//! arriving back along it:
//! - emitters return their emission and end the path
//! - diffuse surfaces sample every analytic light explicitly and, with
//!   global illumination enabled, continue along one uniform hemisphere
//!   direction
//! - mirrors blend local lighting with the reflected path
//! - dielectrics split deterministically into a Fresnel-weighted reflected
//!   and refracted path, with Beer's law absorption inside the medium
//!
//! The remaining depth bounds recursion; at zero the path carries nothing.

use crate::sampling::sample_hemisphere;
use crate::{
    beer_attenuation, dielectric_split, reflect, Color, Hit, Light, Material, RenderConfig, SamplingStrategy, Scene,
};
use rand::RngCore;
use std::f32::consts::FRAC_1_PI;
use tessera_math::{Ray, AIR_IOR};

/// Depth recorded for primary rays that leave the scene.
pub const SKY_DEPTH: f32 = 1.0e4;

/// Result of tracing one primary ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSample {
    pub radiance: Color,
    /// Distance to the first hit, or [`SKY_DEPTH`].
    pub depth: f32,
}

/// Path integrator over a borrowed scene.
#[derive(Clone, Copy)]
pub struct Integrator<'a> {
    scene: &'a Scene,
    config: &'a RenderConfig,
    debug: bool,
}

impl<'a> Integrator<'a> {
    pub fn new(scene: &'a Scene, config: &'a RenderConfig) -> Self {
        Self {
            scene,
            config,
            debug: false,
        }
    }

    /// In debug mode primary rays return the BVH traversal cost instead of
    /// radiance.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Trace a camera ray with the configured depth budget.
    pub fn trace_primary(&self, ray: &Ray, rng: &mut dyn RngCore) -> PixelSample {
        let hit = self.scene.bvh().intersect(ray);
        let depth = if hit.is_hit() { hit.t } else { SKY_DEPTH };

        let radiance = if self.debug {
            self.scene.bvh().debug(ray)
        } else {
            self.shade(ray, &hit, self.config.max_depth, rng)
        };

        PixelSample { radiance, depth }
    }

    /// Radiance arriving along `ray` with `depth` bounces left.
    pub fn shoot_ray(&self, ray: &Ray, depth: u32, rng: &mut dyn RngCore) -> Color {
        if depth == 0 {
            return Color::ZERO;
        }
        let hit = self.scene.bvh().intersect(ray);
        self.shade(ray, &hit, depth, rng)
    }

    fn shade(&self, ray: &Ray, hit: &Hit<'_>, depth: u32, rng: &mut dyn RngCore) -> Color {
        if depth == 0 {
            return Color::ZERO;
        }
        if !hit.is_hit() {
            return self.config.background;
        }

        match *hit.material {
            Material::Emitter { emission } => emission,
            Material::Lambertian { albedo } => self.diffuse(ray, hit, albedo, depth, rng),
            Material::Specular { albedo, specular } => {
                let specular = specular.clamp(0.0, 1.0);
                let local = self.local_lighting(hit, albedo);
                let reflected = self.reflected(ray, hit, depth, rng);
                (1.0 - specular) * local + specular * albedo * reflected
            }
            Material::Dielectric {
                ior,
                color,
                absorption,
            } => self.dielectric(ray, hit, ior, color, absorption, depth, rng),
        }
    }

    fn diffuse(&self, ray: &Ray, hit: &Hit<'_>, albedo: Color, depth: u32, rng: &mut dyn RngCore) -> Color {
        let direct = self.direct_lighting(hit) * albedo * FRAC_1_PI;

        match self.config.sampling {
            SamplingStrategy::Direct => direct,
            SamplingStrategy::GlobalIllumination => {
                let (dir, cos_theta) = sample_hemisphere(hit.normal, rng);
                let bounce = Ray::biased(hit.p, dir, self.config.reflection_bias).with_medium(ray.medium_ior);
                let incoming = self.shoot_ray(&bounce, depth - 1, rng);

                // BRDF albedo/π, uniform hemisphere pdf 1/2π
                direct + albedo * incoming * cos_theta * 2.0
            }
        }
    }

    fn reflected(&self, ray: &Ray, hit: &Hit<'_>, depth: u32, rng: &mut dyn RngCore) -> Color {
        let dir = reflect(ray.direction(), hit.normal);
        let reflected = Ray::biased(hit.p, dir, self.config.reflection_bias).with_medium(ray.medium_ior);
        self.shoot_ray(&reflected, depth - 1, rng)
    }

    #[allow(clippy::too_many_arguments)]
    fn dielectric(
        &self,
        ray: &Ray,
        hit: &Hit<'_>,
        ior: f32,
        color: Color,
        absorption: f32,
        depth: u32,
        rng: &mut dyn RngCore,
    ) -> Color {
        let n1 = ray.medium_ior;
        let n2 = if hit.front_face() { ior } else { AIR_IOR };
        let split = dielectric_split(ray.direction(), hit.normal, n1, n2);

        let mut result = Color::ZERO;

        if split.kr > 0.0 {
            let reflected = Ray::biased(hit.p, split.reflected, self.config.reflection_bias).with_medium(n1);
            result += split.kr * self.shoot_ray(&reflected, depth - 1, rng);
        }

        if let Some(dir) = split.refracted {
            let refracted = Ray::biased(hit.p, dir, self.config.refraction_bias).with_medium(n2);
            let mut transmitted = self.shoot_ray(&refracted, depth - 1, rng);

            // Leaving the medium: the ray travelled `t` inside it
            if !hit.front_face() {
                transmitted *= beer_attenuation(color, absorption, hit.t);
            }
            result += (1.0 - split.kr) * transmitted;
        }

        result
    }

    /// Unweighted sum of every light's contribution at the hit.
    fn direct_lighting(&self, hit: &Hit<'_>) -> Color {
        self.scene
            .lights()
            .iter()
            .map(|light| self.shadow_contribution(hit, light))
            .sum()
    }

    /// Direct lighting scaled by albedo, without the diffuse 1/π.
    fn local_lighting(&self, hit: &Hit<'_>, albedo: Color) -> Color {
        albedo * self.direct_lighting(hit)
    }

    /// Light arriving at the hit point from `light`, or black when the
    /// light is behind the surface, outside its cone, or occluded.
    pub fn shadow_contribution(&self, hit: &Hit<'_>, light: &Light) -> Color {
        let Some(sample) = light.sample(hit.p) else {
            return Color::ZERO;
        };

        let cos_theta = hit.normal.dot(sample.direction);
        if cos_theta <= 0.0 {
            return Color::ZERO;
        }

        let bias = self.config.shadow_bias;
        let shadow_ray = Ray::biased(hit.p, sample.direction, bias).with_max_distance(sample.distance - bias);
        if self.scene.bvh().occluded(&shadow_ray) {
            return Color::ZERO;
        }

        light.radiance() * cos_theta * sample.falloff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Primitive, Sphere, Vec3};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(sampling: SamplingStrategy, max_depth: u32) -> RenderConfig {
        RenderConfig {
            sampling,
            max_depth,
            ..RenderConfig::default()
        }
    }

    fn boxed(sphere: Sphere) -> Box<dyn Primitive> {
        Box::new(sphere)
    }

    #[test]
    fn test_depth_zero_is_black_even_on_emitter() {
        let scene = Scene::new(
            vec![boxed(Sphere::new(-5.0 * Vec3::Z, 1.0, Material::emitter(Color::splat(4.0))))],
            vec![],
        );
        let config = config(SamplingStrategy::GlobalIllumination, 4);
        let integrator = Integrator::new(&scene, &config);
        let mut rng = StdRng::seed_from_u64(0);
        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);

        assert_eq!(integrator.shoot_ray(&ray, 0, &mut rng), Color::ZERO);
        assert_eq!(integrator.shoot_ray(&ray, 1, &mut rng), Color::splat(4.0));
    }

    #[test]
    fn test_miss_returns_background() {
        let scene = Scene::empty();
        let config = RenderConfig {
            background: Color::new(0.1, 0.2, 0.3),
            ..RenderConfig::default()
        };
        let integrator = Integrator::new(&scene, &config);
        let mut rng = StdRng::seed_from_u64(0);

        let sample = integrator.trace_primary(&Ray::new(Vec3::ZERO, Vec3::X), &mut rng);
        assert_eq!(sample.radiance, config.background);
        assert_eq!(sample.depth, SKY_DEPTH);
    }

    #[test]
    fn test_direct_lambertian_point_light() {
        let albedo = Color::new(0.8, 0.4, 0.2);
        let scene = Scene::new(
            vec![boxed(Sphere::new(Vec3::ZERO, 1.0, Material::lambertian(albedo)))],
            vec![Light::point(Vec3::new(0.0, 3.0, 0.0), Color::ONE, 4.0)],
        );
        let config = config(SamplingStrategy::Direct, 4);
        let integrator = Integrator::new(&scene, &config);
        let mut rng = StdRng::seed_from_u64(0);

        // Hits the top of the sphere, two units below the light
        let sample = integrator.trace_primary(&Ray::new(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y), &mut rng);
        let expected = albedo * FRAC_1_PI;
        assert!((sample.radiance - expected).length() < 1e-4, "{:?}", sample.radiance);
        assert!((sample.depth - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_specular_blends_local_and_reflected() {
        let albedo = Color::splat(0.5);
        let scene = Scene::new(
            vec![
                boxed(Sphere::new(Vec3::ZERO, 1.0, Material::specular(albedo, 0.25))),
                // Straight back up the reflected path
                boxed(Sphere::new(Vec3::new(0.0, 10.0, 0.0), 1.0, Material::emitter(Color::splat(2.0)))),
            ],
            vec![Light::directional(-Vec3::Y, Color::ONE, 1.0)],
        );
        let config = config(SamplingStrategy::Direct, 4);
        let integrator = Integrator::new(&scene, &config);
        let mut rng = StdRng::seed_from_u64(0);

        // The emitter blocks the directional light, so local lighting is zero
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), -Vec3::Y);
        let radiance = integrator.shoot_ray(&ray, 4, &mut rng);
        let expected = 0.25 * albedo * Color::splat(2.0);
        assert!((radiance - expected).length() < 1e-5, "{radiance:?}");
    }

    #[test]
    fn test_shadow_contribution() {
        let material = Material::lambertian(Color::ONE);
        let blocker = Scene::new(
            vec![boxed(Sphere::new(Vec3::new(0.0, 2.0, 0.0), 0.5, material))],
            vec![],
        );
        let open = Scene::empty();
        let config = RenderConfig::default();
        let light = Light::point(Vec3::new(0.0, 4.0, 0.0), Color::ONE, 2.0);

        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y);
        let hit = Hit::from_outward_normal(&ray, 1.0, Vec3::Y, (0.0, 0.0), &material);

        let lit = Integrator::new(&open, &config).shadow_contribution(&hit, &light);
        assert!((lit - Color::splat(2.0 / 16.0)).length() < 1e-6);

        let shadowed = Integrator::new(&blocker, &config).shadow_contribution(&hit, &light);
        assert_eq!(shadowed, Color::ZERO);

        // Light below the surface
        let below = Light::point(Vec3::new(0.0, -4.0, 0.0), Color::ONE, 2.0);
        assert_eq!(Integrator::new(&open, &config).shadow_contribution(&hit, &below), Color::ZERO);
    }

    #[test]
    fn test_shadow_contribution_directional() {
        let material = Material::lambertian(Color::ONE);
        let open = Scene::empty();
        // Far above the surface; directional lights reach past any distance
        let blocker = Scene::new(
            vec![boxed(Sphere::new(Vec3::new(0.0, 50.0, 0.0), 1.0, material))],
            vec![],
        );
        let config = RenderConfig::default();
        let light = Light::directional(-Vec3::Y, Color::new(1.0, 0.5, 0.25), 2.0);

        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y);
        let hit = Hit::from_outward_normal(&ray, 1.0, Vec3::Y, (0.0, 0.0), &material);

        let lit = Integrator::new(&open, &config).shadow_contribution(&hit, &light);
        assert!((lit - Color::new(2.0, 1.0, 0.5)).length() < 1e-6, "{lit:?}");

        let shadowed = Integrator::new(&blocker, &config).shadow_contribution(&hit, &light);
        assert_eq!(shadowed, Color::ZERO);

        // Grazing at 60 degrees: scaled by the cosine
        let slanted = Light::directional(Vec3::new(-3f32.sqrt(), -1.0, 0.0), Color::ONE, 1.0);
        let lit = Integrator::new(&open, &config).shadow_contribution(&hit, &slanted);
        assert!((lit - Color::splat(0.5)).length() < 1e-5, "{lit:?}");
    }

    #[test]
    fn test_shadow_contribution_spot() {
        let material = Material::lambertian(Color::ONE);
        let scene = Scene::empty();
        let config = RenderConfig::default();
        let light = Light::spot(Vec3::new(0.0, 4.0, 0.0), -Vec3::Y, Color::ONE, 16.0, 30.0);
        let integrator = Integrator::new(&scene, &config);

        // Straight below the spot
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), -Vec3::Y);
        let inside = Hit::from_outward_normal(&ray, 1.0, Vec3::Y, (0.0, 0.0), &material);
        let lit = integrator.shadow_contribution(&inside, &light);
        assert!((lit - Color::ONE).length() < 1e-5, "{lit:?}");

        // 45 degrees off the axis
        let ray = Ray::new(Vec3::new(4.0, 1.0, 0.0), -Vec3::Y);
        let outside = Hit::from_outward_normal(&ray, 1.0, Vec3::Y, (0.0, 0.0), &material);
        assert_eq!(integrator.shadow_contribution(&outside, &light), Color::ZERO);
    }

    #[test]
    fn test_total_internal_reflection_transmits_nothing() {
        // A glass ball inside a glowing shell
        let scene = Scene::new(
            vec![
                boxed(Sphere::new(Vec3::ZERO, 1.0, Material::glass(1.5))),
                boxed(Sphere::new(Vec3::ZERO, 10.0, Material::emitter(Color::ONE))),
            ],
            vec![],
        );
        let config = config(SamplingStrategy::Direct, 6);
        let integrator = Integrator::new(&scene, &config);
        let mut rng = StdRng::seed_from_u64(0);

        // Inside the glass, 0.9 from the center: about 64 degrees incidence,
        // which every internal bounce preserves
        let trapped = Ray::new(Vec3::new(0.0, 0.9, 0.0), Vec3::X).with_medium(1.5);
        assert_eq!(integrator.shoot_ray(&trapped, 6, &mut rng), Color::ZERO);

        // About 17 degrees incidence: light escapes
        let escaping = Ray::new(Vec3::new(0.0, 0.3, 0.0), Vec3::X).with_medium(1.5);
        assert!(integrator.shoot_ray(&escaping, 6, &mut rng).x > 0.5);
    }

    #[test]
    fn test_beer_absorption_on_exit() {
        let scene = Scene::new(
            vec![
                boxed(Sphere::new(Vec3::ZERO, 1.0, Material::dielectric(1.5, Color::new(1.0, 0.5, 0.5), 1.0))),
                boxed(Sphere::new(Vec3::ZERO, 10.0, Material::emitter(Color::ONE))),
            ],
            vec![],
        );
        let config = config(SamplingStrategy::Direct, 2);
        let integrator = Integrator::new(&scene, &config);
        let mut rng = StdRng::seed_from_u64(0);

        // From the center, one unit of glass at normal incidence. The
        // reflected half runs out of depth inside the ball.
        let ray = Ray::new(Vec3::ZERO, Vec3::X).with_medium(1.5);
        let radiance = integrator.shoot_ray(&ray, 2, &mut rng);

        let transmitted = 1.0 - fresnel_normal(1.5, 1.0);
        let expected = transmitted * Color::new(1.0, (-0.5f32).exp(), (-0.5f32).exp());
        assert!((radiance - expected).length() < 1e-4, "{radiance:?} vs {expected:?}");
    }

    fn fresnel_normal(n1: f32, n2: f32) -> f32 {
        let r = (n1 - n2) / (n1 + n2);
        r * r
    }

    #[test]
    fn test_debug_mode_returns_traversal_cost() {
        let scene = Scene::new(
            vec![boxed(Sphere::new(-3.0 * Vec3::Z, 1.0, Material::emitter(Color::splat(5.0))))],
            vec![],
        );
        let config = RenderConfig::default();
        let integrator = Integrator::new(&scene, &config).with_debug(true);
        let mut rng = StdRng::seed_from_u64(0);

        let ray = Ray::new(Vec3::ZERO, -Vec3::Z);
        let sample = integrator.trace_primary(&ray, &mut rng);
        assert_eq!(sample.radiance, scene.bvh().debug(&ray));
        assert!(sample.radiance.x > 0.0 && sample.radiance.x < 1.0);
    }

    #[test]
    fn test_radiance_is_never_negative() {
        let scene = Scene::new(
            vec![
                boxed(Sphere::new(Vec3::new(0.0, -101.0, 0.0), 100.0, Material::lambertian(Color::splat(0.7)))),
                boxed(Sphere::new(Vec3::new(-1.5, 0.0, -4.0), 1.0, Material::specular(Color::new(0.9, 0.2, 0.2), 0.6))),
                boxed(Sphere::new(Vec3::new(1.5, 0.0, -4.0), 1.0, Material::dielectric(1.5, Color::new(0.2, 0.9, 0.3), 0.5))),
                boxed(Sphere::new(Vec3::new(0.0, 6.0, -4.0), 2.0, Material::emitter(Color::splat(8.0)))),
            ],
            vec![
                Light::point(Vec3::new(2.0, 3.0, 0.0), Color::ONE, 5.0),
                Light::spot(Vec3::new(0.0, 4.0, -4.0), -Vec3::Y, Color::ONE, 5.0, 25.0),
            ],
        );
        let config = config(SamplingStrategy::GlobalIllumination, 5);
        let integrator = Integrator::new(&scene, &config);
        let mut rng = StdRng::seed_from_u64(11);

        for i in 0..2000 {
            let x = (i % 50) as f32 / 25.0 - 1.0;
            let y = (i / 50) as f32 / 20.0 - 1.0;
            let ray = Ray::new(Vec3::ZERO, Vec3::new(x, y, -1.0));
            let sample = integrator.trace_primary(&ray, &mut rng);
            assert!(sample.radiance.min_element() >= 0.0, "{:?}", sample.radiance);
        }
    }

    #[test]
    fn test_emissive_sphere_over_diffuse_converges() {
        let albedo = Color::splat(0.5);
        let scene = Scene::new(
            vec![
                boxed(Sphere::new(Vec3::new(0.0, 6.0, 0.0), 3.0, Material::emitter(Color::splat(10.0)))),
                boxed(Sphere::new(Vec3::new(0.0, -1.0, 0.0), 1.0, Material::lambertian(albedo))),
            ],
            vec![],
        );
        let config = config(SamplingStrategy::GlobalIllumination, 2);
        let integrator = Integrator::new(&scene, &config);
        let mut rng = StdRng::seed_from_u64(1234);

        // Hits the diffuse sphere at the origin, normal +Y. The emitter
        // subtends a cone of half angle 30 degrees there, so the irradiance
        // is π·10·sin²(30°) and the outgoing radiance albedo·10/4.
        let ray = Ray::new(Vec3::new(0.0, 2.0, 0.0), -Vec3::Y);
        let samples = 100_000;
        let mut sum = Color::ZERO;
        for _ in 0..samples {
            sum += integrator.shoot_ray(&ray, 2, &mut rng);
        }
        let mean = sum / samples as f32;
        let expected = albedo * 10.0 * 0.25;
        assert!(
            ((mean - expected) / expected).abs().max_element() < 0.05,
            "mean {mean:?} expected {expected:?}"
        );
    }
}
