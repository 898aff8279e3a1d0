//! Built-in demo scenes.

use clap::ValueEnum;
use tessera_renderer::{Camera, Color, Light, Material, Primitive, Scene, Sphere, Triangle, Vec3};

/// Radius of the spheres that stand in for walls. Kept small enough for
/// f32 intersection tests to stay accurate.
const WALL_RADIUS: f32 = 1e3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DemoScene {
    /// Colored spheres in a box of wall spheres, lit by a glowing sphere
    Spheres,
    /// Mirror, glass and diffuse spheres on a floor, lit by analytic lights
    Lights,
}

impl DemoScene {
    pub fn build(self) -> (Scene, Camera) {
        match self {
            DemoScene::Spheres => spheres(),
            DemoScene::Lights => lights(),
        }
    }
}

fn spheres() -> (Scene, Camera) {
    let camera = Camera::new()
        .with_position(Vec3::new(0.0, 0.0, 2.0), Vec3::ZERO, Vec3::Y)
        .with_lens(45.0, 0.0, 15.0);

    let mut primitives: Vec<Box<dyn Primitive>> = vec![
        // Light, half sunk into the ceiling
        Box::new(Sphere::new(Vec3::new(0.0, 10.0, -15.0), 3.0, Material::emitter(Color::splat(10.0)))),
        // Ceiling, floor and back wall
        Box::new(Sphere::new(
            Vec3::new(0.0, WALL_RADIUS + 10.0, -15.0),
            WALL_RADIUS,
            Material::lambertian(Color::splat(0.25)),
        )),
        Box::new(Sphere::new(
            Vec3::new(0.0, -WALL_RADIUS - 5.0, -15.0),
            WALL_RADIUS,
            Material::lambertian(Color::new(0.75, 0.25, 0.25)),
        )),
        Box::new(Sphere::new(
            Vec3::new(0.0, 0.0, -WALL_RADIUS - 20.0),
            WALL_RADIUS,
            Material::lambertian(Color::new(0.25, 0.25, 0.75)),
        )),
        Box::new(Sphere::new(Vec3::new(-3.0, 0.0, -12.0), 2.0, Material::lambertian(Color::new(0.25, 0.75, 0.25)))),
        Box::new(Sphere::new(Vec3::new(4.0, 2.5, -12.0), 2.0, Material::lambertian(Color::new(0.1, 0.3, 0.6)))),
        Box::new(Sphere::new(Vec3::new(0.0, -3.0, -15.0), 2.0, Material::glass(1.51))),
    ];

    // A small mirror panel, built at the origin and moved into place
    let mut panel = [
        Triangle::new(
            Vec3::new(-1.5, 0.0, 0.0),
            Vec3::new(1.5, 0.0, 0.0),
            Vec3::new(1.5, 3.0, 0.0),
            Material::specular(Color::new(0.75, 0.75, 0.25), 0.8),
        ),
        Triangle::new(
            Vec3::new(-1.5, 0.0, 0.0),
            Vec3::new(1.5, 3.0, 0.0),
            Vec3::new(-1.5, 3.0, 0.0),
            Material::specular(Color::new(0.75, 0.75, 0.25), 0.8),
        ),
    ];
    for triangle in &mut panel {
        triangle.translate(Vec3::new(6.0, -5.0, -19.0));
    }
    primitives.extend(panel.into_iter().map(|t| Box::new(t) as Box<dyn Primitive>));

    (Scene::new(primitives, Vec::new()), camera)
}

fn lights() -> (Scene, Camera) {
    let camera = Camera::new()
        .with_position(Vec3::new(0.0, 1.5, 4.0), Vec3::new(0.0, 0.5, -3.0), Vec3::Y)
        .with_lens(50.0, 0.0, 7.0);

    let floor = Material::lambertian(Color::splat(0.5));
    let size = 20.0;
    let primitives: Vec<Box<dyn Primitive>> = vec![
        Box::new(Triangle::new(
            Vec3::new(-size, -1.0, size),
            Vec3::new(size, -1.0, size),
            Vec3::new(size, -1.0, -size),
            floor,
        )),
        Box::new(Triangle::new(
            Vec3::new(-size, -1.0, size),
            Vec3::new(size, -1.0, -size),
            Vec3::new(-size, -1.0, -size),
            floor,
        )),
        Box::new(Sphere::new(Vec3::new(-2.2, 0.0, -3.0), 1.0, Material::specular(Color::splat(0.9), 0.7))),
        Box::new(Sphere::new(
            Vec3::new(0.0, 0.0, -3.0),
            1.0,
            Material::dielectric(1.5, Color::new(0.4, 0.9, 0.6), 0.8),
        )),
        Box::new(Sphere::new(Vec3::new(2.2, 0.0, -3.0), 1.0, Material::lambertian(Color::new(0.8, 0.3, 0.2)))),
    ];

    let lights = vec![
        Light::point(Vec3::new(-3.0, 4.0, 0.0), Color::new(1.0, 0.9, 0.8), 40.0),
        Light::spot(Vec3::new(2.2, 5.0, -3.0), -Vec3::Y, Color::ONE, 60.0, 20.0),
        Light::directional(Vec3::new(1.0, -2.0, -1.0), Color::new(0.6, 0.7, 1.0), 0.5),
    ];

    (Scene::new(primitives, lights), camera)
}
