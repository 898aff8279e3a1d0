//! Random sampling helpers shared by the camera and the integrator.

use rand::{Rng, RngCore};
use std::f32::consts::PI;
use tessera_math::Vec3;

/// Hemisphere samples shorter than this are rejected and redrawn.
const MIN_SAMPLE_LENGTH: f32 = 1e-6;

/// Uniform random float in [0, 1).
#[inline]
pub fn gen_f32(rng: &mut dyn RngCore) -> f32 {
    rng.gen::<f32>()
}

/// Build a tangent/bitangent pair orthogonal to the unit normal `n`.
///
/// The tangent is solved for from `n · t = 0` with the two free components
/// set to one; the component divided by is the largest of the normal's, so
/// the division is never by (near) zero.
pub fn local_basis(n: Vec3) -> (Vec3, Vec3) {
    let abs = n.abs();
    let nt = if abs.z >= abs.x && abs.z >= abs.y {
        Vec3::new(1.0, 1.0, -(n.x + n.y) / n.z)
    } else if abs.y >= abs.x {
        Vec3::new(1.0, -(n.x + n.z) / n.y, 1.0)
    } else {
        Vec3::new(-(n.y + n.z) / n.x, 1.0, 1.0)
    }
    .normalize();
    let nb = n.cross(nt).normalize();
    (nt, nb)
}

/// Uniform direction on the +Y hemisphere from two uniform numbers.
///
/// `r1` is the cosine of the polar angle, `r2` the fraction of a turn.
/// The density is `1 / 2π` per steradian.
pub fn uniform_sample_hemisphere(r1: f32, r2: f32) -> Vec3 {
    let sin_theta = (1.0 - r1 * r1).max(0.0).sqrt();
    let phi = 2.0 * PI * r2;
    Vec3::new(sin_theta * phi.cos(), r1, sin_theta * phi.sin())
}

/// Uniform direction on the hemisphere around `n`.
///
/// Returns the world-space direction and its cosine with `n`.
pub fn sample_hemisphere(n: Vec3, rng: &mut dyn RngCore) -> (Vec3, f32) {
    let (nt, nb) = local_basis(n);
    loop {
        let r1 = gen_f32(rng);
        let r2 = gen_f32(rng);
        let local = uniform_sample_hemisphere(r1, r2);
        let world = local.x * nb + local.y * n + local.z * nt;

        if world.length_squared() > MIN_SAMPLE_LENGTH * MIN_SAMPLE_LENGTH {
            return (world.normalize(), r1);
        }
    }
}

/// Random point in the unit disk on the XY plane.
pub fn random_in_unit_disk(rng: &mut dyn RngCore) -> Vec3 {
    loop {
        let p = Vec3::new(gen_f32(rng) * 2.0 - 1.0, gen_f32(rng) * 2.0 - 1.0, 0.0);
        if p.length_squared() < 1.0 {
            return p;
        }
    }
}
