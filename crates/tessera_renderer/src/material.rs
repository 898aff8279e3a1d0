//! Surface materials and the optics helpers the integrator shades them with.

use tessera_math::Vec3;

/// Color type alias (RGB radiance, linear, unbounded above)
pub type Color = Vec3;

/// How light interacts with a surface.
///
/// Each variant carries only the parameters that make sense for it, so a
/// glass index of refraction can never be read off a diffuse surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Ideal diffuse reflector.
    Lambertian { albedo: Color },
    /// Mirror blended with local diffuse shading.
    ///
    /// `specular` is the fraction of the result taken from the mirror
    /// reflection, in [0, 1].
    Specular { albedo: Color, specular: f32 },
    /// Light source. Emitters are not shaded further.
    Emitter { emission: Color },
    /// Glass-like dielectric.
    ///
    /// Light refracted through the interior is absorbed according to Beer's
    /// law: channels where `color` is low are absorbed faster, scaled by
    /// `absorption` per unit distance.
    Dielectric { ior: f32, color: Color, absorption: f32 },
}

impl Material {
    /// Create a diffuse material with the given albedo.
    pub fn lambertian(albedo: Color) -> Self {
        Material::Lambertian { albedo }
    }

    /// Create a mirror material. `specular` is clamped to [0, 1].
    pub fn specular(albedo: Color, specular: f32) -> Self {
        Material::Specular {
            albedo,
            specular: specular.clamp(0.0, 1.0),
        }
    }

    /// Create a light-emitting material.
    pub fn emitter(emission: Color) -> Self {
        Material::Emitter { emission }
    }

    /// Create a dielectric.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    /// - `color`: transmitted tint, 1.0 per channel means no absorption
    /// - `absorption`: absorption coefficient per unit distance
    pub fn dielectric(ior: f32, color: Color, absorption: f32) -> Self {
        Material::Dielectric {
            ior: ior.max(1.0),
            color: color.clamp(Color::ZERO, Color::ONE),
            absorption: absorption.max(0.0),
        }
    }

    /// Clear glass with the given index of refraction.
    pub fn glass(ior: f32) -> Self {
        Self::dielectric(ior, Color::ONE, 0.0)
    }

    pub fn is_emitter(&self) -> bool {
        matches!(self, Material::Emitter { .. })
    }
}

/// Result of splitting a ray at a dielectric interface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DielectricSplit {
    /// Fresnel reflectance; 1.0 under total internal reflection.
    pub kr: f32,
    /// Mirror direction.
    pub reflected: Vec3,
    /// Transmitted direction, `None` under total internal reflection.
    pub refracted: Option<Vec3>,
}

/// Reflect a vector about a normal: `d' = d - 2(d·n)n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface whose normal faces against it.
///
/// `eta` is n1 / n2. Returns `None` under total internal reflection.
#[inline]
pub fn refract(d: Vec3, n: Vec3, eta: f32) -> Option<Vec3> {
    let cos_i = (-d.dot(n)).min(1.0);
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        return None;
    }
    Some((eta * d + (eta * cos_i - k.sqrt()) * n).normalize())
}

/// Fresnel reflectance for unpolarised light (full Fresnel equations).
///
/// `cos_i` is the cosine between the incoming direction and the normal,
/// `n1` the index the ray travels in and `n2` the index it enters.
/// Returns 1.0 under total internal reflection.
pub fn fresnel(cos_i: f32, n1: f32, n2: f32) -> f32 {
    let cos_i = cos_i.abs().min(1.0);
    let sin_t = n1 / n2 * (1.0 - cos_i * cos_i).max(0.0).sqrt();
    if sin_t >= 1.0 {
        return 1.0;
    }

    let cos_t = (1.0 - sin_t * sin_t).max(0.0).sqrt();
    let rs = (n2 * cos_i - n1 * cos_t) / (n2 * cos_i + n1 * cos_t);
    let rp = (n1 * cos_i - n2 * cos_t) / (n1 * cos_i + n2 * cos_t);
    ((rs * rs + rp * rp) * 0.5).clamp(0.0, 1.0)
}

/// Compute the reflected/refracted pair for a ray direction `d` hitting a
/// surface with normal `n` (facing against `d`), travelling from index
/// `n1` into index `n2`.
pub fn dielectric_split(d: Vec3, n: Vec3, n1: f32, n2: f32) -> DielectricSplit {
    let kr = fresnel(-d.dot(n), n1, n2);
    let refracted = if kr >= 1.0 { None } else { refract(d, n, n1 / n2) };

    DielectricSplit {
        // refract() and fresnel() can disagree by an ulp right at the
        // critical angle; no transmitted ray means everything reflects.
        kr: if refracted.is_some() { kr } else { 1.0 },
        reflected: reflect(d, n),
        refracted,
    }
}

/// Beer's law transmittance after travelling `distance` through a medium:
/// `exp(-(1 - color) * absorption * distance)` per channel.
pub fn beer_attenuation(color: Color, absorption: f32, distance: f32) -> Color {
    let density = (Color::ONE - color) * absorption * distance;
    Color::new((-density.x).exp(), (-density.y).exp(), (-density.z).exp())
}
