//! Analytic light sources.

use crate::Color;
use serde::{Deserialize, Deserializer, Serialize};
use tessera_math::Vec3;

/// A punctual or directional light.
///
/// Directions are unit length. Deserialization goes through the
/// constructors so lights read from JSON are normalized too.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Light {
    /// Infinitely distant light arriving along `direction`.
    Directional {
        direction: Vec3,
        color: Color,
        intensity: f32,
    },
    /// Point light with inverse-square falloff.
    Point {
        position: Vec3,
        color: Color,
        intensity: f32,
    },
    /// Point light restricted to a cone around `direction`.
    ///
    /// `cone_angle` is the half angle of the cone, in degrees.
    Spot {
        position: Vec3,
        direction: Vec3,
        color: Color,
        intensity: f32,
        cone_angle: f32,
    },
}

/// Serialized form of [`Light`], before directions are normalized.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LightDef {
    Directional {
        direction: Vec3,
        color: Color,
        intensity: f32,
    },
    Point {
        position: Vec3,
        color: Color,
        intensity: f32,
    },
    Spot {
        position: Vec3,
        direction: Vec3,
        color: Color,
        intensity: f32,
        cone_angle: f32,
    },
}

impl From<LightDef> for Light {
    fn from(def: LightDef) -> Self {
        match def {
            LightDef::Directional {
                direction,
                color,
                intensity,
            } => Light::directional(direction, color, intensity),
            LightDef::Point {
                position,
                color,
                intensity,
            } => Light::point(position, color, intensity),
            LightDef::Spot {
                position,
                direction,
                color,
                intensity,
                cone_angle,
            } => Light::spot(position, direction, color, intensity, cone_angle),
        }
    }
}

impl<'de> Deserialize<'de> for Light {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        LightDef::deserialize(deserializer).map(Light::from)
    }
}

/// Geometry of a light as seen from a surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightSample {
    /// Unit direction from the surface towards the light.
    pub direction: Vec3,
    /// Distance to the light; infinite for directional lights.
    pub distance: f32,
    /// Attenuation with distance (1 for directional lights).
    pub falloff: f32,
}

impl Light {
    pub fn directional(direction: Vec3, color: Color, intensity: f32) -> Self {
        Light::Directional {
            direction: direction.normalize_or_zero(),
            color,
            intensity,
        }
    }

    pub fn point(position: Vec3, color: Color, intensity: f32) -> Self {
        Light::Point {
            position,
            color,
            intensity,
        }
    }

    pub fn spot(position: Vec3, direction: Vec3, color: Color, intensity: f32, cone_angle: f32) -> Self {
        Light::Spot {
            position,
            direction: direction.normalize_or_zero(),
            color,
            intensity,
            cone_angle,
        }
    }

    /// Color scaled by intensity.
    pub fn radiance(&self) -> Color {
        match *self {
            Light::Directional { color, intensity, .. }
            | Light::Point { color, intensity, .. }
            | Light::Spot { color, intensity, .. } => color * intensity,
        }
    }

    /// Where the light is as seen from `p`.
    ///
    /// Returns `None` when `p` is outside a spot light's cone or sits on a
    /// point light.
    pub fn sample(&self, p: Vec3) -> Option<LightSample> {
        match *self {
            Light::Directional { direction, .. } => Some(LightSample {
                direction: -direction,
                distance: f32::INFINITY,
                falloff: 1.0,
            }),
            Light::Point { position, .. } => towards(p, position),
            Light::Spot {
                position,
                direction,
                cone_angle,
                ..
            } => {
                let sample = towards(p, position)?;
                let cos_angle = (-sample.direction).dot(direction).clamp(-1.0, 1.0);
                if cos_angle.acos() > cone_angle.to_radians() {
                    return None;
                }
                Some(sample)
            }
        }
    }
}

fn towards(p: Vec3, position: Vec3) -> Option<LightSample> {
    let to_light = position - p;
    let distance_sq = to_light.length_squared();
    if distance_sq <= 0.0 {
        return None;
    }
    let distance = distance_sq.sqrt();
    Some(LightSample {
        direction: to_light / distance,
        distance,
        falloff: 1.0 / distance_sq,
    })
}
