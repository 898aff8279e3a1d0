//! Render configuration.

use crate::{Color, DEFAULT_TILE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// How diffuse surfaces gather light.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    /// Explicit light sampling only.
    Direct,
    /// Explicit light sampling plus one random hemisphere bounce.
    #[default]
    GlobalIllumination,
}

/// Errors produced while loading or validating a [`RenderConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Render configuration.
///
/// Every field has a default, so a config file only needs to name the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Edge length of the square render tiles
    pub tile_size: u32,
    /// Maximum ray recursion depth
    pub max_depth: u32,
    /// Samples per pixel after which the image is considered converged
    pub max_samples: u32,
    /// Offset applied to shadow ray origins
    pub shadow_bias: f32,
    /// Offset applied to reflected and bounce ray origins
    pub reflection_bias: f32,
    /// Offset applied to refracted ray origins
    pub refraction_bias: f32,
    /// Largest depth difference the output filter still blends across
    pub depth_filter_bias: f32,
    /// Radiance returned by rays that leave the scene
    pub background: Color,
    pub sampling: SamplingStrategy,
    /// Apply the depth-aware 3x3 filter to the output
    pub depth_filter: bool,
    /// Seed for the per-tile random number generators
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            tile_size: DEFAULT_TILE_SIZE,
            max_depth: 6,
            max_samples: 1024,
            shadow_bias: 1e-3,
            reflection_bias: 1e-3,
            refraction_bias: 1e-3,
            depth_filter_bias: 0.1,
            background: Color::ZERO,
            sampling: SamplingStrategy::default(),
            depth_filter: false,
            seed: 0,
        }
    }
}

impl RenderConfig {
    /// Parse a JSON config, filling absent fields with defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded render config from {}", path.display());
        Ok(config)
    }

    /// Check the values are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.tile_size == 0 {
            return Err(ConfigError::Invalid("tile_size must be non-zero".into()));
        }
        if self.max_samples == 0 {
            return Err(ConfigError::Invalid("max_samples must be non-zero".into()));
        }

        let biases = [
            ("shadow_bias", self.shadow_bias),
            ("reflection_bias", self.reflection_bias),
            ("refraction_bias", self.refraction_bias),
            ("depth_filter_bias", self.depth_filter_bias),
        ];
        for (name, value) in biases {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }

        if !self.background.is_finite() || self.background.min_element() < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "background must be finite and non-negative, got {}",
                self.background
            )));
        }

        Ok(())
    }

    /// Width over height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
