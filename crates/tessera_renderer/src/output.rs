//! Output stage: turn accumulated radiance into displayable RGBA8.
//!
//! Averages are gamma corrected (gamma 2), optionally smoothed by a 3x3
//! filter that refuses to blend across depth discontinuities, then clamped
//! and quantized.

use crate::{AccumulationBuffer, Color};
use image::{ImageBuffer, ImageFormat, Rgba};
use rayon::prelude::*;
use std::path::Path;
use thiserror::Error;

/// 1-2-1 binomial weights; the 3x3 kernel is their outer product over 16.
const FILTER_WEIGHTS: [f32; 3] = [1.0, 2.0, 1.0];

/// Errors produced while writing a [`Frame`] to disk.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write image: {0}")]
    Image(#[from] image::ImageError),
    #[error("frame holds {actual} pixels but {width}x{height} needs {expected}")]
    BufferSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

/// A finished RGBA8 image, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[u8; 4]>,
}

impl Frame {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![[0, 0, 0, 255]; width as usize * height as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[(y * self.width + x) as usize]
    }

    /// The pixels as a flat byte slice, e.g. for upload to a texture.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Write the frame as a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        let path = path.as_ref();
        let expected = self.width as usize * self.height as usize;
        let buffer = ImageBuffer::<Rgba<u8>, _>::from_raw(self.width, self.height, self.as_bytes().to_vec())
            .ok_or(ExportError::BufferSize {
                width: self.width,
                height: self.height,
                expected,
                actual: self.pixels.len(),
            })?;

        log::info!("Writing image {} with resolution {}x{}", path.display(), self.width, self.height);
        buffer.save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Quantize a gamma-encoded color to 8-bit RGBA with opaque alpha.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let c = color.clamp(Color::ZERO, Color::ONE) * 255.0;
    [c.x as u8, c.y as u8, c.z as u8, 255]
}

/// 3x3 binomial blur that treats neighbours across a depth edge, or
/// outside the image, as copies of the center pixel.
///
/// `depths` must be per-pixel averages matching `colors`.
pub fn depth_aware_filter(colors: &[Color], depths: &[f32], width: u32, height: u32, bias: f32) -> Vec<Color> {
    let (w, h) = (width as i64, height as i64);

    (0..colors.len())
        .into_par_iter()
        .map(|idx| {
            let x = idx as i64 % w;
            let y = idx as i64 / w;
            let center = colors[idx];
            let center_depth = depths[idx];

            let mut sum = Color::ZERO;
            for (dy, wy) in (-1..=1).zip(FILTER_WEIGHTS) {
                for (dx, wx) in (-1..=1).zip(FILTER_WEIGHTS) {
                    let (nx, ny) = (x + dx, y + dy);
                    let value = if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        center
                    } else {
                        let n = (ny * w + nx) as usize;
                        if (depths[n] - center_depth).abs() > bias {
                            center
                        } else {
                            colors[n]
                        }
                    };
                    sum += value * (wx * wy);
                }
            }

            sum / 16.0
        })
        .collect()
}

/// Produce the displayable frame for the current accumulation state.
///
/// Before any pass has completed the divisor is one, so the result is black
/// rather than a division by zero.
pub fn resolve(accum: &AccumulationBuffer, filter: bool, depth_bias: f32) -> Frame {
    let (width, height) = (accum.width(), accum.height());

    let gamma: Vec<Color> = accum
        .averages()
        .into_par_iter()
        .map(|c| Color::new(linear_to_gamma(c.x), linear_to_gamma(c.y), linear_to_gamma(c.z)))
        .collect();

    let display = if filter {
        depth_aware_filter(&gamma, &accum.average_depths(), width, height, depth_bias)
    } else {
        gamma
    };

    Frame {
        width,
        height,
        pixels: display.into_par_iter().map(color_to_rgba).collect(),
    }
}
