//! Progressive accumulation buffer.

use crate::{Color, TileResult};

/// Counter value right after an invalidation: the sample about to be taken
/// is the first.
pub const INITIAL_SAMPLE_COUNTER: u32 = 1;

/// Per-pixel running sums of radiance and primary-hit depth.
///
/// The counter advances once per full pass, so every pixel always holds the
/// same number of samples and the average is `sum / (counter - 1)`.
#[derive(Debug, Clone)]
pub struct AccumulationBuffer {
    width: u32,
    height: u32,
    radiance: Vec<Color>,
    depth: Vec<f32>,
    sample_counter: u32,
}

impl AccumulationBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            radiance: vec![Color::ZERO; len],
            depth: vec![0.0; len],
            sample_counter: INITIAL_SAMPLE_COUNTER,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Zero every sum and restart the count.
    pub fn reset(&mut self) {
        self.radiance.fill(Color::ZERO);
        self.depth.fill(0.0);
        self.sample_counter = INITIAL_SAMPLE_COUNTER;
    }

    pub fn sample_counter(&self) -> u32 {
        self.sample_counter
    }

    /// Completed passes since the last reset.
    pub fn samples_taken(&self) -> u32 {
        self.sample_counter - INITIAL_SAMPLE_COUNTER
    }

    /// Add one tile's samples to its pixels.
    pub fn accumulate_tile(&mut self, result: &TileResult) {
        let tile = &result.tile;
        debug_assert_eq!(result.samples.len(), tile.pixel_count() as usize);

        for (i, sample) in result.samples.iter().enumerate() {
            let x = tile.x + i as u32 % tile.width;
            let y = tile.y + i as u32 / tile.width;
            let idx = (y * self.width + x) as usize;
            self.radiance[idx] += sample.radiance;
            self.depth[idx] += sample.depth;
        }
    }

    /// Mark the end of a pass over every pixel.
    pub fn finish_pass(&mut self) {
        self.sample_counter += 1;
    }

    fn divisor(&self) -> f32 {
        self.samples_taken().max(1) as f32
    }

    /// Mean radiance of pixel `idx`.
    pub fn average(&self, idx: usize) -> Color {
        self.radiance[idx] / self.divisor()
    }

    /// Mean primary-hit depth of pixel `idx`.
    pub fn average_depth(&self, idx: usize) -> f32 {
        self.depth[idx] / self.divisor()
    }

    /// Mean radiance of every pixel, row-major.
    pub fn averages(&self) -> Vec<Color> {
        let divisor = self.divisor();
        self.radiance.iter().map(|c| *c / divisor).collect()
    }

    /// Mean depth of every pixel, row-major.
    pub fn average_depths(&self) -> Vec<f32> {
        let divisor = self.divisor();
        self.depth.iter().map(|d| d / divisor).collect()
    }
}
