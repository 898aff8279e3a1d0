//! Tile-based rendering.
//!
//! Divides the image into tiles that can be rendered independently and in
//! parallel using rayon. Each tile owns a random number generator seeded
//! from the render seed, the pass and the tile's index, so a pass gives the
//! same image however the tiles are scheduled.

use crate::{Camera, Integrator, PixelSample};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 32;

/// A rectangular region of the image to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    /// X coordinate of tile's top-left corner
    pub x: u32,
    /// Y coordinate of tile's top-left corner
    pub y: u32,
    /// Width of the tile in pixels
    pub width: u32,
    /// Height of the tile in pixels
    pub height: u32,
    /// Index of this tile in the render order
    pub index: usize,
}

impl Tile {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    /// Get the total number of pixels in this tile.
    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }
}

/// Generate tiles for an image, sorted from the center outward.
///
/// Tiles along the right and bottom edges are clipped to the image.
pub fn generate_tiles(width: u32, height: u32, tile_size: u32) -> Vec<Tile> {
    let tile_size = tile_size.max(1);
    let mut tiles = Vec::new();

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let tw = tile_size.min(width - x);
            let th = tile_size.min(height - y);
            tiles.push(Tile::new(x, y, tw, th, tiles.len()));
            x += tile_size;
        }
        y += tile_size;
    }

    sort_spiral(&mut tiles, width, height);

    // Update indices after sorting
    for (i, tile) in tiles.iter_mut().enumerate() {
        tile.index = i;
    }

    tiles
}

/// Sort tiles by distance from image center.
fn sort_spiral(tiles: &mut [Tile], width: u32, height: u32) {
    let center_x = width as f32 / 2.0;
    let center_y = height as f32 / 2.0;

    let distance = |t: &Tile| {
        let dx = t.x as f32 + t.width as f32 / 2.0 - center_x;
        let dy = t.y as f32 + t.height as f32 / 2.0 - center_y;
        dx * dx + dy * dy
    };

    // Stable, so equidistant tiles keep scanline order
    tiles.sort_by(|a, b| distance(a).total_cmp(&distance(b)));
}

/// Samples produced for one tile.
#[derive(Debug, Clone)]
pub struct TileResult {
    /// The tile that was rendered
    pub tile: Tile,
    /// One sample per pixel in row-major order within the tile
    pub samples: Vec<PixelSample>,
}

/// Seed for a tile's generator, mixed so neighbouring tiles and passes
/// produce unrelated streams.
fn tile_seed(seed: u64, pass: u32, tile_index: usize) -> u64 {
    let mut h = seed ^ 0x9E37_79B9_7F4A_7C15;
    for word in [pass as u64, tile_index as u64] {
        h = (h ^ word).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        h ^= h >> 31;
    }
    h
}

/// Render one sample for every pixel of `tile`.
pub fn render_tile(tile: &Tile, camera: &Camera, integrator: &Integrator<'_>, seed: u64, pass: u32) -> TileResult {
    let mut rng = StdRng::seed_from_u64(tile_seed(seed, pass, tile.index));
    let mut samples = Vec::with_capacity(tile.pixel_count() as usize);

    for local_y in 0..tile.height {
        for local_x in 0..tile.width {
            let ray = camera.primary_ray(tile.x + local_x, tile.y + local_y, &mut rng);
            samples.push(integrator.trace_primary(&ray, &mut rng));
        }
    }

    TileResult {
        tile: *tile,
        samples,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Light, Material, Primitive, RenderConfig, Scene, Sphere, Vec3};

    #[test]
    fn test_generate_tiles_exact_fit() {
        let tiles = generate_tiles(128, 128, 64);
        assert_eq!(tiles.len(), 4); // 2x2 grid

        let total_pixels: u32 = tiles.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total_pixels, 128 * 128);
    }

    #[test]
    fn test_generate_tiles_partial_fit() {
        let tiles = generate_tiles(100, 70, 64);
        assert_eq!(tiles.len(), 4); // 2x2 grid with clipped tiles

        let total_pixels: u32 = tiles.iter().map(|t| t.pixel_count()).sum();
        assert_eq!(total_pixels, 100 * 70);
        assert!(tiles.iter().all(|t| t.x + t.width <= 100 && t.y + t.height <= 70));
    }

    #[test]
    fn test_tiles_cover_every_pixel_once() {
        let (w, h) = (75, 41);
        let mut covered = vec![0u8; (w * h) as usize];
        for tile in generate_tiles(w, h, 16) {
            for y in tile.y..tile.y + tile.height {
                for x in tile.x..tile.x + tile.width {
                    covered[(y * w + x) as usize] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_spiral_order() {
        let tiles = generate_tiles(192, 192, 64);
        assert_eq!(tiles.len(), 9); // 3x3 grid

        // First tile should be the center one
        assert_eq!((tiles[0].x, tiles[0].y), (64, 64));
        // Corners come last
        assert!(tiles[5..].iter().all(|t| t.x != 64 && t.y != 64));
        assert!(tiles.iter().enumerate().all(|(i, t)| t.index == i));
    }

    #[test]
    fn test_render_tile_is_deterministic() {
        let scene = Scene::new(
            vec![Box::new(Sphere::new(-3.0 * Vec3::Z, 1.0, Material::lambertian(Color::splat(0.5)))) as Box<dyn Primitive>],
            vec![Light::point(Vec3::new(0.0, 3.0, 0.0), Color::ONE, 10.0)],
        );
        let config = RenderConfig::default();
        let camera = Camera::new().with_resolution(16, 16);
        let integrator = Integrator::new(&scene, &config);
        let tile = Tile::new(4, 4, 8, 8, 3);

        let a = render_tile(&tile, &camera, &integrator, 7, 2);
        let b = render_tile(&tile, &camera, &integrator, 7, 2);
        let c = render_tile(&tile, &camera, &integrator, 7, 3);

        assert_eq!(a.samples.len(), 64);
        assert_eq!(a.samples, b.samples);
        assert_ne!(a.samples, c.samples);
    }

    #[test]
    fn test_tile_seeds_differ() {
        assert_ne!(tile_seed(0, 0, 0), tile_seed(0, 0, 1));
        assert_ne!(tile_seed(0, 0, 0), tile_seed(0, 1, 0));
        assert_ne!(tile_seed(0, 1, 0), tile_seed(0, 0, 1));
    }
}
