//! Seeded gradient-noise terrain.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::{TerrainConfig, TerrainGenerator, Tile, TileKind};

/// Island-and-ridge height map from fractal Perlin noise.
#[derive(Debug, Clone)]
pub struct NoiseTerrain {
    perm: [u8; 256],
    sea_level: f64,
    /// World tiles per noise unit, inverted.
    frequency: f64,
    octaves: u32,
}

impl NoiseTerrain {
    #[must_use]
    pub fn new(seed: u64, sea_level: f64) -> Self {
        let mut perm: [u8; 256] = std::array::from_fn(|i| i as u8);
        perm.shuffle(&mut StdRng::seed_from_u64(seed));

        Self {
            perm,
            sea_level,
            frequency: 1.0 / 48.0,
            octaves: 4,
        }
    }

    #[must_use]
    pub fn from_config(config: &TerrainConfig) -> Self {
        Self::new(config.seed, config.sea_level)
    }

    /// Height in `[-1, 1]` at world tile coordinates.
    #[must_use]
    pub fn height(&self, x: i64, y: i64) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.frequency;
        let mut total = 0.0;

        for _ in 0..self.octaves {
            value += self.perlin(x as f64 * frequency, y as f64 * frequency) * amplitude;
            total += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }

        (value / total).clamp(-1.0, 1.0)
    }

    fn kind_for(&self, height: f64) -> TileKind {
        match height - self.sea_level {
            h if h < 0.0 => TileKind::Water,
            h if h < 0.06 => TileKind::Sand,
            h if h < 0.35 => TileKind::Grass,
            h if h < 0.6 => TileKind::Forest,
            _ => TileKind::Rock,
        }
    }

    fn hash(&self, x: i64, y: i64) -> u8 {
        let inner = self.perm[(y & 255) as usize];
        self.perm[((x + i64::from(inner)) & 255) as usize]
    }

    fn perlin(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor();
        let y0 = y.floor();
        let (dx, dy) = (x - x0, y - y0);
        let (ix, iy) = (x0 as i64, y0 as i64);

        let corner = |cx: i64, cy: i64, ox: f64, oy: f64| gradient(self.hash(cx, cy), ox, oy);
        let n00 = corner(ix, iy, dx, dy);
        let n10 = corner(ix + 1, iy, dx - 1.0, dy);
        let n01 = corner(ix, iy + 1, dx, dy - 1.0);
        let n11 = corner(ix + 1, iy + 1, dx - 1.0, dy - 1.0);

        let (sx, sy) = (smootherstep(dx), smootherstep(dy));
        let bottom = n00 + sx * (n10 - n00);
        let top = n01 + sx * (n11 - n01);
        bottom + sy * (top - bottom)
    }
}

impl TerrainGenerator for NoiseTerrain {
    fn tile(&self, x: i64, y: i64) -> Tile {
        let height = self.height(x, y);
        let elevation = ((height + 1.0) * 127.5).round() as u8;
        Tile::new(self.kind_for(height), elevation)
    }
}

fn gradient(hash: u8, x: f64, y: f64) -> f64 {
    match hash & 7 {
        0 => x + y,
        1 => y + x * 0.5,
        2 => -x + y,
        3 => -y + x * 0.5,
        4 => x - y,
        5 => y * 0.5 - x,
        6 => -x - y,
        _ => -y - x * 0.5,
    }
}

fn smootherstep(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loam_spatial::{ChunkKey, ChunkSize};

    #[test]
    fn deterministic_per_seed() {
        let a = NoiseTerrain::new(42, -0.1);
        let b = NoiseTerrain::new(42, -0.1);
        let c = NoiseTerrain::new(43, -0.1);

        let sample = |t: &NoiseTerrain| (0..64).map(|i| t.tile(i * 7, -i * 3)).collect::<Vec<_>>();
        assert_eq!(sample(&a), sample(&b));
        assert_ne!(sample(&a), sample(&c));
    }

    #[test]
    fn heights_in_range() {
        let terrain = NoiseTerrain::new(7, 0.0);

        for x in (-500..500).step_by(37) {
            for y in (-500..500).step_by(41) {
                let h = terrain.height(x, y);
                assert!((-1.0..=1.0).contains(&h), "{h}");
            }
        }
    }

    #[test]
    fn chunk_matches_tile_function() {
        let terrain = NoiseTerrain::new(1, -0.1);
        let size = ChunkSize::new(16).unwrap();
        let chunk = terrain.generate(ChunkKey::new(-2, 3), size);

        assert_eq!(chunk.tile(-32, 48), terrain.tile(-32, 48));
        assert_eq!(chunk.tile(-17, 63), terrain.tile(-17, 63));
    }

    #[test]
    fn sea_level_one_is_all_water() {
        let terrain = NoiseTerrain::new(3, 1.0);

        assert!((0..100).all(|i| terrain.tile(i, i * 2).is_water() || terrain.height(i, i * 2) >= 1.0));
    }
}
