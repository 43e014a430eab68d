//! Seeded synthetic terrain made of rounded domes.
//!
//! Used by the CLI and tests as a stand-in for loaded height data.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::HeightMap;

/// Parameters for [`generate_domes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomeConfig {
    /// Number of domes placed on the unit square.
    pub count: usize,
    /// Smallest dome radius in UV units (0-1).
    pub min_radius: f32,
    /// Largest dome radius in UV units (0-1).
    pub max_radius: f32,
    /// Elevation at the top of a dome.
    pub peak_height: f32,
    /// Amplitude of per-cell uniform noise added on top.
    pub jitter: f32,
    /// Random seed for reproducible generation.
    pub seed: u64,
}

impl Default for DomeConfig {
    fn default() -> Self {
        Self {
            count: 4,
            min_radius: 0.1,
            max_radius: 0.4,
            peak_height: 50.0,
            jitter: 2.0,
            seed: 0,
        }
    }
}

impl DomeConfig {
    /// Creates the default configuration with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }
}

struct Dome {
    u: f32,
    v: f32,
    radius: f32,
}

/// Generates a `width`×`height` height map of cosine-profiled domes plus
/// uniform jitter.
///
/// Rows are filled in parallel. Each row draws its jitter from its own
/// stream, so the output is independent of the thread count.
pub fn generate_domes(width: usize, height: usize, config: &DomeConfig) -> HeightMap {
    let mut map = HeightMap::new(width, height);
    if width == 0 || height == 0 {
        return map;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let (r_lo, r_hi) = if config.min_radius <= config.max_radius {
        (config.min_radius, config.max_radius)
    } else {
        (config.max_radius, config.min_radius)
    };
    let domes: Vec<Dome> = (0..config.count)
        .map(|_| Dome {
            u: rng.random::<f32>(),
            v: rng.random::<f32>(),
            radius: r_lo + rng.random::<f32>() * (r_hi - r_lo),
        })
        .collect();

    map.heights_mut()
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let mut row_rng = ChaCha8Rng::seed_from_u64(config.seed);
            row_rng.set_stream(y as u64 + 1);

            let v = (y as f32 + 0.5) / height as f32;
            for (x, cell) in row.iter_mut().enumerate() {
                let u = (x as f32 + 0.5) / width as f32;

                let mut profile = 0.0f32;
                for dome in &domes {
                    let du = u - dome.u;
                    let dv = v - dome.v;
                    let d2 = du * du + dv * dv;
                    if dome.radius > 0.0 && d2 < dome.radius * dome.radius {
                        let k = d2.sqrt() / dome.radius;
                        profile = profile.max((k * std::f32::consts::FRAC_PI_2).cos());
                    }
                }

                *cell = profile * config.peak_height + row_rng.random::<f32>() * config.jitter;
            }
        });

    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::TerrainModel;

    #[test]
    fn test_domes_are_reproducible() {
        let config = DomeConfig::with_seed(99);
        let a = generate_domes(32, 24, &config);
        let b = generate_domes(32, 24, &config);
        assert_eq!(a, b, "Same configuration should produce identical heights");
    }

    #[test]
    fn test_domes_stay_in_range() {
        let config = DomeConfig::with_seed(7);
        let map = generate_domes(64, 64, &config);
        let (min, max) = map.height_range();
        assert!(min >= 0.0);
        assert!(max <= config.peak_height + config.jitter);
        assert!(max > min, "Should have height variation");
    }

    #[test]
    fn test_no_jitter_without_domes_is_flat() {
        let config = DomeConfig {
            count: 0,
            jitter: 0.0,
            ..Default::default()
        };
        let map = generate_domes(8, 8, &config);
        assert!(map.heights().iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_empty_grid() {
        let map = generate_domes(0, 5, &DomeConfig::default());
        assert!(map.heights().is_empty());
    }
}
