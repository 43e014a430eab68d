//! Sediment pickup and deposition.

use glam::Vec2;
use rayon::prelude::*;

use super::{Coefficients, ErosionLimit, SimulationConfig};
use crate::grid::GridSize;
use crate::terrain::TerrainModel;

/// Sediment moved from terrain into suspension at one cell.
///
/// Positive values are erosion, negative values deposition. The terrain
/// changes by exactly the negated amount. Deposition never drops more than is
/// suspended and erosion never removes more than `erodible`.
#[inline]
pub fn sediment_exchange(capacity: f32, sediment: f32, deposition: f32, erosion: f32, erodible: f32) -> f32 {
    let factor = if capacity > sediment { erosion } else { deposition };
    (factor * (capacity - sediment)).max(-sediment).min(erodible)
}

/// Sediment that flowing water can hold: `kc * tilt * |v|`.
#[inline]
pub fn carry_capacity(kc: f32, tilt: f32, velocity: Vec2) -> f32 {
    kc * tilt * velocity.length()
}

/// Computes the next sediment generation and applies the matching height
/// changes through `terrain`.
///
/// Exchanges are computed in parallel into `height_delta`; they are then
/// applied to the terrain in one sequential pass so any `TerrainModel` can
/// receive them.
#[allow(clippy::too_many_arguments)]
pub(crate) fn erode_and_deposit<T: TerrainModel>(
    terrain: &mut T,
    velocity: &[Vec2],
    tilt: &[f32],
    coefficients: &Coefficients,
    sediment_in: &[f32],
    sediment_out: &mut [f32],
    height_delta: &mut [f32],
    config: &SimulationConfig,
) {
    let size: GridSize = terrain.size();
    if size.is_empty() {
        return;
    }

    {
        let terrain: &T = terrain;
        sediment_out
            .par_chunks_mut(size.width)
            .zip(height_delta.par_chunks_mut(size.width))
            .enumerate()
            .for_each(|(y, (sediment_row, delta_row))| {
                for x in 0..size.width {
                    let i = size.index(x, y);
                    let capacity = carry_capacity(
                        coefficients.carry_capacity.at(i),
                        tilt[i].max(config.min_tilt),
                        velocity[i],
                    );
                    let erodible = match config.erosion_limit {
                        ErosionLimit::Unbounded => f32::INFINITY,
                        ErosionLimit::ClampToErodible => terrain.erodible_depth(x, y),
                    };
                    let s = sediment_in[i];
                    let exchanged = sediment_exchange(
                        capacity,
                        s,
                        coefficients.deposition.at(i),
                        coefficients.erosion.at(i),
                        erodible,
                    );
                    sediment_row[x] = s + exchanged;
                    delta_row[x] = -exchanged;
                }
            });
    }

    for (i, &dh) in height_delta.iter().enumerate() {
        if dh != 0.0 {
            let (x, y) = size.coords(i);
            terrain.add_height(x, y, dh);
        }
    }
}
