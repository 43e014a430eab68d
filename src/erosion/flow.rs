//! Flow solver: virtual-pipe outflow and surface tilt.
//!
//! Each cell accumulates outflow toward its four neighbors from the
//! difference in total head (terrain + water), then scales all four channels
//! so the cell cannot lose more water in one tick than it holds.

use rayon::prelude::*;

use super::SimulationConfig;
use crate::grid::{Direction, Flux, GridSize};
use crate::terrain::TerrainModel;

/// Factor in `[0, 1]` that limits outflow to the water held by the cell.
///
/// Returns 1 when the cell has no outflow.
#[inline]
pub fn scaling_factor(flux: &Flux, water: f32, time_step: f32, cell_area: f32) -> f32 {
    let volume = flux.iter().sum::<f32>() * time_step;
    if volume == 0.0 {
        return 1.0;
    }
    (water * cell_area / volume).min(1.0)
}

/// Maps averaged slopes to a steepness in `[0, 1)`.
#[inline]
pub fn tilt_from_slopes(dx: f32, dy: f32) -> f32 {
    let s = dx * dx + dy * dy;
    s.sqrt() / (1.0 + s).sqrt()
}

/// Recomputes flux and tilt for one cell from its previous flux.
fn flow_at<T: TerrainModel>(
    terrain: &T,
    water: &[f32],
    size: GridSize,
    x: usize,
    y: usize,
    previous: Flux,
    config: &SimulationConfig,
) -> (Flux, f32) {
    let center_h = terrain.get_height(x, y);
    let center_w = water[size.index(x, y)];
    let center_head = center_h + center_w;

    let mut heights = [center_h; 4];
    let mut flux = previous;

    for dir in Direction::ALL {
        let i = dir.index();
        let neighbor_head = match config.boundary.neighbor(size, x, y, dir) {
            Some((nx, ny)) => {
                heights[i] = terrain.get_height(nx, ny);
                heights[i] + water[size.index(nx, ny)]
            }
            None => center_head,
        };

        let head_diff = center_head - neighbor_head;
        let c = config.time_step * config.pipe_area * config.gravity * head_diff / config.pipe_length(dir);
        flux[i] = (flux[i] + c).max(0.0);
    }

    let k = scaling_factor(&flux, center_w, config.time_step, config.cell_area());
    for f in &mut flux {
        *f *= k;
    }

    let dy = 0.5
        * ((center_h - heights[Direction::Up.index()]) + (heights[Direction::Down.index()] - center_h))
        / config.meters_per_y;
    let dx = 0.5
        * ((center_h - heights[Direction::Left.index()]) + (heights[Direction::Right.index()] - center_h))
        / config.meters_per_x;

    (flux, tilt_from_slopes(dx, dy))
}

/// Updates `flux` in place and overwrites `tilt` for every cell.
///
/// Each cell only reads its own previous flux, so rows are processed in
/// parallel without aliasing.
pub(crate) fn compute_flow_and_tilt<T: TerrainModel>(
    terrain: &T,
    water: &[f32],
    flux: &mut [Flux],
    tilt: &mut [f32],
    config: &SimulationConfig,
) {
    let size = terrain.size();
    if size.is_empty() {
        return;
    }
    debug_assert_eq!(water.len(), size.cell_count());
    debug_assert_eq!(flux.len(), size.cell_count());

    flux.par_chunks_mut(size.width)
        .zip(tilt.par_chunks_mut(size.width))
        .enumerate()
        .for_each(|(y, (flux_row, tilt_row))| {
            for x in 0..size.width {
                let (f, t) = flow_at(terrain, water, size, x, y, flux_row[x], config);
                flux_row[x] = f;
                tilt_row[x] = t;
            }
        });
}
