//! Semi-Lagrangian sediment advection.

use glam::Vec2;
use rayon::prelude::*;

use super::SimulationConfig;
use crate::grid::{BoundaryCondition, GridSize};

/// Bilinearly samples `field` at the fractional lattice position `(x, y)`.
///
/// Corners that fall outside a closed grid contribute zero.
pub fn sample_bilinear(field: &[f32], size: GridSize, boundary: BoundaryCondition, x: f32, y: f32) -> f32 {
    let x0 = x.floor();
    let y0 = y.floor();
    let u = x - x0;
    let v = y - y0;
    let (xi, yi) = (x0 as i64, y0 as i64);

    let sample = |sx: i64, sy: i64| -> f32 {
        boundary
            .resolve(size, sx, sy)
            .map(|(cx, cy)| field[size.index(cx, cy)])
            .unwrap_or(0.0)
    };

    let s00 = sample(xi, yi);
    let s10 = sample(xi + 1, yi);
    let s01 = sample(xi, yi + 1);
    let s11 = sample(xi + 1, yi + 1);

    let top = s00 + u * (s10 - s00);
    let bottom = s01 + u * (s11 - s01);
    top + v * (bottom - top)
}

/// Writes the next sediment generation by tracing each cell backwards along
/// the velocity field for one tick.
pub(crate) fn advect_sediment(
    size: GridSize,
    velocity: &[Vec2],
    sediment_in: &[f32],
    sediment_out: &mut [f32],
    config: &SimulationConfig,
) {
    if size.is_empty() {
        return;
    }
    // Velocity is in world units; convert the trace to cells.
    let scale = Vec2::new(
        config.time_step / config.meters_per_x,
        config.time_step / config.meters_per_y,
    );

    sediment_out
        .par_chunks_mut(size.width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, out) in row.iter_mut().enumerate() {
                let source = Vec2::new(x as f32, y as f32) - velocity[size.index(x, y)] * scale;
                *out = sample_bilinear(sediment_in, size, config.boundary, source.x, source.y).max(0.0);
            }
        });
}
