//! Water transport: integrate net flux into depth and derive velocity.

use glam::Vec2;
use rayon::prelude::*;

use super::SimulationConfig;
use crate::grid::{Direction, Flux, GridSize};

/// Flow entering `(x, y)` from each neighbor, indexed by the direction of
/// that neighbor. Pipes leaving a closed grid carry nothing.
#[inline]
pub(crate) fn inflow_at(size: GridSize, flux: &[Flux], x: usize, y: usize, config: &SimulationConfig) -> Flux {
    let mut inflow = [0.0; 4];
    for dir in Direction::ALL {
        if let Some((nx, ny)) = config.boundary.neighbor(size, x, y, dir) {
            inflow[dir.index()] = flux[size.index(nx, ny)][dir.opposite().index()];
        }
    }
    inflow
}

/// Net flow through the cell along x and y, averaged over both faces.
#[inline]
pub fn net_flow(inflow: &Flux, outflow: &Flux) -> Vec2 {
    let up = Direction::Up.index();
    let left = Direction::Left.index();
    let right = Direction::Right.index();
    let down = Direction::Down.index();

    Vec2::new(
        0.5 * ((inflow[left] - outflow[left]) + (outflow[right] - inflow[right])),
        0.5 * ((inflow[up] - outflow[up]) + (outflow[down] - inflow[down])),
    )
}

/// Writes the next water generation and the velocity field.
///
/// The velocity divides the net flow by the perpendicular pipe length and the
/// mean depth over the tick (new depth minus half the change). A dry mean
/// depth gives zero velocity.
pub(crate) fn transport_water(
    size: GridSize,
    flux: &[Flux],
    water_in: &[f32],
    water_out: &mut [f32],
    velocity: &mut [Vec2],
    config: &SimulationConfig,
) {
    if size.is_empty() {
        return;
    }
    let cell_area = config.cell_area();

    water_out
        .par_chunks_mut(size.width)
        .zip(velocity.par_chunks_mut(size.width))
        .enumerate()
        .for_each(|(y, (water_row, velocity_row))| {
            for x in 0..size.width {
                let i = size.index(x, y);
                let outflow = flux[i];
                let inflow = inflow_at(size, flux, x, y, config);

                let volume_delta = (inflow.iter().sum::<f32>() - outflow.iter().sum::<f32>()) * config.time_step;
                let water_delta = volume_delta / cell_area;
                let level = (water_in[i] + water_delta).max(0.0);
                water_row[x] = level;

                let mean_depth = level - 0.5 * water_delta;
                velocity_row[x] = if mean_depth > 0.0 {
                    let net = net_flow(&inflow, &outflow);
                    Vec2::new(
                        net.x / (config.meters_per_y * mean_depth),
                        net.y / (config.meters_per_x * mean_depth),
                    )
                } else {
                    Vec2::ZERO
                };
            }
        });
}
