//! Per-cell fields owned by the solver.

use glam::Vec2;

use super::{GridSize, SwapBuffer};

/// Outward volumetric flow rates of a cell, indexed by
/// [`crate::grid::Direction`]: up, left, right, down. Always non-negative.
pub type Flux = [f32; 4];

/// Water, sediment, flux, velocity and tilt for a W×H lattice.
///
/// Terrain height is not stored here; it lives behind
/// [`crate::terrain::TerrainModel`] so callers can back it with any storage.
#[derive(Debug, Clone)]
pub struct GridState {
    size: GridSize,
    pub(crate) water: SwapBuffer<Vec<f32>>,
    pub(crate) sediment: SwapBuffer<Vec<f32>>,
    pub(crate) flux: Vec<Flux>,
    pub(crate) velocity: Vec<Vec2>,
    pub(crate) tilt: Vec<f32>,
}

impl GridState {
    /// Creates zero-filled state for a `width`×`height` lattice.
    pub fn new(width: usize, height: usize) -> Self {
        let size = GridSize::new(width, height);
        let n = size.cell_count();
        Self {
            size,
            water: SwapBuffer::filled(vec![0.0; n]),
            sediment: SwapBuffer::filled(vec![0.0; n]),
            flux: vec![[0.0; 4]; n],
            velocity: vec![Vec2::ZERO; n],
            tilt: vec![0.0; n],
        }
    }

    /// Reallocates every field for the new dimensions and zero-fills it.
    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.width
    }

    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Current water depth per cell.
    pub fn water(&self) -> &[f32] {
        self.water.current()
    }

    /// Mutable access to the current water generation, e.g. for seeding rain.
    pub fn water_mut(&mut self) -> &mut [f32] {
        self.water.current_mut()
    }

    /// Water depth at `(x, y)`.
    pub fn water_at(&self, x: usize, y: usize) -> f32 {
        self.water.current()[self.size.index(x, y)]
    }

    /// Adds `delta` to the water depth at `(x, y)`, clamps the result to be
    /// non-negative and returns the new depth.
    pub fn add_water(&mut self, x: usize, y: usize, delta: f32) -> f32 {
        let i = self.size.index(x, y);
        let w = &mut self.water.current_mut()[i];
        *w = (*w + delta).max(0.0);
        *w
    }

    /// Overwrites the current water generation.
    ///
    /// # Panics
    ///
    /// Panics if `water` does not have one entry per cell.
    pub fn set_water(&mut self, water: &[f32]) {
        assert_eq!(water.len(), self.size.cell_count());
        self.water.current_mut().copy_from_slice(water);
    }

    /// Current suspended sediment per cell.
    pub fn sediment(&self) -> &[f32] {
        self.sediment.current()
    }

    /// Mutable access to the current sediment generation.
    pub fn sediment_mut(&mut self) -> &mut [f32] {
        self.sediment.current_mut()
    }

    /// Outward flux per cell from the most recent flow computation.
    pub fn flux(&self) -> &[Flux] {
        &self.flux
    }

    /// Velocity per cell from the most recent water transport.
    pub fn velocity(&self) -> &[Vec2] {
        &self.velocity
    }

    /// Velocity field, mutable. Mostly useful for driving advection directly.
    pub fn velocity_mut(&mut self) -> &mut [Vec2] {
        &mut self.velocity
    }

    /// Tilt per cell from the most recent flow computation.
    pub fn tilt(&self) -> &[f32] {
        &self.tilt
    }

    /// Zeroes flux, velocity and tilt so the next flow step starts from rest.
    pub(crate) fn clear_motion(&mut self) {
        self.flux.iter_mut().for_each(|f| *f = [0.0; 4]);
        self.velocity.iter_mut().for_each(|v| *v = Vec2::ZERO);
        self.tilt.iter_mut().for_each(|t| *t = 0.0);
    }

    /// Sum of all water depths.
    pub fn total_water(&self) -> f64 {
        self.water().iter().map(|&w| w as f64).sum()
    }

    /// Sum of all suspended sediment.
    pub fn total_sediment(&self) -> f64 {
        self.sediment().iter().map(|&s| s as f64).sum()
    }
}
