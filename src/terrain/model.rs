//! The terrain interface.

use crate::grid::GridSize;

/// Elevation storage the solver reads from and writes to.
///
/// `width`/`height` are lattice dimensions; `get_height`/`set_height` address
/// elevation at a cell. Coordinates passed by the solver are always in range.
/// `Sync` is required because flow computation reads heights from worker
/// threads.
pub trait TerrainModel: Sync {
    /// Number of columns.
    fn width(&self) -> usize;

    /// Number of rows.
    fn height(&self) -> usize;

    /// Elevation at `(x, y)`.
    fn get_height(&self, x: usize, y: usize) -> f32;

    /// Overwrites the elevation at `(x, y)`.
    fn set_height(&mut self, x: usize, y: usize, value: f32);

    /// Applies a signed elevation change. Negative deltas are erosion.
    fn add_height(&mut self, x: usize, y: usize, delta: f32) {
        let h = self.get_height(x, y);
        self.set_height(x, y, h + delta);
    }

    /// Depth of material that erosion may remove at `(x, y)`.
    ///
    /// Only consulted under [`crate::erosion::ErosionLimit::ClampToErodible`].
    fn erodible_depth(&self, _x: usize, _y: usize) -> f32 {
        f32::INFINITY
    }

    /// Lattice dimensions.
    fn size(&self) -> GridSize {
        GridSize::new(self.width(), self.height())
    }

    /// Sum of all elevations.
    fn total_height(&self) -> f64 {
        self.size()
            .cells()
            .map(|(x, y)| self.get_height(x, y) as f64)
            .sum()
    }

    /// Returns `(min, max)` elevation, or `(0.0, 0.0)` for an empty lattice.
    fn height_range(&self) -> (f32, f32) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for (x, y) in self.size().cells() {
            let h = self.get_height(x, y);
            min = min.min(h);
            max = max.max(h);
        }
        if min > max {
            (0.0, 0.0)
        } else {
            (min, max)
        }
    }
}
