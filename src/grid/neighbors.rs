//! 4-neighborhood (von Neumann) lookup on a rectangular lattice.

use serde::{Deserialize, Serialize};

/// Dimensions of a W×H lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridSize {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl GridSize {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Returns the total number of cells.
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Returns true for a lattice with no cells (either dimension is zero).
    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// Flat index of the cell at `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    /// Inverse of [`GridSize::index`].
    #[inline]
    pub fn coords(&self, index: usize) -> (usize, usize) {
        (index % self.width, index / self.width)
    }

    /// Returns true if the signed coordinate lies inside the lattice.
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }

    /// Returns an iterator over all `(x, y)` coordinates in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> {
        let (w, h) = (self.width, self.height);
        (0..h).flat_map(move |y| (0..w).map(move |x| (x, y)))
    }
}

/// Direction of a virtual pipe leaving a cell.
///
/// The discriminant is the channel index used by [`crate::grid::Flux`]:
/// up, left, right, down. Opposite directions sum to 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up = 0,
    Left = 1,
    Right = 2,
    Down = 3,
}

impl Direction {
    /// All directions in channel order.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Left, Direction::Right, Direction::Down];

    /// Channel index of this direction.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The direction pointing back at this cell from its neighbor.
    #[inline]
    pub fn opposite(self) -> Direction {
        Direction::ALL[3 - self.index()]
    }

    /// Lattice offset `(dx, dy)`. `y` grows downwards.
    #[inline]
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::Up => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
        }
    }

    /// True for pipes running along the x axis.
    #[inline]
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

/// How the lattice treats pipes and samples that leave the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryCondition {
    /// A missing neighbor mirrors the center cell: there is no pressure
    /// difference across the edge, so no water enters or leaves, and samples
    /// taken outside the grid read as zero.
    Closed,
    /// Both axes wrap around (torus topology).
    Periodic,
}

impl Default for BoundaryCondition {
    fn default() -> Self {
        Self::Closed
    }
}

impl BoundaryCondition {
    /// Returns the neighbor of `(x, y)` in `dir`, or `None` if the pipe leaves
    /// a closed grid.
    #[inline]
    pub fn neighbor(self, size: GridSize, x: usize, y: usize, dir: Direction) -> Option<(usize, usize)> {
        let (dx, dy) = dir.offset();
        self.resolve(size, x as i64 + dx, y as i64 + dy)
    }

    /// Resolves an arbitrary signed lattice position to an in-grid coordinate.
    #[inline]
    pub fn resolve(self, size: GridSize, x: i64, y: i64) -> Option<(usize, usize)> {
        if size.is_empty() {
            return None;
        }
        match self {
            BoundaryCondition::Closed => {
                if size.contains(x, y) {
                    Some((x as usize, y as usize))
                } else {
                    None
                }
            }
            BoundaryCondition::Periodic => {
                let wx = x.rem_euclid(size.width as i64) as usize;
                let wy = y.rem_euclid(size.height as i64) as usize;
                Some((wx, wy))
            }
        }
    }
}
