//! Lattice geometry and per-cell solver state.
//!
//! Every field in the crate is a dense row-major array over a `GridSize`,
//! indexed `y * width + x`. Neighbor lookups and out-of-grid samples are
//! resolved by a `BoundaryCondition`.

mod neighbors;
mod state;
mod swap;

pub use neighbors::{BoundaryCondition, Direction, GridSize};
pub use state::{Flux, GridState};
pub use swap::SwapBuffer;
