//! Terrain storage consumed by the erosion solver.
//!
//! The solver never owns elevation data. It reads and writes heights through
//! [`TerrainModel`], so a caller can back the terrain with a flat height map,
//! a rock/soil stack, or its own storage.

mod domes;
mod field;
mod model;

pub use domes::{generate_domes, DomeConfig};
pub use field::{HeightMap, LayeredTerrain, TerrainError};
pub use model::TerrainModel;
