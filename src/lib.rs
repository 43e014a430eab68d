//! Virtual-pipe hydraulic erosion on height-field terrain.
//!
//! Water sits on a regular grid of terrain cells and flows to its four
//! neighbors through virtual pipes. Moving water picks up sediment, carries
//! it downstream and drops it where it slows, reshaping the terrain over the
//! course of a rainfall.
//!
//! The solver never owns elevation: callers provide it through
//! [`terrain::TerrainModel`]. [`erosion::Simulation`] runs the per-tick
//! stages and [`rainfall::RainfallEpisode`] drives whole rainfalls.

pub mod diagnostics;
pub mod erosion;
pub mod grid;
pub mod rainfall;
pub mod terrain;

pub use diagnostics::{FieldStats, History, Recorder, TickRecord};
pub use erosion::{Coefficient, Coefficients, ConfigError, ErosionLimit, Simulation, SimulationConfig, Stage};
pub use grid::{BoundaryCondition, GridSize, GridState};
pub use rainfall::{EpisodeConfig, EpisodeError, EpisodeReport, RainSource, RainfallEpisode};
pub use terrain::{generate_domes, DomeConfig, HeightMap, LayeredTerrain, TerrainError, TerrainModel};
