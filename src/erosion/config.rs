//! Solver configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{BoundaryCondition, Direction};

/// Errors raised by configuration validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be finite and positive, got {value}")]
    NotPositive { name: &'static str, value: f32 },
    #[error("{name} must be finite and non-negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f32 },
    #[error("{name} must lie in [{min}, {max}), got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
    #[error("coefficient field '{name}' has {actual} cells, grid has {expected}")]
    FieldSize {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
}

pub(crate) fn require_positive(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { name, value })
    }
}

pub(crate) fn require_non_negative(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { name, value })
    }
}

/// How much terrain a single erosion event may remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErosionLimit {
    /// Erosion is driven by the capacity deficit alone and may carve below
    /// any layer boundary.
    Unbounded,
    /// Erosion never removes more than
    /// [`crate::terrain::TerrainModel::erodible_depth`] at the cell.
    ClampToErodible,
}

impl Default for ErosionLimit {
    fn default() -> Self {
        Self::Unbounded
    }
}

/// Numeric knobs of the virtual-pipe solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds per tick. Smaller is more accurate and more stable.
    pub time_step: f32,
    /// Gravitational acceleration.
    pub gravity: f32,
    /// Cross-sectional area of a virtual pipe.
    pub pipe_area: f32,
    /// Distance between cell centers along x (pipe length for left/right pipes).
    pub meters_per_x: f32,
    /// Distance between cell centers along y (pipe length for up/down pipes).
    pub meters_per_y: f32,
    /// Lower bound applied to tilt when computing carry capacity (0-1).
    pub min_tilt: f32,
    /// Edge handling for flow, inflow and advection sampling.
    pub boundary: BoundaryCondition,
    /// Floor policy for erosion.
    pub erosion_limit: ErosionLimit,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            time_step: 0.0125,
            gravity: 9.8,
            pipe_area: 1.0,
            meters_per_x: 1.0,
            meters_per_y: 1.0,
            min_tilt: 0.0,
            boundary: BoundaryCondition::default(),
            erosion_limit: ErosionLimit::default(),
        }
    }
}

impl SimulationConfig {
    /// Small time step for short, closely inspected runs.
    pub fn fine() -> Self {
        Self {
            time_step: 1.0e-3,
            ..Default::default()
        }
    }

    /// Default configuration with square cells of the given spacing.
    pub fn with_spacing(meters_per_cell: f32) -> Self {
        Self {
            meters_per_x: meters_per_cell,
            meters_per_y: meters_per_cell,
            ..Default::default()
        }
    }

    /// Checks every knob for values the solver cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("time_step", self.time_step)?;
        if !self.gravity.is_finite() {
            return Err(ConfigError::NotFinite {
                name: "gravity",
                value: self.gravity,
            });
        }
        require_positive("pipe_area", self.pipe_area)?;
        require_positive("meters_per_x", self.meters_per_x)?;
        require_positive("meters_per_y", self.meters_per_y)?;
        if !(self.min_tilt >= 0.0 && self.min_tilt < 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "min_tilt",
                value: self.min_tilt,
                min: 0.0,
                max: 1.0,
            });
        }
        Ok(())
    }

    /// Length of the pipe leaving a cell in `dir`.
    #[inline]
    pub fn pipe_length(&self, dir: Direction) -> f32 {
        if dir.is_horizontal() {
            self.meters_per_x
        } else {
            self.meters_per_y
        }
    }

    /// Horizontal area of one cell; converts volume to depth.
    #[inline]
    pub fn cell_area(&self) -> f32 {
        self.meters_per_x * self.meters_per_y
    }
}
