//! Virtual-pipe hydraulic erosion.
//!
//! Water flows between neighboring cells through virtual pipes driven by
//! differences in total head. Flowing water picks up sediment where it can
//! carry more than it holds and drops it elsewhere. Each stage lives in its
//! own module as a plain function over the grid fields;
//! [`Simulation`] runs them in order once per tick.

mod advection;
mod coefficients;
mod config;
mod evaporation;
mod flow;
mod sediment;
mod simulation;
mod water;

pub use advection::sample_bilinear;
pub use coefficients::{Coefficient, Coefficients};
pub use config::{ConfigError, ErosionLimit, SimulationConfig};
pub use flow::{scaling_factor, tilt_from_slopes};
pub use sediment::{carry_capacity, sediment_exchange};
pub use simulation::{Simulation, Stage};
pub use water::net_flow;

pub(crate) use config::{require_non_negative, require_positive};
