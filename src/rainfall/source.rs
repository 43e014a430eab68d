use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::erosion::{require_non_negative, require_positive, ConfigError, SimulationConfig};
use crate::grid::GridState;

/// How water is added at the start of a rainfall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RainSource {
    /// The same depth on every cell.
    Uniform { depth: f32 },
    /// A depth drawn per cell from `center * (1 ± spread)`.
    Jittered { center: f32, spread: f32 },
    /// `count` drops of `depth` at random cells. A cell can be hit twice.
    Drops { count: usize, depth: f32 },
    /// `depth` on every cell whose center lies within `radius` of `(x, y)`.
    /// Position and radius are in world units, not cells.
    Brush { x: f32, y: f32, radius: f32, depth: f32 },
}

impl Default for RainSource {
    fn default() -> Self {
        RainSource::Jittered {
            center: 1.0,
            spread: 0.05,
        }
    }
}

impl RainSource {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            RainSource::Uniform { depth } => require_non_negative("depth", depth),
            RainSource::Jittered { center, spread } => {
                require_non_negative("center", center)?;
                if !(0.0..=1.0).contains(&spread) {
                    return Err(ConfigError::OutOfRange {
                        name: "spread",
                        value: spread,
                        min: 0.0,
                        max: 1.0,
                    });
                }
                Ok(())
            }
            RainSource::Drops { depth, .. } => require_non_negative("depth", depth),
            RainSource::Brush { x, y, radius, depth } => {
                for (name, value) in [("x", x), ("y", y)] {
                    if !value.is_finite() {
                        return Err(ConfigError::NotFinite { name, value });
                    }
                }
                require_positive("radius", radius)?;
                require_non_negative("depth", depth)
            }
        }
    }

    /// Adds this rain to the current water generation of `state` and
    /// returns the total depth added.
    pub fn apply<R: Rng + ?Sized>(&self, state: &mut GridState, config: &SimulationConfig, rng: &mut R) -> f64 {
        let size = state.size();
        if size.is_empty() {
            return 0.0;
        }

        match *self {
            RainSource::Uniform { depth } => {
                state.water_mut().iter_mut().for_each(|w| *w += depth);
                depth as f64 * size.cell_count() as f64
            }
            RainSource::Jittered { center, spread } => {
                let lo = center * (1.0 - spread);
                let hi = center * (1.0 + spread);
                let mut added = 0.0;
                for w in state.water_mut() {
                    let depth = rng.random_range(lo..=hi);
                    *w += depth;
                    added += depth as f64;
                }
                added
            }
            RainSource::Drops { count, depth } => {
                for _ in 0..count {
                    let x = rng.random_range(0..size.width);
                    let y = rng.random_range(0..size.height);
                    state.add_water(x, y, depth);
                }
                count as f64 * depth as f64
            }
            RainSource::Brush { x, y, radius, depth } => {
                let r2 = radius * radius;
                let mut added = 0.0;
                for (cx, cy) in size.cells() {
                    let dx = cx as f32 * config.meters_per_x - x;
                    let dy = cy as f32 * config.meters_per_y - y;
                    if dx * dx + dy * dy <= r2 {
                        state.add_water(cx, cy, depth);
                        added += depth as f64;
                    }
                }
                added
            }
        }
    }
}
