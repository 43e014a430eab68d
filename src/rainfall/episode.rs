//! A single rainfall driven from first drop to termination.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, info_span};

use super::RainSource;
use crate::diagnostics::{History, TickRecord};
use crate::erosion::{require_non_negative, ConfigError, Simulation};
use crate::terrain::TerrainModel;

/// Errors that can occur while running an episode.
#[derive(Error, Debug)]
pub enum EpisodeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{field} became non-finite at tick {tick}")]
    NonFinite { field: &'static str, tick: u64 },
}

/// Parameters of a rainfall episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    pub rain: RainSource,
    /// Upper bound on ticks before the rainfall is terminated regardless of
    /// remaining water.
    pub max_ticks: u64,
    /// Total water depth at or below which the grid counts as dry.
    pub dry_threshold: f32,
    /// Seed for the rain source.
    pub seed: u64,
    /// Ticks between diagnostics records. 0 is treated as 1.
    pub record_stride: u64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self {
            rain: RainSource::default(),
            max_ticks: 2048,
            dry_threshold: 1.0e-3,
            seed: 0,
            record_stride: 16,
        }
    }
}

impl EpisodeConfig {
    /// Creates the default configuration with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.rain.validate()?;
        require_non_negative("dry_threshold", self.dry_threshold)
    }
}

/// Outcome of one episode.
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeReport {
    /// Zero-based index among the episodes run by the same runner.
    pub episode: usize,
    pub ticks: u64,
    pub rain_added: f64,
    /// Water still on the grid when the episode was terminated.
    pub remaining_water: f64,
    /// Suspended sediment settled onto the terrain at termination.
    pub sediment_committed: f64,
    /// Whether the water fell below the dry threshold before `max_ticks`.
    pub drained: bool,
    pub height_min: f32,
    pub height_max: f32,
    pub history: Vec<TickRecord>,
}

/// Runs rainfall episodes against a [`Simulation`].
///
/// The runner owns the random stream, so consecutive episodes draw
/// different rain from the same seed.
pub struct RainfallEpisode {
    config: EpisodeConfig,
    rng: ChaCha8Rng,
    completed: usize,
}

impl RainfallEpisode {
    pub fn new(config: EpisodeConfig) -> Result<Self, EpisodeError> {
        config.validate()?;
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            completed: 0,
        })
    }

    pub fn config(&self) -> &EpisodeConfig {
        &self.config
    }

    /// Number of episodes finished so far.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Rains on `sim`, ticks until dry or out of ticks, then terminates the
    /// rainfall.
    pub fn run<T: TerrainModel>(&mut self, sim: &mut Simulation<T>) -> Result<EpisodeReport, EpisodeError> {
        let episode = self.completed;
        let _span = info_span!("episode", episode).entered();

        let config = sim.config().clone();
        let rain_added = self.config.rain.apply(sim.state_mut(), &config, &mut self.rng);
        let threshold = self.config.dry_threshold as f64;

        let mut history = History::new(self.config.record_stride);
        let mut ticks = 0;
        let mut drained = sim.state().total_water() <= threshold;
        while !drained && ticks < self.config.max_ticks {
            if let Some(record) = sim.tick_recorded(&mut history) {
                if let Some(field) = record.non_finite_field() {
                    return Err(EpisodeError::NonFinite { field, tick: record.tick });
                }
            }
            ticks += 1;
            drained = sim.state().total_water() <= threshold;
        }

        let remaining_water = sim.state().total_water();
        if !remaining_water.is_finite() {
            return Err(EpisodeError::NonFinite {
                field: "water",
                tick: sim.ticks(),
            });
        }

        let sediment_committed = sim.terminate_rainfall();
        let (height_min, height_max) = sim.terrain().height_range();
        info!(
            ticks,
            rain_added,
            remaining_water,
            sediment_committed,
            drained,
            "rainfall finished"
        );

        self.completed += 1;
        Ok(EpisodeReport {
            episode,
            ticks,
            rain_added,
            remaining_water,
            sediment_committed,
            drained,
            height_min,
            height_max,
            history: history.records,
        })
    }

    /// Runs `count` episodes back to back.
    ///
    /// `on_start` receives the episode index and total; `on_complete`
    /// receives each report and the total.
    pub fn run_many<T, F1, F2>(
        &mut self,
        sim: &mut Simulation<T>,
        count: usize,
        mut on_start: F1,
        mut on_complete: F2,
    ) -> Result<Vec<EpisodeReport>, EpisodeError>
    where
        T: TerrainModel,
        F1: FnMut(usize, usize),
        F2: FnMut(&EpisodeReport, usize),
    {
        let mut reports = Vec::with_capacity(count);
        for i in 0..count {
            on_start(i, count);
            let report = self.run(sim)?;
            on_complete(&report, count);
            reports.push(report);
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::erosion::{Coefficients, SimulationConfig};
    use crate::terrain::HeightMap;

    fn ramp(width: usize, height: usize) -> HeightMap {
        let heights = (0..width * height).map(|i| (i % width) as f32 * 0.2).collect();
        HeightMap::from_vec(width, height, heights).unwrap()
    }

    fn quick_config() -> EpisodeConfig {
        EpisodeConfig {
            rain: RainSource::Uniform { depth: 0.05 },
            max_ticks: 400,
            record_stride: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_episode_drains_and_terminates() {
        let coefficients = Coefficients::uniform(0.01, 0.01, 0.005, 1.0);
        let mut sim = Simulation::new(ramp(8, 4), SimulationConfig::default(), coefficients).unwrap();
        let mut runner = RainfallEpisode::new(quick_config()).unwrap();

        let report = runner.run(&mut sim).unwrap();
        assert!(report.drained);
        assert!(report.ticks > 0 && report.ticks < 400);
        assert!((report.rain_added - 1.6).abs() < 1e-6);
        assert_eq!(report.history.len() as u64, report.ticks);
        assert_eq!(sim.state().total_sediment(), 0.0);
        assert_eq!(runner.completed(), 1);
    }

    #[test]
    fn test_tick_cap() {
        let coefficients = Coefficients::uniform(0.01, 0.01, 0.005, 0.0);
        let mut sim = Simulation::new(ramp(4, 4), SimulationConfig::default(), coefficients).unwrap();
        let config = EpisodeConfig {
            max_ticks: 10,
            ..quick_config()
        };
        let report = RainfallEpisode::new(config).unwrap().run(&mut sim).unwrap();
        assert!(!report.drained);
        assert_eq!(report.ticks, 10);
        assert!(report.remaining_water > 0.0);
    }

    #[test]
    fn test_run_many_calls_back() {
        let coefficients = Coefficients::uniform(0.01, 0.01, 0.005, 1.0);
        let mut sim = Simulation::new(ramp(6, 3), SimulationConfig::default(), coefficients).unwrap();
        let mut runner = RainfallEpisode::new(quick_config()).unwrap();

        let mut started = Vec::new();
        let mut finished = Vec::new();
        let reports = runner
            .run_many(
                &mut sim,
                3,
                |i, total| started.push((i, total)),
                |report, _| finished.push(report.episode),
            )
            .unwrap();

        assert_eq!(reports.len(), 3);
        assert_eq!(started, vec![(0, 3), (1, 3), (2, 3)]);
        assert_eq!(finished, vec![0, 1, 2]);
    }

    #[test]
    fn test_next_episode_starts_from_still_water() {
        let coefficients = Coefficients::uniform(0.01, 0.01, 0.005, 0.0);
        let mut sim = Simulation::new(ramp(4, 4), SimulationConfig::default(), coefficients).unwrap();
        let config = EpisodeConfig {
            rain: RainSource::Uniform { depth: 0.5 },
            max_ticks: 10,
            ..quick_config()
        };
        let report = RainfallEpisode::new(config).unwrap().run(&mut sim).unwrap();
        assert!(!report.drained);

        let flux: f32 = sim.state().flux().iter().flatten().sum();
        assert_eq!(flux, 0.0);
    }

    #[test]
    fn test_non_finite_water_is_reported() {
        let mut sim = Simulation::new(ramp(3, 3), SimulationConfig::default(), Coefficients::default()).unwrap();
        sim.water_mut()[4] = f32::INFINITY;
        let result = RainfallEpisode::new(quick_config()).unwrap().run(&mut sim);
        assert!(matches!(result, Err(EpisodeError::NonFinite { field: "water", .. })));
    }

    #[test]
    fn test_rejects_invalid_rain() {
        let config = EpisodeConfig {
            rain: RainSource::Uniform { depth: f32::NAN },
            ..Default::default()
        };
        assert!(matches!(RainfallEpisode::new(config), Err(EpisodeError::Config(_))));
    }
}
