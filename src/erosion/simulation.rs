//! Tick orchestration over a terrain and its grid state.

use tracing::{debug, debug_span};

use super::{advection, evaporation, flow, sediment, water};
use super::{Coefficients, ConfigError, SimulationConfig};
use crate::diagnostics::{NullRecorder, Recorder, TickRecord};
use crate::grid::GridState;
use crate::terrain::TerrainModel;

/// One of the five operations that make up a tick, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Outflow per pipe and surface tilt.
    Flow,
    /// New water depth and velocity from the flux field.
    WaterTransport,
    /// Exchange between suspended sediment and terrain.
    ErosionDeposition,
    /// Sediment carried along the velocity field.
    Advection,
    /// Water depth lost to the atmosphere.
    Evaporation,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Flow,
        Stage::WaterTransport,
        Stage::ErosionDeposition,
        Stage::Advection,
        Stage::Evaporation,
    ];

    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Flow => "flow",
            Stage::WaterTransport => "water_transport",
            Stage::ErosionDeposition => "erosion_deposition",
            Stage::Advection => "advection",
            Stage::Evaporation => "evaporation",
        }
    }
}

/// Hydraulic erosion simulation over a caller-supplied terrain.
///
/// The simulation owns the water, sediment, flux, velocity and tilt fields.
/// Terrain height is read and written only through [`TerrainModel`], so the
/// terrain can be any storage that implements the trait.
///
/// A rainfall is driven by adding water, calling [`Simulation::tick`] until
/// the water has drained or evaporated, then calling
/// [`Simulation::terminate_rainfall`] to settle the remaining sediment.
#[derive(Debug, Clone)]
pub struct Simulation<T: TerrainModel> {
    terrain: T,
    state: GridState,
    config: SimulationConfig,
    coefficients: Coefficients,
    height_delta: Vec<f32>,
    ticks: u64,
}

impl<T: TerrainModel> Simulation<T> {
    /// Creates a dry simulation sized to `terrain`.
    pub fn new(terrain: T, config: SimulationConfig, coefficients: Coefficients) -> Result<Self, ConfigError> {
        let size = terrain.size();
        config.validate()?;
        coefficients.validate(size.cell_count())?;
        Ok(Self {
            state: GridState::new(size.width, size.height),
            height_delta: vec![0.0; size.cell_count()],
            terrain,
            config,
            coefficients,
            ticks: 0,
        })
    }

    pub fn terrain(&self) -> &T {
        &self.terrain
    }

    /// Mutable terrain access between ticks. Resizing the terrain is not
    /// supported.
    pub fn terrain_mut(&mut self) -> &mut T {
        &mut self.terrain
    }

    pub fn into_terrain(self) -> T {
        self.terrain
    }

    pub fn state(&self) -> &GridState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut GridState {
        &mut self.state
    }

    /// Current water generation, for seeding rain.
    pub fn water_mut(&mut self) -> &mut [f32] {
        self.state.water_mut()
    }

    /// Current sediment generation.
    pub fn sediment_mut(&mut self) -> &mut [f32] {
        self.state.sediment_mut()
    }

    /// Overwrites the water depth of every cell.
    pub fn set_water(&mut self, water: &[f32]) -> Result<(), ConfigError> {
        let expected = self.state.size().cell_count();
        if water.len() != expected {
            return Err(ConfigError::FieldSize {
                name: "water",
                expected,
                actual: water.len(),
            });
        }
        self.state.set_water(water);
        Ok(())
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }

    /// Number of ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Water depth at `(x, y)`.
    pub fn water(&self, x: usize, y: usize) -> f32 {
        self.state.water_at(x, y)
    }

    /// Adds water at `(x, y)` and returns the new, non-negative depth.
    pub fn add_water(&mut self, x: usize, y: usize, delta: f32) -> f32 {
        self.state.add_water(x, y, delta)
    }

    pub fn set_time_step(&mut self, time_step: f32) -> Result<(), ConfigError> {
        let config = SimulationConfig {
            time_step,
            ..self.config.clone()
        };
        config.validate()?;
        self.config = config;
        Ok(())
    }

    pub fn set_coefficients(&mut self, coefficients: Coefficients) -> Result<(), ConfigError> {
        coefficients.validate(self.state.size().cell_count())?;
        self.coefficients = coefficients;
        Ok(())
    }

    /// Updates flux and tilt from the current height and water.
    pub fn compute_flow_and_tilt(&mut self) {
        flow::compute_flow_and_tilt(
            &self.terrain,
            self.state.water.current(),
            &mut self.state.flux,
            &mut self.state.tilt,
            &self.config,
        );
    }

    /// Moves water along the flux field and derives the velocity field.
    pub fn transport_water(&mut self) {
        let size = self.state.size();
        let (water_in, water_out) = self.state.water.split_mut();
        water::transport_water(
            size,
            &self.state.flux,
            water_in,
            water_out,
            &mut self.state.velocity,
            &self.config,
        );
        self.state.water.step();
    }

    /// Exchanges sediment with the terrain according to carry capacity.
    pub fn erode_and_deposit(&mut self) {
        let (sediment_in, sediment_out) = self.state.sediment.split_mut();
        sediment::erode_and_deposit(
            &mut self.terrain,
            &self.state.velocity,
            &self.state.tilt,
            &self.coefficients,
            sediment_in,
            sediment_out,
            &mut self.height_delta,
            &self.config,
        );
        self.state.sediment.step();
    }

    /// Carries suspended sediment along the velocity field.
    pub fn advect_sediment(&mut self) {
        let size = self.state.size();
        let (sediment_in, sediment_out) = self.state.sediment.split_mut();
        advection::advect_sediment(size, &self.state.velocity, sediment_in, sediment_out, &self.config);
        self.state.sediment.step();
    }

    pub fn evaporate(&mut self) {
        evaporation::evaporate(
            self.state.water.current_mut(),
            &self.coefficients.evaporation,
            self.config.time_step,
        );
    }

    /// Runs a single stage.
    pub fn run_stage(&mut self, stage: Stage) {
        debug!(stage = stage.name(), "running stage");
        match stage {
            Stage::Flow => self.compute_flow_and_tilt(),
            Stage::WaterTransport => self.transport_water(),
            Stage::ErosionDeposition => self.erode_and_deposit(),
            Stage::Advection => self.advect_sediment(),
            Stage::Evaporation => self.evaporate(),
        }
    }

    /// Runs every stage once.
    pub fn tick(&mut self) {
        self.tick_recorded(&mut NullRecorder);
    }

    /// Runs every stage once, then offers statistics to `recorder` if it
    /// wants this tick. Returns the captured record.
    pub fn tick_recorded(&mut self, recorder: &mut dyn Recorder) -> Option<TickRecord> {
        let _span = debug_span!("tick", tick = self.ticks).entered();
        for stage in Stage::ALL {
            self.run_stage(stage);
        }
        let tick = self.ticks;
        self.ticks += 1;

        if !recorder.wants(tick) {
            return None;
        }
        let record = TickRecord::capture(tick, &self.state);
        recorder.record(record);
        Some(record)
    }

    /// Ends the current rainfall: every cell's suspended sediment is added to
    /// its height and the sediment field is cleared. Flux, velocity and tilt
    /// are reset so the next rainfall starts from still water. Returns the
    /// total amount committed.
    pub fn terminate_rainfall(&mut self) -> f64 {
        let size = self.state.size();
        let mut committed = 0.0f64;
        for (i, s) in self.state.sediment.current_mut().iter_mut().enumerate() {
            if *s != 0.0 {
                let (x, y) = size.coords(i);
                self.terrain.add_height(x, y, *s);
                committed += *s as f64;
            }
            *s = 0.0;
        }
        self.state.clear_motion();
        debug!(committed, "rainfall terminated");
        committed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::History;
    use crate::erosion::ErosionLimit;
    use crate::terrain::{HeightMap, LayeredTerrain};

    fn slope(width: usize, height: usize) -> HeightMap {
        let heights = (0..width * height)
            .map(|i| (width - 1 - i % width) as f32 * 0.5)
            .collect();
        HeightMap::from_vec(width, height, heights).unwrap()
    }

    #[test]
    fn test_stage_names() {
        assert_eq!(Stage::Flow.name(), "flow");
        assert_eq!(Stage::ALL.len(), 5);
        assert_eq!(Stage::ALL[4], Stage::Evaporation);
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = SimulationConfig {
            time_step: 0.0,
            ..Default::default()
        };
        assert!(Simulation::new(HeightMap::new(2, 2), config, Coefficients::default()).is_err());
    }

    #[test]
    fn test_new_rejects_mismatched_field() {
        let mut coefficients = Coefficients::default();
        coefficients.erosion = vec![0.1; 3].into();
        assert!(Simulation::new(HeightMap::new(2, 2), SimulationConfig::default(), coefficients).is_err());
    }

    #[test]
    fn test_add_water_clamps() {
        let mut sim = Simulation::new(HeightMap::new(2, 2), SimulationConfig::default(), Coefficients::default()).unwrap();
        assert_eq!(sim.add_water(1, 1, 0.5), 0.5);
        assert_eq!(sim.add_water(1, 1, -2.0), 0.0);
        assert_eq!(sim.water(1, 1), 0.0);
    }

    #[test]
    fn test_dry_tick_changes_nothing() {
        let terrain = slope(4, 3);
        let before = terrain.heights().to_vec();
        let mut sim = Simulation::new(terrain, SimulationConfig::default(), Coefficients::default()).unwrap();
        for _ in 0..5 {
            sim.tick();
        }
        assert_eq!(sim.terrain().heights(), &before[..]);
        assert_eq!(sim.state().total_water(), 0.0);
        assert_eq!(sim.ticks(), 5);
    }

    #[test]
    fn test_tick_keeps_fields_non_negative() {
        let mut sim = Simulation::new(slope(6, 4), SimulationConfig::default(), Coefficients::default()).unwrap();
        for y in 0..4 {
            for x in 0..6 {
                sim.add_water(x, y, 0.3);
            }
        }
        for _ in 0..40 {
            sim.tick();
            assert!(sim.state().water().iter().all(|&w| w >= 0.0 && w.is_finite()));
            assert!(sim.state().sediment().iter().all(|&s| s >= 0.0 && s.is_finite()));
            assert!(sim.state().flux().iter().flatten().all(|&f| f >= 0.0));
        }
        assert!(sim.state().total_sediment() > 0.0);
    }

    #[test]
    fn test_terminate_commits_sediment() {
        let mut sim = Simulation::new(HeightMap::new(2, 1), SimulationConfig::default(), Coefficients::default()).unwrap();
        sim.sediment_mut().copy_from_slice(&[0.25, 0.5]);
        let committed = sim.terminate_rainfall();
        assert_eq!(committed, 0.75);
        assert_eq!(sim.terrain().heights(), &[0.25, 0.5]);
        assert_eq!(sim.state().total_sediment(), 0.0);
    }

    #[test]
    fn test_terminate_resets_flow() {
        let mut sim = Simulation::new(slope(4, 4), SimulationConfig::default(), Coefficients::default()).unwrap();
        sim.set_water(&[0.5; 16]).unwrap();
        for _ in 0..10 {
            sim.tick();
        }
        assert!(sim.state().flux().iter().flatten().any(|&f| f > 0.0));

        sim.terminate_rainfall();
        assert!(sim.state().flux().iter().flatten().all(|&f| f == 0.0));
        assert!(sim.state().velocity().iter().all(|v| *v == glam::Vec2::ZERO));
        assert!(sim.state().tilt().iter().all(|&t| t == 0.0));
    }

    #[test]
    fn test_set_water_rejects_wrong_length() {
        let mut sim = Simulation::new(slope(3, 3), SimulationConfig::default(), Coefficients::default()).unwrap();
        assert!(matches!(
            sim.set_water(&[1.0; 4]),
            Err(ConfigError::FieldSize { name: "water", expected: 9, actual: 4 })
        ));
        sim.tick();
        assert_eq!(sim.state().size().cell_count(), 9);
    }

    #[test]
    fn test_recorder_receives_strided_ticks() {
        let mut sim = Simulation::new(slope(3, 3), SimulationConfig::default(), Coefficients::default()).unwrap();
        sim.add_water(0, 1, 1.0);
        let mut history = History::new(2);
        for _ in 0..5 {
            sim.tick_recorded(&mut history);
        }
        let ticks: Vec<u64> = history.records.iter().map(|r| r.tick).collect();
        assert_eq!(ticks, vec![0, 2, 4]);
    }

    #[test]
    fn test_identical_runs_are_bitwise_equal() {
        let run = || {
            let mut sim = Simulation::new(slope(5, 5), SimulationConfig::default(), Coefficients::default()).unwrap();
            sim.add_water(0, 2, 2.0);
            sim.add_water(1, 4, 1.0);
            for _ in 0..20 {
                sim.tick();
            }
            sim.terminate_rainfall();
            sim.into_terrain().into_vec()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_layered_terrain_keeps_rock_under_clamp() {
        let rock = vec![3.0, 2.0, 1.0, 0.0];
        let terrain = LayeredTerrain::from_rock(4, 1, rock.clone(), 0.001).unwrap();
        let config = SimulationConfig {
            erosion_limit: ErosionLimit::ClampToErodible,
            ..Default::default()
        };
        let mut sim = Simulation::new(terrain, config, Coefficients::uniform(1.0, 0.01, 0.5, 0.0)).unwrap();
        sim.add_water(0, 0, 1.0);
        for _ in 0..30 {
            sim.tick();
        }
        assert_eq!(sim.terrain().rock(), &rock[..]);
        assert!(sim.terrain().soil().iter().all(|&s| s >= -1e-6));
    }

    #[test]
    fn test_empty_grid_ticks() {
        let mut sim = Simulation::new(HeightMap::new(0, 0), SimulationConfig::default(), Coefficients::default()).unwrap();
        sim.tick();
        assert_eq!(sim.terminate_rainfall(), 0.0);
    }
}
