//! End-to-end rainfall episodes on generated terrain.

use pipeflow::{
    generate_domes, BoundaryCondition, Coefficients, DomeConfig, EpisodeConfig, ErosionLimit, LayeredTerrain,
    RainSource, RainfallEpisode, Simulation, SimulationConfig, TerrainModel,
};

fn domes(seed: u64) -> pipeflow::HeightMap {
    let config = DomeConfig {
        peak_height: 5.0,
        jitter: 0.1,
        ..DomeConfig::with_seed(seed)
    };
    generate_domes(24, 16, &config)
}

fn episode_config(seed: u64) -> EpisodeConfig {
    EpisodeConfig {
        max_ticks: 300,
        record_stride: 10,
        ..EpisodeConfig::with_seed(seed)
    }
}

#[test]
fn test_rainfall_reshapes_terrain_and_settles_sediment() {
    let terrain = domes(42);
    let before = terrain.heights().to_vec();
    let coefficients = Coefficients::uniform(0.02, 0.05, 0.02, 0.5);
    let mut sim = Simulation::new(terrain, SimulationConfig::default(), coefficients).unwrap();

    let report = RainfallEpisode::new(episode_config(42)).unwrap().run(&mut sim).unwrap();

    assert!(report.rain_added > 0.0);
    assert!(report.ticks > 0);
    assert_eq!(sim.state().total_sediment(), 0.0);
    assert_ne!(sim.terrain().heights(), &before[..]);
    assert!(sim.terrain().heights().iter().all(|h| h.is_finite()));
    assert!(report.history.iter().all(|r| r.water.is_finite() && r.sediment.is_finite()));
}

#[test]
fn test_runs_are_reproducible() {
    let run = || {
        let mut sim = Simulation::new(domes(7), SimulationConfig::default(), Coefficients::default()).unwrap();
        let mut runner = RainfallEpisode::new(episode_config(7)).unwrap();
        runner.run_many(&mut sim, 2, |_, _| {}, |_, _| {}).unwrap();
        sim.into_terrain().into_vec()
    };
    assert_eq!(run(), run());
}

#[test]
fn test_periodic_grid_keeps_water_in_bounds() {
    let config = SimulationConfig {
        boundary: BoundaryCondition::Periodic,
        ..Default::default()
    };
    let coefficients = Coefficients::uniform(0.01, 0.01, 0.005, 0.0);
    let mut sim = Simulation::new(domes(3), config, coefficients).unwrap();
    let episode = EpisodeConfig {
        rain: RainSource::Uniform { depth: 0.2 },
        max_ticks: 50,
        ..episode_config(3)
    };

    let report = RainfallEpisode::new(episode).unwrap().run(&mut sim).unwrap();
    let relative = (report.remaining_water - report.rain_added).abs() / report.rain_added;
    assert!(relative < 1e-3, "added {} left {}", report.rain_added, report.remaining_water);
}

#[test]
fn test_layered_terrain_never_cuts_rock() {
    let rock = domes(11).into_vec();
    let terrain = LayeredTerrain::from_rock(24, 16, rock.clone(), 0.05).unwrap();
    let config = SimulationConfig {
        erosion_limit: ErosionLimit::ClampToErodible,
        ..Default::default()
    };
    let coefficients = Coefficients::uniform(0.5, 0.05, 0.5, 0.5);
    let mut sim = Simulation::new(terrain, config, coefficients).unwrap();

    RainfallEpisode::new(episode_config(11)).unwrap().run(&mut sim).unwrap();

    let terrain = sim.terrain();
    assert_eq!(terrain.rock(), &rock[..]);
    assert!(terrain.soil().iter().all(|&s| s >= 0.0));
    for (x, y) in terrain.size().cells() {
        let i = terrain.size().index(x, y);
        assert!(terrain.get_height(x, y) >= rock[i]);
    }
}

#[test]
fn test_brush_rain_in_world_units() {
    let config = SimulationConfig::with_spacing(10.0);
    let mut sim = Simulation::new(domes(5), config, Coefficients::default()).unwrap();
    let episode = EpisodeConfig {
        rain: RainSource::Brush {
            x: 120.0,
            y: 80.0,
            radius: 30.0,
            depth: 1.0,
        },
        max_ticks: 20,
        ..episode_config(5)
    };

    let report = RainfallEpisode::new(episode).unwrap().run(&mut sim).unwrap();
    // Cells within 3 cells of (12, 8).
    assert!(report.rain_added > 20.0 && report.rain_added < 40.0);
}
