//! Pipeflow CLI - hydraulic erosion over synthetic terrain.
//!
//! Generates a seeded dome field, rains on it and reports how much material
//! the water moved.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use pipeflow::{
    generate_domes, BoundaryCondition, Coefficient, Coefficients, ConfigError, DomeConfig, EpisodeConfig,
    EpisodeError, EpisodeReport, ErosionLimit, LayeredTerrain, RainSource, RainfallEpisode, Simulation,
    SimulationConfig, TerrainError, TerrainModel,
};

/// Virtual-pipe hydraulic erosion simulator.
#[derive(Parser)]
#[command(name = "pipeflow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run rainfall episodes over generated terrain.
    Run(RunArgs),
    /// Print the default run configuration as JSON.
    Config,
}

#[derive(clap::Args)]
struct RunArgs {
    /// JSON run configuration. Flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid columns.
    #[arg(long)]
    width: Option<usize>,

    /// Grid rows.
    #[arg(long)]
    height: Option<usize>,

    /// Seed for terrain and rain.
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of rainfall episodes to run back to back.
    #[arg(short, long)]
    episodes: Option<usize>,

    /// Tick cap per episode.
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Seconds per tick.
    #[arg(long)]
    time_step: Option<f32>,

    /// Distance between cell centers, applied to both axes.
    #[arg(long)]
    spacing: Option<f32>,

    /// Carry capacity coefficient (kC).
    #[arg(long)]
    carry_capacity: Option<f32>,

    /// Deposition coefficient (kD).
    #[arg(long)]
    deposition: Option<f32>,

    /// Erosion coefficient (kE).
    #[arg(long)]
    erosion: Option<f32>,

    /// Evaporation rate (kEvap).
    #[arg(long)]
    evaporation: Option<f32>,

    /// Lower bound on tilt when computing carry capacity.
    #[arg(long)]
    min_tilt: Option<f32>,

    /// Grid edge handling.
    #[arg(long)]
    boundary: Option<BoundaryArg>,

    /// How far erosion may dig.
    #[arg(long)]
    erosion_limit: Option<LimitArg>,

    /// Put an erodible soil layer of this depth over the generated rock.
    #[arg(long)]
    soil_depth: Option<f32>,

    /// Rain as this many unit drops at random cells instead of jittered
    /// uniform rain.
    #[arg(long)]
    drops: Option<usize>,

    /// Write a JSON report of every episode to this path.
    #[arg(short, long)]
    report: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum BoundaryArg {
    Closed,
    Periodic,
}

#[derive(Clone, Copy, ValueEnum)]
enum LimitArg {
    Unbounded,
    Clamp,
}

#[derive(Error, Debug)]
enum CliError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Terrain error: {0}")]
    Terrain(#[from] TerrainError),
    #[error("Episode failed: {0}")]
    Episode(#[from] EpisodeError),
}

/// Everything a run needs, loadable from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct RunConfig {
    width: usize,
    height: usize,
    episodes: usize,
    /// Soil depth over the generated rock. Without it the whole height field
    /// is erodible.
    soil_depth: Option<f32>,
    terrain: DomeConfig,
    simulation: SimulationConfig,
    coefficients: Coefficients,
    episode: EpisodeConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            episodes: 1,
            soil_depth: None,
            terrain: DomeConfig::default(),
            simulation: SimulationConfig::default(),
            coefficients: Coefficients::default(),
            episode: EpisodeConfig::default(),
        }
    }
}

#[derive(Serialize)]
struct RunReport<'a> {
    config: &'a RunConfig,
    initial_height_sum: f64,
    final_height_sum: f64,
    episodes: Vec<EpisodeReport>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => run(args),
        Commands::Config => print_default_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_default_config() -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(&RunConfig::default())?);
    Ok(())
}

fn load_config(path: &Path) -> Result<RunConfig, CliError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

impl RunArgs {
    /// Applies command-line overrides on top of `config`.
    fn apply(&self, config: &mut RunConfig) {
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(seed) = self.seed {
            config.terrain.seed = seed;
            config.episode.seed = seed;
        }
        if let Some(episodes) = self.episodes {
            config.episodes = episodes;
        }
        if let Some(max_ticks) = self.max_ticks {
            config.episode.max_ticks = max_ticks;
        }
        if let Some(time_step) = self.time_step {
            config.simulation.time_step = time_step;
        }
        if let Some(spacing) = self.spacing {
            config.simulation.meters_per_x = spacing;
            config.simulation.meters_per_y = spacing;
        }
        if let Some(min_tilt) = self.min_tilt {
            config.simulation.min_tilt = min_tilt;
        }
        if let Some(boundary) = self.boundary {
            config.simulation.boundary = match boundary {
                BoundaryArg::Closed => BoundaryCondition::Closed,
                BoundaryArg::Periodic => BoundaryCondition::Periodic,
            };
        }
        if let Some(limit) = self.erosion_limit {
            config.simulation.erosion_limit = match limit {
                LimitArg::Unbounded => ErosionLimit::Unbounded,
                LimitArg::Clamp => ErosionLimit::ClampToErodible,
            };
        }

        let coefficients = &mut config.coefficients;
        for (value, slot) in [
            (self.carry_capacity, &mut coefficients.carry_capacity),
            (self.deposition, &mut coefficients.deposition),
            (self.erosion, &mut coefficients.erosion),
            (self.evaporation, &mut coefficients.evaporation),
        ] {
            if let Some(v) = value {
                *slot = Coefficient::Uniform(v);
            }
        }

        if self.soil_depth.is_some() {
            config.soil_depth = self.soil_depth;
        }
        if let Some(count) = self.drops {
            config.episode.rain = RainSource::Drops { count, depth: 1.0 };
        }
    }
}

fn run(args: RunArgs) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => RunConfig::default(),
    };
    args.apply(&mut config);

    println!("Pipeflow - Hydraulic Erosion");
    println!("============================");
    println!("Grid: {}x{}", config.width, config.height);
    println!("Seed: {}", config.terrain.seed);
    println!("Episodes: {}", config.episodes);

    let start = Instant::now();
    let rock = generate_domes(config.width, config.height, &config.terrain);

    let (initial_height_sum, final_height_sum, episodes) = match config.soil_depth {
        Some(soil_depth) => {
            println!("Terrain: layered, soil depth {}", soil_depth);
            let terrain = LayeredTerrain::from_rock(config.width, config.height, rock.into_vec(), soil_depth)?;
            simulate(terrain, &config)?
        }
        None => {
            println!("Terrain: single layer");
            simulate(rock, &config)?
        }
    };

    println!("\nCompleted in {:.2?}", start.elapsed());
    println!(
        "Total height change: {:+.6} ({:.4} -> {:.4})",
        final_height_sum - initial_height_sum,
        initial_height_sum,
        final_height_sum
    );

    if let Some(path) = &args.report {
        let report = RunReport {
            config: &config,
            initial_height_sum,
            final_height_sum,
            episodes,
        };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &report)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn simulate<T: TerrainModel>(terrain: T, config: &RunConfig) -> Result<(f64, f64, Vec<EpisodeReport>), CliError> {
    let initial = terrain.total_height();
    let (min_h, max_h) = terrain.height_range();
    println!("Initial height range: [{:.4}, {:.4}]", min_h, max_h);

    let mut sim = Simulation::new(terrain, config.simulation.clone(), config.coefficients.clone())?;
    let mut runner = RainfallEpisode::new(config.episode.clone())?;

    println!("\nRunning rainfall episodes...");
    let reports = runner.run_many(
        &mut sim,
        config.episodes,
        |i, total| println!("  [{}/{}] Raining", i + 1, total),
        |report, total| {
            println!(
                "  [{}/{}] {} after {} ticks: sediment settled {:.4}, water left {:.4}",
                report.episode + 1,
                total,
                if report.drained { "Drained" } else { "Stopped" },
                report.ticks,
                report.sediment_committed,
                report.remaining_water,
            )
        },
    )?;

    let terrain = sim.terrain();
    let (min_h, max_h) = terrain.height_range();
    println!("Final height range: [{:.4}, {:.4}]", min_h, max_h);
    Ok((initial, terrain.total_height(), reports))
}
