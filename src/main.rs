//! Headless scenario runner.
//!
//! Loads a JSON scenario, steps it for a fixed number of ticks and logs where
//! every entity ended up.
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use log::info;
use steerage::{init_logging, Scenario};

/// Run a steering scenario without a renderer
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario file to load
    #[arg(short, long)]
    scenario: PathBuf,

    /// Number of ticks to simulate
    #[arg(short, long, default_value_t = 600)]
    ticks: u64,

    /// Seconds per tick
    #[arg(long, default_value_t = 0.05)]
    dt: f32,

    /// Override the scenario's random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    ensure!(
        args.dt.is_finite() && args.dt > 0.0,
        "--dt must be a positive number of seconds"
    );

    let mut scenario = Scenario::from_path(&args.scenario)
        .with_context(|| format!("loading {}", args.scenario.display()))?;
    if let Some(seed) = args.seed {
        scenario.seed = seed;
    }
    let mut simulation = scenario.build().context("building scenario")?;

    let taken = simulation.run(args.ticks, args.dt);
    info!(
        "ran {taken} of {} ticks ({:.2}s simulated), {} behaviours still active",
        args.ticks,
        simulation.elapsed(),
        simulation.active()
    );

    for id in simulation.world().ids() {
        let label = simulation.label(id).unwrap_or("unnamed");
        if let Some(entity) = simulation.world().get(id) {
            info!(
                "{label}: position {:.3}, velocity {:.3}",
                entity.position, entity.velocity
            );
        }
    }
    Ok(())
}
