//! inkflow command-line driver.
//!
//! Runs the stable-fluids pipeline in one of three forcing modes picked
//! at startup: a procedural scenario (default), an event script, or live
//! pointer input read from stdin.

mod stdin_input;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use inkflow::engine::{NullSink, SimConfig, SimParams, Simulation, SnapshotSink};
use inkflow::export::PngSequenceSink;
use inkflow::forcing::{ForcingSource, LiveInput, Scenario, ScenarioGenerator};
use inkflow::ops::CpuOperators;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Frames run in scenario mode when `--frames` is not given.
const DEFAULT_SCENARIO_FRAMES: u64 = 1000;

/// Stable-fluids simulation driver
#[derive(Parser, Debug)]
#[command(name = "inkflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "2D stable-fluids simulation with ink forcing", long_about = None)]
struct Cli {
    /// Grid width and height in cells
    #[arg(long, num_args = 2, value_names = ["W", "H"], default_values_t = [512, 512])]
    size: Vec<usize>,

    /// Dispatch tile width and height
    #[arg(
        long,
        visible_alias = "threads",
        num_args = 2,
        value_names = ["TX", "TY"],
        default_values_t = [16, 16]
    )]
    tile: Vec<usize>,

    /// Event script; the run ends when the script is exhausted
    #[arg(long, conflicts_with = "live")]
    script: Option<PathBuf>,

    /// Procedural scenario (constant, random, alternating)
    #[arg(long, default_value = "constant")]
    scenario: Scenario,

    /// Read pointer commands from stdin
    #[arg(long)]
    live: bool,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Write PNG snapshots into this directory
    #[arg(long)]
    export: Option<PathBuf>,

    /// Frames between snapshots
    #[arg(long, default_value_t = SimConfig::DEFAULT_EXPORT_INTERVAL)]
    export_interval: u64,

    /// YAML file overriding numerical parameters
    #[arg(long)]
    params: Option<PathBuf>,

    /// Seed for the random scenario
    #[arg(long)]
    seed: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    let config = sim_config(&cli)?;
    let params = match &cli.params {
        Some(path) => SimParams::load(path)
            .with_context(|| format!("loading parameters from {}", path.display()))?,
        None => SimParams::default(),
    };

    let sink: Box<dyn SnapshotSink> = match &cli.export {
        Some(dir) => Box::new(
            PngSequenceSink::new(dir)
                .with_context(|| format!("preparing export directory {}", dir.display()))?,
        ),
        None => Box::new(NullSink),
    };

    let mut live_sender = None;
    let forcing: Option<Box<dyn ForcingSource>> = if config.script_path.is_some() {
        None
    } else if cli.live {
        let (live, sender) = LiveInput::new(config.height);
        live_sender = Some(sender);
        Some(Box::new(live))
    } else {
        let dims = config.dims();
        let generator = match cli.seed {
            Some(seed) => ScenarioGenerator::with_seed(cli.scenario, dims, seed),
            None => ScenarioGenerator::new(cli.scenario, dims),
        };
        info!(scenario = %generator.scenario(), seed = ?cli.seed, "procedural forcing");
        Some(Box::new(generator))
    };

    let mut sim = Simulation::new(
        &config,
        params,
        Box::new(CpuOperators::new()),
        forcing,
        sink,
    )
    .context("building simulation")?;

    let frame_limit = match (cli.frames, &config.script_path, cli.live) {
        (Some(n), _, _) => Some(n),
        (None, None, false) => Some(DEFAULT_SCENARIO_FRAMES),
        _ => None,
    };
    if let Some(limit) = frame_limit {
        sim = sim.with_frame_limit(limit);
    }

    if let Some(sender) = live_sender {
        let stop = sim.stop_handle();
        std::thread::Builder::new()
            .name("stdin-input".into())
            .spawn(move || stdin_input::pump(std::io::stdin().lock(), sender, stop))
            .context("starting stdin reader")?;
    }

    info!(
        grid = %config.dims(),
        forcing = sim.forcing_name(),
        frames = ?frame_limit,
        "starting run"
    );
    let summary = sim.run().context("simulation failed")?;
    info!(
        "{} frames, {} exports, {}",
        summary.frames, summary.exports, summary.reason
    );
    Ok(())
}

fn sim_config(cli: &Cli) -> Result<SimConfig> {
    let [width, height] = cli.size[..] else {
        bail!("--size takes exactly two values");
    };
    let [tile_width, tile_height] = cli.tile[..] else {
        bail!("--tile takes exactly two values");
    };
    let config = SimConfig {
        width,
        height,
        tile_width,
        tile_height,
        export_enabled: cli.export.is_some(),
        export_interval: cli.export_interval,
        script_path: cli.script.clone(),
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_setup() {
        let cli = Cli::parse_from(["inkflow"]);
        let config = sim_config(&cli).unwrap();
        assert_eq!((config.width, config.height), (512, 512));
        assert_eq!((config.tile_width, config.tile_height), (16, 16));
        assert!(!config.export_enabled);
        assert_eq!(cli.scenario, Scenario::Constant);
    }

    #[test]
    fn threads_alias_sets_tile() {
        let cli = Cli::parse_from(["inkflow", "--size", "64", "32", "--threads", "8", "4"]);
        let config = sim_config(&cli).unwrap();
        assert_eq!((config.width, config.height), (64, 32));
        assert_eq!((config.tile_width, config.tile_height), (8, 4));
    }

    #[test]
    fn export_dir_enables_export() {
        let cli = Cli::parse_from(["inkflow", "--export", "out", "--export-interval", "5"]);
        let config = sim_config(&cli).unwrap();
        assert!(config.export_enabled);
        assert_eq!(config.export_interval, 5);
    }

    #[test]
    fn script_and_live_conflict() {
        assert!(Cli::try_parse_from(["inkflow", "--script", "a.txt", "--live"]).is_err());
    }

    #[test]
    fn tiny_grid_is_rejected() {
        let cli = Cli::parse_from(["inkflow", "--size", "2", "2"]);
        assert!(sim_config(&cli).is_err());
    }
}
