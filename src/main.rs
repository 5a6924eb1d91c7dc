//! # Moon Ephemeris Generator Entry Point
//!
//! Generates the moon table declaration (default command) or renders debug
//! images of the moon phase. Settings come from `moon-config.toml`; a few of
//! them can be overridden on the command line.
//!
//! Logs go to stderr (`RUST_LOG` controls the level) so that the generated
//! source can be piped from stdout.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::{error, info};
use std::io::Write;
use std::path::{Path, PathBuf};

use moon_ephemeris_lib::{
    build_table,
    canvas::Canvas,
    config::{Config, DEFAULT_CONFIG_PATH},
    emit, renderer, write_artifact, EphemerisTable, GeodeticLocation, LowPrecisionEphemeris,
    Schedule,
};

#[derive(Parser)]
#[command(name = "moon-ephemeris")]
#[command(about = "Precompute moon shadow angle and elevation tables as Rust source")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the ephemeris table declaration (default)
    Generate {
        /// Output file; standard output when neither this nor the config sets one
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Number of samples
        #[arg(long)]
        count: Option<usize>,
        /// Compute samples on the current thread only
        #[arg(long)]
        sequential: bool,
    },
    /// Draw synthetic angles 0..360 as a grid of moon disks
    AngleGrid {
        /// PNG output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Draw one moon per day starting from a date
    DailyPhases {
        /// First day (RFC 3339), defaults to now
        #[arg(long)]
        start: Option<DateTime<Utc>>,
        /// PNG output file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn sample(
    schedule: &Schedule,
    observer: &GeodeticLocation,
    parallel: bool,
) -> anyhow::Result<EphemerisTable> {
    let provider = LowPrecisionEphemeris::default();

    #[cfg(feature = "parallel")]
    {
        if parallel {
            return moon_ephemeris_lib::build_table_parallel(&provider, schedule, observer)
                .context("sampling moon positions");
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        if parallel {
            log::warn!("Built without the parallel feature, sampling sequentially");
        }
    }

    build_table(&provider, schedule, observer).context("sampling moon positions")
}

fn cmd_generate(
    config: &Config,
    output: Option<PathBuf>,
    count: Option<usize>,
    sequential: bool,
) -> anyhow::Result<()> {
    let generator = &config.generator;
    let schedule = Schedule::starting_now(
        generator.period,
        count.unwrap_or(generator.count),
        generator.with_elevation,
    );
    let observer = config.observer.location();

    let table = sample(&schedule, &observer, generator.parallel && !sequential)?;
    let source = emit(&table, generator.format).context("emitting table declaration")?;

    match output.or_else(|| generator.output.clone()) {
        Some(path) => {
            write_artifact(&path, &source)
                .with_context(|| format!("writing {}", path.display()))?;
            info!(
                "Wrote {} samples starting at {} to {}",
                table.count(),
                table.start(),
                path.display()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(source.as_bytes())
                .and_then(|()| stdout.flush())
                .context("writing table to stdout")?;
        }
    }

    Ok(())
}

fn save_image(canvas: &Canvas, path: &Path) {
    match canvas.save_png(path) {
        Ok(()) => info!("Saved {}", path.display()),
        Err(e) => error!("Failed to save {}: {}", path.display(), e),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::load_from_path(&cli.config);

    match cli.command.unwrap_or(Commands::Generate {
        output: None,
        count: None,
        sequential: false,
    }) {
        Commands::Generate {
            output,
            count,
            sequential,
        } => cmd_generate(&config, output, count, sequential)?,
        Commands::AngleGrid { output } => {
            let canvas = renderer::render_angle_grid(&config.debug);
            save_image(&canvas, &output.unwrap_or_else(|| config.debug.output.clone()));
        }
        Commands::DailyPhases { start, output } => {
            let provider = LowPrecisionEphemeris::default();
            let start = start.unwrap_or_else(Utc::now);
            let canvas = renderer::render_daily_phases(&provider, start, &config.debug);
            save_image(&canvas, &output.unwrap_or_else(|| config.debug.output.clone()));
        }
    }

    Ok(())
}
