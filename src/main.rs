//! Pointtrack CLI entry point.
//!
//! Reads tracker parameters and a frame-keyed detection stream from JSON,
//! runs the tracker over every frame in ascending order, and writes the
//! confirmed-track stream back out as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pointtrack::io;

/// Track 3D point detections across frames
#[derive(Parser, Debug)]
#[command(name = "pointtrack")]
#[command(author, version, about = "Multi-object tracking for 3D point detections")]
struct Cli {
    /// Path to the tracker parameters JSON
    parameters: PathBuf,

    /// Path to the frame-keyed detections JSON
    detections: PathBuf,

    /// Path to write the tracked objects JSON
    output: PathBuf,
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let settings = io::read_settings(&cli.parameters)
        .with_context(|| format!("failed to read parameters from {}", cli.parameters.display()))?;
    let stream = io::read_detections(&cli.detections)
        .with_context(|| format!("failed to read detections from {}", cli.detections.display()))?;

    let frames = io::run_stream(settings, &stream).context("tracking failed")?;
    io::write_tracks(&cli.output, &frames)
        .with_context(|| format!("failed to write tracks to {}", cli.output.display()))?;

    info!(
        frames = frames.len(),
        "tracking complete; results written to {}",
        cli.output.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
