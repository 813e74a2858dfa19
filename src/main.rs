// Runs the eye against a directory of frames, logging each pose instead of drawing it.
//
// Usage: motion_eye <frames_dir> [config.toml] [--loop]

use motion_eye::parallel_pipeline::run_async;
use motion_eye::{CaptureHandoff, EyeConfig, EyeError, EyePipeline, ImageSequenceSource, LogRenderer, NoInput, RunSummary};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::env;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // --- 1. Argument Parsing ---
    let args: Vec<String> = env::args().skip(1).collect();
    let looping = args.iter().any(|a| a == "--loop");
    let positional: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    let Some(frames_dir) = positional.first() else {
        println!("Usage: motion_eye <frames_dir> [config.toml] [--loop]");
        return ExitCode::from(2);
    };
    let config_path = positional.get(1);

    match run(frames_dir, config_path.map(|p| p.as_str()), looping).await {
        Ok(summary) => {
            info!(?summary, "Done");
            ExitCode::SUCCESS
        }
        // Running out of frames is how a recorded sequence ends.
        Err(EyeError::CaptureFailure(reason)) => {
            info!(%reason, "Capture stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Eye stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(frames_dir: &str, config_path: Option<&str>, looping: bool) -> Result<RunSummary, EyeError> {
    // --- 2. Configuration ---
    let config = match config_path {
        Some(path) => EyeConfig::load(path)?,
        None => EyeConfig::default(),
    };
    info!(?config, "Loaded configuration");

    // --- 3. Capture & Pipeline Initialization ---
    let source = ImageSequenceSource::open(frames_dir, looping)?;
    let handoff = CaptureHandoff::spawn(source);
    let mut pipeline = EyePipeline::new(config, NoInput, LogRenderer, StdRng::from_entropy())?;

    // --- 4. Main Processing Loop ---
    run_async(&mut pipeline, handoff.into_stream(), None).await
}
