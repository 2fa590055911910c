//! isoline-bench: CLI tool for contour parameter experimentation and diagnostics.
//!
//! Generates a fractal-noise field with configurable parameters, traces
//! its threshold contour, and prints detailed per-stage diagnostics.
//! Useful for:
//!
//! - Tuning octaves, persistence and scale against segment counts
//! - Measuring per-stage durations to identify bottlenecks
//! - Reproducing a specific field with `--seed`
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin isoline-bench -- [OPTIONS]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use isoline_pipeline::diagnostics::{Clock, PipelineDiagnostics};
use isoline_pipeline::{ContourConfig, SimplexNoise};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use web_time::Instant;

/// Contour parameter experimentation and diagnostics for isoline.
///
/// Generates a fractal-noise field, traces its threshold contour, and
/// prints detailed per-stage timing and count diagnostics.
#[derive(Parser)]
#[command(name = "isoline-bench", version)]
struct Cli {
    /// Field width in samples.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_WIDTH, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(2..))]
    width: u32,

    /// Field height in samples.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_HEIGHT, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(2..))]
    height: u32,

    /// Number of noise octaves.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_OCTAVES, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    octaves: u32,

    /// Amplitude multiplier between octaves, in (0, 1].
    #[arg(long, default_value_t = ContourConfig::DEFAULT_PERSISTENCE)]
    persistence: f64,

    /// Frequency of the first octave.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_SCALE)]
    scale: f64,

    /// Iso-level to trace.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_THRESHOLD, allow_negative_numbers = true)]
    threshold: f64,

    /// Cells closer than this to the top/left edge are skipped.
    #[arg(long, default_value_t = ContourConfig::DEFAULT_BORDER_MARGIN)]
    border_margin: u32,

    /// Noise seed. A fresh random seed is drawn for every run when omitted.
    #[arg(long)]
    seed: Option<u32>,

    /// Write the segments of the first run to this file as JSON.
    #[arg(long)]
    segments: Option<PathBuf>,

    /// Number of runs for averaging.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of human-readable report.
    #[arg(long)]
    json: bool,

    /// Full contour config as a JSON string.
    ///
    /// When provided, all other field parameter flags are ignored.
    /// The JSON must be a valid `ContourConfig` serialization; missing
    /// fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build a [`ContourConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.  Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<ContourConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        ContourConfig {
            width: cli.width,
            height: cli.height,
            octaves: cli.octaves,
            persistence: cli.persistence,
            scale: cli.scale,
            threshold: cli.threshold,
            border_margin: cli.border_margin,
            ..ContourConfig::default()
        }
    };

    config
        .validate()
        .map_err(|e| format!("Invalid configuration: {e}"))?;
    Ok(config)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Config: {config:#?}");
    eprintln!("Runs: {}", cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(cli.runs);

    for run in 0..cli.runs {
        if cli.runs > 1 {
            eprintln!("--- Run {}/{} ---", run + 1, cli.runs);
        }

        let noise = cli
            .seed
            .map_or_else(SimplexNoise::from_entropy, SimplexNoise::new);
        info!(run = run + 1, seed = noise.seed(), "generating field");

        match isoline_pipeline::diagnostics::generate_with_diagnostics(&config, noise, &WallClock)
        {
            Ok((result, diagnostics)) => {
                if cli.json {
                    match serde_json::to_string_pretty(&diagnostics) {
                        Ok(json) => println!("{json}"),
                        Err(e) => {
                            eprintln!("Error serializing diagnostics: {e}");
                            return ExitCode::FAILURE;
                        }
                    }
                } else {
                    println!("{}", diagnostics.report());
                }

                // Write segments on the first run only.
                if run == 0
                    && let Some(ref path) = cli.segments
                {
                    let json = match serde_json::to_string(&result) {
                        Ok(json) => json,
                        Err(e) => {
                            eprintln!("Error serializing segments: {e}");
                            return ExitCode::FAILURE;
                        }
                    };
                    match std::fs::write(path, &json) {
                        Ok(()) => {
                            eprintln!(
                                "Segments written to {} ({} segments, {} bytes)",
                                path.display(),
                                result.segments.len(),
                                json.len(),
                            );
                        }
                        Err(e) => {
                            eprintln!("Error writing segments to {}: {e}", path.display());
                            return ExitCode::FAILURE;
                        }
                    }
                }

                if result.segments.is_empty() {
                    warn!(
                        threshold = config.threshold,
                        "no segments traced; threshold may lie outside the field range"
                    );
                }

                all_diagnostics.push(diagnostics);
            }
            Err(e) => {
                eprintln!("Pipeline error: {e}");
                return ExitCode::FAILURE;
            }
        }

        if cli.runs > 1 {
            eprintln!();
        }
    }

    // Print summary when multiple runs.
    if cli.runs > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    ExitCode::SUCCESS
}

/// [`Clock`] implementation backed by [`web_time::Instant`].
struct WallClock;

impl Clock for WallClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Function pointer type for extracting a stage duration from diagnostics.
type StageExtractor = fn(&PipelineDiagnostics) -> Duration;

/// Print aggregated statistics across multiple runs.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    if all_diagnostics.is_empty() {
        println!("Warning: no diagnostics to summarize");
        return;
    }

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    let segment_counts: Vec<usize> = all_diagnostics
        .iter()
        .map(|d| d.summary.segment_count)
        .collect();
    let seg_min = segment_counts.iter().copied().min().unwrap_or(0);
    let seg_max = segment_counts.iter().copied().max().unwrap_or(0);
    let seg_mean = segment_counts.iter().sum::<usize>() as f64 / segment_counts.len() as f64;

    println!("Segments: min={seg_min}  mean={seg_mean:.1}  max={seg_max}");

    // Per-stage means.
    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    let stage_extractors: &[(&str, StageExtractor)] = &[
        ("Field Sampling", |d| d.field_sampling.duration),
        ("Contour Tracing", |d| d.contour_tracing.duration),
    ];

    for (name, extractor) in stage_extractors {
        let stage_mean = all_diagnostics
            .iter()
            .map(|d| extractor(d).as_secs_f64() * 1000.0)
            .sum::<f64>()
            / all_diagnostics.len() as f64;
        println!("{name:<24} {stage_mean:>10.3}ms");
    }
}
