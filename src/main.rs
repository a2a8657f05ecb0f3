//! `forecast-pipeline` command-line entry point.

use clap::{Parser, Subcommand};
use forecast_pipeline_core::config::{PipelineConfig, SeasonalityMode};
use forecast_pipeline_core::display::trace::format_report;
use forecast_pipeline_core::engine::HarmonicEngine;
use forecast_pipeline_core::frame::Frequency;
use forecast_pipeline_core::store::ArtifactStore;
use forecast_pipeline_core::{logging, run_batch, Pipeline, PipelineReport};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "forecast-pipeline", version)]
#[command(about = "Staged time-series forecasting pipeline", long_about = None)]
struct Cli {
    /// Log at debug level regardless of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run ingest, fit, evaluate and visualize once
    Run {
        /// JSON configuration file; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Source file path or http(s) URL
        #[arg(short, long)]
        source: Option<String>,

        /// Number of future periods to forecast
        #[arg(long)]
        horizon: Option<usize>,

        /// Series frequency (hourly, daily, weekly, monthly, quarterly, yearly)
        #[arg(short, long)]
        frequency: Option<Frequency>,

        /// Seasonality composition (additive, multiplicative)
        #[arg(long, value_parser = parse_mode)]
        seasonality_mode: Option<SeasonalityMode>,

        /// Confidence level of the forecast interval, in (0, 1)
        #[arg(long)]
        interval_width: Option<f64>,

        /// Root directory of the artifact store
        #[arg(long)]
        artifact_root: Option<PathBuf>,

        /// Directory for charts and tables
        #[arg(long)]
        report_dir: Option<PathBuf>,

        /// Namespace for this run's artifacts
        #[arg(long)]
        run_id: Option<String>,
    },

    /// Run several configurations in parallel
    Batch {
        /// JSON configuration files, one run each
        #[arg(required = true)]
        configs: Vec<PathBuf>,
    },
}

fn parse_mode(s: &str) -> Result<SeasonalityMode, String> {
    match s.to_ascii_lowercase().as_str() {
        "additive" => Ok(SeasonalityMode::Additive),
        "multiplicative" => Ok(SeasonalityMode::Multiplicative),
        other => Err(format!("unknown seasonality mode '{}'", other)),
    }
}

fn load(path: Option<&Path>) -> Result<PipelineConfig, String> {
    match path {
        Some(p) => PipelineConfig::load(p).map_err(|e| e.to_string()),
        None => Ok(PipelineConfig::default()),
    }
}

fn print_report(report: &PipelineReport, cfg: &PipelineConfig) {
    let evaluation = ArtifactStore::open(&cfg.artifact_root, &cfg.run_id)
        .ok()
        .filter(|_| report.success())
        .and_then(|store| store.get_evaluation().ok());
    print!("{}", format_report(report, evaluation.as_ref()));
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let engine = HarmonicEngine;

    match cli.command {
        Commands::Run {
            config,
            source,
            horizon,
            frequency,
            seasonality_mode,
            interval_width,
            artifact_root,
            report_dir,
            run_id,
        } => {
            let mut cfg = match load(config.as_deref()) {
                Ok(cfg) => cfg,
                Err(e) => {
                    eprintln!("error: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            if let Some(v) = source {
                cfg.source.location = v;
            }
            if let Some(v) = horizon {
                cfg.horizon = v;
            }
            if let Some(v) = frequency {
                cfg.frequency = v;
            }
            if let Some(v) = seasonality_mode {
                cfg.model.seasonality_mode = v;
            }
            if let Some(v) = interval_width {
                cfg.model.interval_width = v;
            }
            if let Some(v) = artifact_root {
                cfg.artifact_root = v;
            }
            if let Some(v) = report_dir {
                cfg.report.output_dir = v;
            }
            if let Some(v) = run_id {
                cfg.run_id = v;
            }

            let report = Pipeline::new(cfg.clone(), &engine).run();
            print_report(&report, &cfg);
            if report.success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Batch { configs } => {
            let mut loaded = Vec::with_capacity(configs.len());
            for path in &configs {
                match load(Some(path)) {
                    Ok(cfg) => loaded.push(cfg),
                    Err(e) => {
                        eprintln!("error: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            }
            let reports = match run_batch(loaded.clone(), &engine) {
                Ok(reports) => reports,
                Err(e) => {
                    eprintln!("error: {}", e);
                    return ExitCode::FAILURE;
                }
            };
            for (report, cfg) in reports.iter().zip(&loaded) {
                print_report(report, cfg);
            }
            let failed = reports.iter().filter(|r| !r.success()).count();
            println!("{} of {} runs succeeded", reports.len() - failed, reports.len());
            if failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}
