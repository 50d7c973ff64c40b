use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use log::{error, info};

use ecoplace::config::AllocatorConfig;
use ecoplace::error::Result;
use ecoplace::experiment::Experiment;
use ecoplace::genetic::genetic_algorithm;
use ecoplace::request::{validate_resources, PredictRequest};
use ecoplace::resource::load_resources;
use ecoplace::solution::AllocationResponse;

fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;
    Builder::from_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Computes energy-aware placement of VMs onto resources with a genetic algorithm
struct Args {
    /// Path to YAML or JSON file with resource roster
    #[arg(short, long)]
    resources: String,

    /// Path to YAML or JSON file with allocation request
    #[arg(short = 'q', long)]
    request: String,

    /// Path to YAML file with allocator configuration
    #[arg(short, long)]
    config: Option<String>,

    /// Random seed (overrides config)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Directory for diagnostic CSV files (overrides config)
    #[arg(short, long)]
    diagnostics_dir: Option<String>,

    /// Number of independent runs, the best result is reported
    #[arg(long, default_value_t = 1)]
    runs: usize,

    /// Number of threads used for multiple runs
    #[arg(short, long, default_value_t = 1)]
    threads: usize,

    /// Path to produced JSON file with results of all runs
    #[arg(short, long)]
    output: Option<String>,
}

fn run(args: Args) -> Result<AllocationResponse> {
    let resources = load_resources(&args.resources)?;
    validate_resources(&resources)?;
    let request = PredictRequest::from_file(&args.request)?;
    request.validate()?;

    let mut config = match &args.config {
        Some(path) => AllocatorConfig::from_file(path)?,
        None => AllocatorConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if args.diagnostics_dir.is_some() {
        config.diagnostics_dir = args.diagnostics_dir.clone();
    }

    if args.runs <= 1 && args.output.is_none() {
        return Ok(genetic_algorithm(&request, &resources, config)?.to_response());
    }

    let result = Experiment::new(request, resources, config, args.runs).run(args.threads)?;
    for run in &result.runs {
        info!(
            "Run {} (seed {}): {} watts ({} in generation 0)",
            run.run_id, run.seed, run.energy_consumption, run.initial_best
        );
    }
    if let Some(path) = &args.output {
        result.save(path)?;
    }
    Ok(result.best)
}

fn main() -> ExitCode {
    init_logger();

    let args = Args::parse();
    let start = Instant::now();

    match run(args) {
        Ok(response) => match serde_json::to_string_pretty(&response) {
            Ok(json) => {
                println!("{}", json);
                info!("Allocation computed in {:.2?}", start.elapsed());
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("{}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
