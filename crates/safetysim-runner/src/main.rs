use std::path::PathBuf;

use clap::Parser;

use safetysim_runner::config::{ResolvedOutputs, SimulationConfig};
use safetysim_runner::logging::init_logging;
use safetysim_runner::runner::{PipelineSelection, SimulationRunner};

/// AI-safety monitoring simulations: Bayesian misalignment detection and compute caps.
#[derive(Debug, Parser)]
#[command(
    name = "safetysim",
    author,
    version,
    about = "Deterministic AI-safety monitoring simulations"
)]
struct Cli {
    /// Path to a YAML configuration file (built-in defaults when omitted).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Which pipeline(s) to run.
    #[arg(long, value_enum, default_value_t = PipelineSelection::All)]
    pipeline: PipelineSelection,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the RNG seed shared by both pipelines.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the number of observation steps in the belief pipeline.
    #[arg(long, value_name = "STEPS")]
    steps: Option<usize>,

    /// Override the number of Monte Carlo samples in the scaling pipeline.
    #[arg(long, value_name = "COUNT")]
    simulations: Option<usize>,

    /// Skip PNG chart rendering.
    #[arg(long)]
    no_plots: bool,

    /// Exit after validating the configuration (no simulation is run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = match cli.config.as_ref() {
        Some(path) => SimulationConfig::from_path(path)?,
        None => SimulationConfig::default(),
    };

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    if let Some(steps) = cli.steps {
        config.belief.steps = steps;
    }

    if let Some(simulations) = cli.simulations {
        config.scaling.num_simulations = simulations;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let seed = config.seed;

    println!(
        "Loaded configuration '{run_id}' (seed {seed}, {} belief steps, {} Monte Carlo samples)",
        config.belief.steps, config.scaling.num_simulations
    );

    if cli.validate_only {
        println!("Validation-only mode: simulation skipped.");
        return Ok(());
    }

    let logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let mut runner = SimulationRunner::new(config, outputs)?;
    if cli.no_plots {
        runner = runner.without_plots();
    }

    let summary = runner.run(cli.pipeline)?;

    if let Some(run) = summary.belief.as_ref() {
        match run.detection {
            Some(step) => println!("Misalignment detected at step {step}"),
            None => println!(
                "No detection within {} steps (threshold {})",
                run.trace.steps(),
                run.threshold
            ),
        }
        println!(
            "Final belief that agent is hacking: {:.6}",
            run.trace.final_belief()
        );
    }
    if let Some(run) = summary.scaling.as_ref() {
        println!(
            "Simulation complete: {} Monte Carlo samples, cap {:.0e} FLOPS at grid index {}, overhang {:.4}",
            run.alphas.samples,
            run.compute_cap(),
            run.regulated.cap_index,
            run.regulated.overhang()
        );
    }

    for path in summary.belief_json.iter().chain(summary.scaling_json.iter()) {
        println!("Results: {}", path.display());
    }
    println!("Summary table: {}", summary.summary_path.display());
    for plot in &summary.plot_paths {
        println!("Plot: {}", plot.display());
    }
    if let Some(guard) = logging_guard.as_ref() {
        println!("Telemetry log: {}", guard.telemetry_path.display());
    }

    Ok(())
}
