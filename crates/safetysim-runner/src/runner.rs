use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use rand::SeedableRng;
use rand::rngs::StdRng;
use safetysim_core::SimError;
use safetysim_core::belief::{BeliefRun, simulate_belief};
use safetysim_core::scaling::{ScalingRun, simulate_scaling};
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{ResolvedOutputs, SimulationConfig};
use crate::report::{
    ReportError, render_belief_plot, render_scaling_plot, write_json, write_markdown,
};

/// Which of the two independent pipelines to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PipelineSelection {
    Belief,
    Scaling,
    All,
}

impl PipelineSelection {
    fn includes_belief(self) -> bool {
        matches!(self, PipelineSelection::Belief | PipelineSelection::All)
    }

    fn includes_scaling(self) -> bool {
        matches!(self, PipelineSelection::Scaling | PipelineSelection::All)
    }
}

/// Drives the simulations and hands their results to the reporting layer.
pub struct SimulationRunner {
    config: SimulationConfig,
    outputs: ResolvedOutputs,
    render_plots: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub belief: Option<BeliefRun>,
    pub scaling: Option<ScalingRun>,
    pub belief_json: Option<PathBuf>,
    pub scaling_json: Option<PathBuf>,
    pub summary_path: PathBuf,
    pub plot_paths: Vec<PathBuf>,
}

impl SimulationRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: SimulationConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        config.belief.validate()?;
        config.scaling.validate()?;
        Ok(Self {
            config,
            outputs,
            render_plots: true,
        })
    }

    /// Skip PNG rendering (results and summary are still written).
    pub fn without_plots(mut self) -> Self {
        self.render_plots = false;
        self
    }

    /// Execute the selected pipelines, each with its own freshly seeded RNG.
    pub fn run(&self, selection: PipelineSelection) -> Result<RunSummary, RunnerError> {
        ensure_dir(&self.outputs.results_dir)?;
        ensure_dir_opt(self.outputs.summary_md.parent())?;

        let run_id = self.config.run_id.as_str();
        let seed = self.config.seed;
        let mut plot_paths = Vec::new();

        let mut belief = None;
        let mut belief_json = None;
        if selection.includes_belief() {
            let mut rng = StdRng::seed_from_u64(seed);
            let run = simulate_belief(&self.config.belief, &mut rng)?;

            let path = self.outputs.results_dir.join("belief.json");
            write_json(&path, run_id, seed, &run)?;
            belief_json = Some(path);

            if self.render_plots {
                self.collect_plot(render_belief_plot(&run, &self.outputs.plots_dir), &mut plot_paths);
            }
            belief = Some(run);
        }

        let mut scaling = None;
        let mut scaling_json = None;
        if selection.includes_scaling() {
            let mut rng = StdRng::seed_from_u64(seed);
            let run = simulate_scaling(&self.config.scaling, &mut rng)?;

            let path = self.outputs.results_dir.join("scaling.json");
            write_json(&path, run_id, seed, &run)?;
            scaling_json = Some(path);

            if self.render_plots {
                self.collect_plot(render_scaling_plot(&run, &self.outputs.plots_dir), &mut plot_paths);
            }
            scaling = Some(run);
        }

        write_markdown(
            &self.outputs.summary_md,
            run_id,
            seed,
            belief.as_ref(),
            scaling.as_ref(),
        )?;

        event!(
            target: "safetysim::run",
            Level::INFO,
            run_id,
            seed,
            belief = belief.is_some(),
            scaling = scaling.is_some(),
            plots = plot_paths.len(),
            "run complete"
        );

        Ok(RunSummary {
            belief,
            scaling,
            belief_json,
            scaling_json,
            summary_path: self.outputs.summary_md.clone(),
            plot_paths,
        })
    }

    fn collect_plot(&self, attempt: Result<PathBuf, ReportError>, plots: &mut Vec<PathBuf>) {
        match attempt {
            Ok(path) => plots.push(path),
            Err(err) => {
                event!(target: "safetysim::report", Level::WARN, error = %err, "plot skipped");
                eprintln!("WARN: {}", err);
            }
        }
    }
}

fn ensure_dir(dir: &Path) -> Result<(), RunnerError> {
    ensure_dir_opt(Some(dir))
}

fn ensure_dir_opt(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("simulation error: {0}")]
    Simulation(#[from] SimError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("report error: {0}")]
    Report(#[from] ReportError),
}
