//! Sequential Bayesian detection of a reward-hacking agent.
//!
//! This module is composed of:
//! - `hypothesis`: the closed `Hypothesis` / `Observation` enumerations.
//! - `likelihood`: the validated 2x2 `LikelihoodTable`.
//! - `generator`: the seeded `ObservationStream` driven by the hidden truth.
//! - `update`: the exact Bayes rule step.
//! - `trace`: accumulated posteriors and the threshold-crossing query.

mod generator;
mod hypothesis;
mod likelihood;
mod trace;
mod update;

pub use generator::ObservationStream;
pub use hypothesis::{Hypothesis, Observation};
pub use likelihood::{LikelihoodRow, LikelihoodRows, LikelihoodTable};
pub use trace::BeliefTrace;
pub use update::update;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{Level, event};

use crate::error::{SimError, ensure_probability};

const DEFAULT_STEPS: usize = 50;
const DEFAULT_PRIOR: f64 = 0.5;
const DEFAULT_THRESHOLD: f64 = 0.99;

/// Parameters of one belief-tracking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeliefConfig {
    pub steps: usize,
    pub prior: f64,
    pub threshold: f64,
    pub true_hypothesis: Hypothesis,
    pub likelihood: LikelihoodTable,
}

impl Default for BeliefConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            prior: DEFAULT_PRIOR,
            threshold: DEFAULT_THRESHOLD,
            true_hypothesis: Hypothesis::Hacking,
            likelihood: LikelihoodTable::default(),
        }
    }
}

impl BeliefConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        if self.steps == 0 {
            return Err(SimError::invalid(
                "belief.steps",
                "number of steps must be greater than zero",
            ));
        }
        ensure_probability("belief.prior", self.prior)?;
        if !self.threshold.is_finite() || self.threshold <= 0.0 || self.threshold >= 1.0 {
            return Err(SimError::invalid(
                "belief.threshold",
                format!("threshold must lie in (0, 1) (got {})", self.threshold),
            ));
        }
        Ok(())
    }
}

/// Everything the reporting layer needs from one belief-tracking run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeliefRun {
    pub true_hypothesis: Hypothesis,
    pub threshold: f64,
    pub likelihood: LikelihoodTable,
    /// First step whose belief exceeds `threshold`, or `None` if the horizon ran out first.
    pub detection: Option<usize>,
    pub trace: BeliefTrace,
}

/// Runs the observation generator through the Bayes updater for `config.steps` steps.
pub fn simulate_belief<R: Rng + ?Sized>(
    config: &BeliefConfig,
    rng: &mut R,
) -> Result<BeliefRun, SimError> {
    config.validate()?;

    let observations = ObservationStream::new(
        config.true_hypothesis,
        &config.likelihood,
        config.steps,
        rng,
    );
    let trace = BeliefTrace::from_observations(config.prior, observations, &config.likelihood)?;

    let detection = match trace.first_crossing(config.threshold) {
        Ok(step) => Some(step),
        Err(err) if err.is_recoverable() => None,
        Err(err) => return Err(err),
    };

    event!(
        target: "safetysim::belief",
        Level::DEBUG,
        truth = %config.true_hypothesis,
        steps = config.steps,
        suspicious = trace.suspicious_count(),
        final_belief = trace.final_belief(),
    );
    match detection {
        Some(step) => event!(
            target: "safetysim::belief",
            Level::INFO,
            step,
            threshold = config.threshold,
            "misalignment detected"
        ),
        None => event!(
            target: "safetysim::belief",
            Level::INFO,
            threshold = config.threshold,
            steps = config.steps,
            "no detection within horizon"
        ),
    }

    Ok(BeliefRun {
        true_hypothesis: config.true_hypothesis,
        threshold: config.threshold,
        likelihood: config.likelihood,
        detection,
        trace,
    })
}
