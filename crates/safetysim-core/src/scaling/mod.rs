//! Compute-cap scenario over a power-law scaling model with Monte Carlo uncertainty.
//!
//! - `grid`: logarithmic compute budgets.
//! - `law`: the deterministic loss model.
//! - `percentile`: interpolated order statistics.
//! - `monte_carlo`: exponent sampling and per-budget aggregation.
//! - `cap`: the regulatory freeze applied to the median curve.

mod cap;
mod grid;
mod law;
mod monte_carlo;
mod percentile;

pub use cap::{CapPolicy, RegulatedCurve};
pub use grid::{ComputeGrid, GridConfig};
pub use law::{ScalingLaw, is_non_increasing};
pub use monte_carlo::{
    AggregateCurve, AlphaNoise, AlphaSummary, MonteCarloOutcome, MonteCarloSampler,
    PercentileBand,
};
pub use percentile::{median, percentile};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{Level, event};

use crate::error::{SimError, ensure_positive};

/// Parameters of one compute-governance run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    pub grid: GridConfig,
    pub critical_compute: f64,
    pub compute_cap: f64,
    pub alpha_mean: f64,
    pub alpha_std: f64,
    pub num_simulations: usize,
    pub band: PercentileBand,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        let noise = AlphaNoise::default();
        Self {
            grid: GridConfig::default(),
            critical_compute: 1e20,
            compute_cap: 1e24,
            alpha_mean: noise.mean,
            alpha_std: noise.std_dev,
            num_simulations: 1_000,
            band: PercentileBand::default(),
        }
    }
}

impl ScalingConfig {
    pub fn noise(&self) -> AlphaNoise {
        AlphaNoise {
            mean: self.alpha_mean,
            std_dev: self.alpha_std,
        }
    }

    /// Validates every field and returns the grid it describes.
    pub fn validate(&self) -> Result<ComputeGrid, SimError> {
        let grid = self.grid.build()?;
        ScalingLaw::new(self.critical_compute)?;
        ensure_positive("scaling.compute_cap", self.compute_cap)?;
        CapPolicy::new(self.compute_cap)?.cap_index(&grid)?;
        MonteCarloSampler::new(
            &grid,
            ScalingLaw::default(),
            self.noise(),
            self.num_simulations,
            self.band,
        )?;
        Ok(grid)
    }
}

/// Everything the reporting layer needs from one compute-governance run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScalingRun {
    pub grid: ComputeGrid,
    pub alphas: AlphaSummary,
    pub aggregate: AggregateCurve,
    pub regulated: RegulatedCurve,
}

impl ScalingRun {
    pub fn compute_cap(&self) -> f64 {
        self.regulated.cap
    }
}

/// Samples the exponent, aggregates the loss band and applies the compute cap.
pub fn simulate_scaling<R: Rng + ?Sized>(
    config: &ScalingConfig,
    rng: &mut R,
) -> Result<ScalingRun, SimError> {
    let grid = config.validate()?;
    let law = ScalingLaw::new(config.critical_compute)?;
    let policy = CapPolicy::new(config.compute_cap)?;

    let outcome = MonteCarloSampler::new(
        &grid,
        law,
        config.noise(),
        config.num_simulations,
        config.band,
    )?
    .run(rng)?;
    let regulated = policy.apply(&outcome.curve.median, &grid)?;

    event!(
        target: "safetysim::scaling",
        Level::INFO,
        samples = config.num_simulations,
        cap = config.compute_cap,
        cap_index = regulated.cap_index,
        frozen_loss = regulated.frozen_loss(),
        overhang = regulated.overhang(),
        "compute cap applied"
    );

    Ok(ScalingRun {
        grid,
        alphas: outcome.alphas,
        aggregate: outcome.curve,
        regulated,
    })
}
