//! Monte Carlo propagation of scaling-exponent uncertainty.

use rand::Rng;
use rand::distributions::Distribution;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use tracing::{Level, event};

use super::percentile::{median, percentile};
use super::{ComputeGrid, ScalingLaw};
use crate::error::{SimError, ensure_positive};

/// Upper bound on the mean scaling exponent.
const MAX_ALPHA_MEAN: f64 = 1.0;

/// Normal noise on the scaling exponent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlphaNoise {
    pub mean: f64,
    pub std_dev: f64,
}

impl Default for AlphaNoise {
    fn default() -> Self {
        Self {
            mean: 0.05,
            std_dev: 0.005,
        }
    }
}

impl AlphaNoise {
    fn distribution(&self) -> Result<Normal, SimError> {
        ensure_positive("scaling.alpha_mean", self.mean)?;
        if self.mean > MAX_ALPHA_MEAN {
            return Err(SimError::invalid(
                "scaling.alpha_mean",
                format!(
                    "mean exponent must not exceed {MAX_ALPHA_MEAN} (got {})",
                    self.mean
                ),
            ));
        }
        ensure_positive("scaling.alpha_std", self.std_dev)?;
        Normal::new(self.mean, self.std_dev)
            .map_err(|err| SimError::invalid("scaling.alpha_std", err.to_string()))
    }
}

/// Lower and upper percentile levels of the uncertainty band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PercentileBand {
    pub lower: f64,
    pub upper: f64,
}

impl Default for PercentileBand {
    fn default() -> Self {
        Self {
            lower: 5.0,
            upper: 95.0,
        }
    }
}

impl PercentileBand {
    pub fn validate(&self) -> Result<(), SimError> {
        let in_range = |q: f64| q.is_finite() && (0.0..=100.0).contains(&q);
        if !in_range(self.lower) || !in_range(self.upper) {
            return Err(SimError::invalid(
                "scaling.band",
                "percentile levels must lie in [0, 100]",
            ));
        }
        if self.lower > 50.0 || self.upper < 50.0 {
            return Err(SimError::invalid(
                "scaling.band",
                format!(
                    "band [{}, {}] must bracket the median",
                    self.lower, self.upper
                ),
            ));
        }
        Ok(())
    }
}

/// Per-budget median and percentile band over all sampled loss curves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateCurve {
    pub band: PercentileBand,
    pub median: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

impl AggregateCurve {
    pub fn len(&self) -> usize {
        self.median.len()
    }

    pub fn is_empty(&self) -> bool {
        self.median.is_empty()
    }

    /// Width of the band at each budget.
    pub fn spread(&self) -> Vec<f64> {
        self.upper
            .iter()
            .zip(&self.lower)
            .map(|(upper, lower)| upper - lower)
            .collect()
    }
}

/// Summary of the exponent draws behind an [`AggregateCurve`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AlphaSummary {
    pub samples: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Output of one [`MonteCarloSampler::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloOutcome {
    pub alphas: AlphaSummary,
    pub curve: AggregateCurve,
}

/// Draws exponent samples and reduces the resulting loss curves to percentiles.
#[derive(Debug, Clone)]
pub struct MonteCarloSampler<'g> {
    grid: &'g ComputeGrid,
    law: ScalingLaw,
    noise: Normal,
    num_simulations: usize,
    band: PercentileBand,
}

impl<'g> MonteCarloSampler<'g> {
    pub fn new(
        grid: &'g ComputeGrid,
        law: ScalingLaw,
        noise: AlphaNoise,
        num_simulations: usize,
        band: PercentileBand,
    ) -> Result<Self, SimError> {
        if num_simulations == 0 {
            return Err(SimError::invalid(
                "scaling.num_simulations",
                "number of simulations must be greater than zero",
            ));
        }
        band.validate()?;
        Ok(Self {
            grid,
            law,
            noise: noise.distribution()?,
            num_simulations,
            band,
        })
    }

    /// Runs every sample against the one RNG, then aggregates once all are in.
    ///
    /// All exponents are drawn up front in sample order, so the curve depends only on the
    /// RNG state at entry. Fails if any drawn exponent pushes a loss past `f64` range.
    pub fn run<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<MonteCarloOutcome, SimError> {
        let alphas: Vec<f64> = (0..self.num_simulations)
            .map(|_| self.noise.sample(rng))
            .collect();

        // columns[i] holds every sample's loss at grid budget i.
        let mut columns = vec![Vec::with_capacity(alphas.len()); self.grid.len()];
        for alpha in &alphas {
            let curve = self.law.loss_curve(self.grid, *alpha);
            if let Some(loss) = curve.iter().find(|loss| !loss.is_finite()) {
                return Err(SimError::invalid(
                    "scaling.alpha_mean",
                    format!("sampled exponent {alpha} produced a non-finite loss ({loss})"),
                ));
            }
            for (column, loss) in columns.iter_mut().zip(curve) {
                column.push(loss);
            }
        }

        let mut curve = AggregateCurve {
            band: self.band,
            median: Vec::with_capacity(columns.len()),
            lower: Vec::with_capacity(columns.len()),
            upper: Vec::with_capacity(columns.len()),
        };
        for mut column in columns {
            column.sort_by(f64::total_cmp);
            curve.median.push(median(&column));
            curve.lower.push(percentile(&column, self.band.lower));
            curve.upper.push(percentile(&column, self.band.upper));
        }

        let alphas = summarise_alphas(&alphas);
        event!(
            target: "safetysim::scaling",
            Level::DEBUG,
            samples = alphas.samples,
            alpha_mean = alphas.mean,
            alpha_min = alphas.min,
            alpha_max = alphas.max,
            "monte carlo sampling finished"
        );

        Ok(MonteCarloOutcome { alphas, curve })
    }
}

fn summarise_alphas(alphas: &[f64]) -> AlphaSummary {
    let min = alphas.iter().copied().fold(f64::INFINITY, f64::min);
    let max = alphas.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    AlphaSummary {
        samples: alphas.len(),
        mean: alphas.iter().sum::<f64>() / alphas.len() as f64,
        min,
        max,
    }
}
