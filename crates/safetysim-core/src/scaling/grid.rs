use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// Strictly increasing, logarithmically spaced compute budgets in FLOPS.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputeGrid {
    values: Vec<f64>,
}

impl ComputeGrid {
    /// `points` budgets from `10^start_exp` to `10^end_exp`, evenly spaced in exponent.
    ///
    /// The final exponent is pinned to `end_exp` rather than accumulated, so the last budget
    /// is exactly `10^end_exp` whenever that value is representable.
    pub fn logspace(start_exp: f64, end_exp: f64, points: usize) -> Result<Self, SimError> {
        if !start_exp.is_finite() || !end_exp.is_finite() {
            return Err(SimError::invalid(
                "scaling.grid",
                "exponents must be finite",
            ));
        }
        if start_exp >= end_exp {
            return Err(SimError::invalid(
                "scaling.grid",
                format!("start exponent {start_exp} must be below end exponent {end_exp}"),
            ));
        }
        if points < 2 {
            return Err(SimError::invalid(
                "scaling.grid.points",
                "grid needs at least two points",
            ));
        }

        let step = (end_exp - start_exp) / (points - 1) as f64;
        let mut values: Vec<f64> = (0..points)
            .map(|i| 10f64.powf(start_exp + step * i as f64))
            .collect();
        values[points - 1] = 10f64.powf(end_exp);

        if !values.iter().all(|v| v.is_finite() && *v > 0.0) {
            return Err(SimError::invalid(
                "scaling.grid",
                "exponent range overflows f64",
            ));
        }
        if values.windows(2).any(|pair| pair[1] <= pair[0]) {
            return Err(SimError::invalid(
                "scaling.grid.points",
                "grid is too dense to stay strictly increasing",
            ));
        }

        Ok(Self { values })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn min(&self) -> f64 {
        self.values[0]
    }

    pub fn max(&self) -> f64 {
        self.values[self.values.len() - 1]
    }

    /// First index whose budget is not less than `target` (`len()` if none).
    pub fn lower_bound(&self, target: f64) -> usize {
        self.values.partition_point(|value| *value < target)
    }
}

/// Serialized grid parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub start_exp: f64,
    pub end_exp: f64,
    pub points: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            start_exp: 18.0,
            end_exp: 26.0,
            points: 100,
        }
    }
}

impl GridConfig {
    pub fn build(&self) -> Result<ComputeGrid, SimError> {
        ComputeGrid::logspace(self.start_exp, self.end_exp, self.points)
    }
}
