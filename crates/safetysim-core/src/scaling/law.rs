use serde::{Deserialize, Serialize};

use super::ComputeGrid;
use crate::error::{SimError, ensure_positive};

const DEFAULT_CRITICAL_COMPUTE: f64 = 1e20;

/// Power-law scaling model `L(C) = (C_c / C)^alpha`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingLaw {
    critical_compute: f64,
}

impl ScalingLaw {
    pub fn new(critical_compute: f64) -> Result<Self, SimError> {
        ensure_positive("scaling.critical_compute", critical_compute)?;
        Ok(Self { critical_compute })
    }

    pub fn critical_compute(&self) -> f64 {
        self.critical_compute
    }

    /// Loss at a single positive compute budget.
    pub fn loss(&self, compute: f64, alpha: f64) -> f64 {
        debug_assert!(compute > 0.0, "compute budgets must be positive");
        (self.critical_compute / compute).powf(alpha)
    }

    /// Loss evaluated at every budget of `grid`, in grid order.
    pub fn loss_curve(&self, grid: &ComputeGrid, alpha: f64) -> Vec<f64> {
        let curve: Vec<f64> = grid
            .values()
            .iter()
            .map(|compute| self.loss(*compute, alpha))
            .collect();
        debug_assert!(
            alpha <= 0.0 || is_non_increasing(&curve),
            "loss must not grow with compute for alpha {alpha}"
        );
        curve
    }
}

impl Default for ScalingLaw {
    fn default() -> Self {
        Self {
            critical_compute: DEFAULT_CRITICAL_COMPUTE,
        }
    }
}

pub fn is_non_increasing(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[1] <= pair[0])
}
