use serde::Serialize;

use super::ComputeGrid;
use crate::error::{SimError, ensure_positive};

/// Regulatory ceiling on training compute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapPolicy {
    cap: f64,
}

impl CapPolicy {
    pub fn new(cap: f64) -> Result<Self, SimError> {
        ensure_positive("scaling.compute_cap", cap)?;
        Ok(Self { cap })
    }

    pub fn cap(&self) -> f64 {
        self.cap
    }

    /// First grid index whose budget is not less than the cap.
    pub fn cap_index(&self, grid: &ComputeGrid) -> Result<usize, SimError> {
        if self.cap < grid.min() || self.cap > grid.max() {
            return Err(SimError::CapOutOfRange {
                cap: self.cap,
                min: grid.min(),
                max: grid.max(),
            });
        }
        Ok(grid.lower_bound(self.cap))
    }

    /// Freezes `median` at its value at the cap index for every budget at or past the cap.
    pub fn apply(&self, median: &[f64], grid: &ComputeGrid) -> Result<RegulatedCurve, SimError> {
        if median.len() != grid.len() {
            return Err(SimError::invalid(
                "median",
                format!(
                    "curve has {} points but the grid has {}",
                    median.len(),
                    grid.len()
                ),
            ));
        }

        let cap_index = self.cap_index(grid)?;
        let frozen = median[cap_index];
        let mut values = median.to_vec();
        values[cap_index..].fill(frozen);

        let unregulated_final = median[median.len() - 1];
        Ok(RegulatedCurve {
            cap: self.cap,
            cap_index,
            values,
            overhang: frozen - unregulated_final,
        })
    }
}

/// Median curve with every loss at or beyond the cap held at the capped value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegulatedCurve {
    pub cap: f64,
    pub cap_index: usize,
    pub values: Vec<f64>,
    overhang: f64,
}

impl RegulatedCurve {
    /// Loss the cap forgoes at the largest budget (regulated minus unregulated).
    pub fn overhang(&self) -> f64 {
        self.overhang
    }

    pub fn frozen_loss(&self) -> f64 {
        self.values[self.cap_index]
    }
}
