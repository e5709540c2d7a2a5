use thiserror::Error;

use crate::belief::Observation;

/// Coarse classification of [`SimError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Parameters outside their valid range (counts, probabilities, caps).
    Configuration,
    /// A Bayesian normalising constant collapsed to zero.
    NumericDegeneracy,
    /// A query ran past the end of the simulated horizon.
    NotFound,
}

/// Errors surfaced by the simulation core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("{field}: {message}")]
    InvalidParameter { field: String, message: String },
    #[error("degenerate evidence: P({observation}) is zero under both hypotheses")]
    DegenerateEvidence { observation: Observation },
    #[error("belief never exceeded {threshold} within {steps} steps")]
    ThresholdNeverCrossed { threshold: f64, steps: usize },
    #[error("compute cap {cap:e} lies outside the grid range [{min:e}, {max:e}]")]
    CapOutOfRange { cap: f64, min: f64, max: f64 },
}

impl SimError {
    pub(crate) fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        SimError::InvalidParameter {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SimError::InvalidParameter { .. } | SimError::CapOutOfRange { .. } => {
                ErrorCategory::Configuration
            }
            SimError::DegenerateEvidence { .. } => ErrorCategory::NumericDegeneracy,
            SimError::ThresholdNeverCrossed { .. } => ErrorCategory::NotFound,
        }
    }

    /// Only a missed detection is something a caller can report and move past.
    pub fn is_recoverable(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

/// Checks that `value` is a finite probability in `[0, 1]`.
pub(crate) fn ensure_probability(field: &str, value: f64) -> Result<(), SimError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(SimError::invalid(
            field,
            format!("probability must lie in [0, 1] (got {value})"),
        ));
    }
    Ok(())
}

/// Checks that `value` is finite and strictly positive.
pub(crate) fn ensure_positive(field: &str, value: f64) -> Result<(), SimError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SimError::invalid(
            field,
            format!("value must be finite and greater than zero (got {value})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_map_to_taxonomy() {
        let invalid = SimError::invalid("steps", "must be positive");
        assert_eq!(invalid.category(), ErrorCategory::Configuration);

        let cap = SimError::CapOutOfRange {
            cap: 1.0,
            min: 2.0,
            max: 3.0,
        };
        assert_eq!(cap.category(), ErrorCategory::Configuration);

        let degenerate = SimError::DegenerateEvidence {
            observation: Observation::Normal,
        };
        assert_eq!(degenerate.category(), ErrorCategory::NumericDegeneracy);
        assert!(!degenerate.is_recoverable());

        let missed = SimError::ThresholdNeverCrossed {
            threshold: 0.99,
            steps: 5,
        };
        assert!(missed.is_recoverable());
    }

    #[test]
    fn probability_guard_rejects_nan_and_out_of_range() {
        assert!(ensure_probability("p", 0.0).is_ok());
        assert!(ensure_probability("p", 1.0).is_ok());
        assert!(ensure_probability("p", -0.01).is_err());
        assert!(ensure_probability("p", 1.01).is_err());
        assert!(ensure_probability("p", f64::NAN).is_err());
    }

    #[test]
    fn display_includes_field_name() {
        let err = SimError::invalid("belief.prior", "out of range");
        assert_eq!(err.to_string(), "belief.prior: out of range");
    }
}
