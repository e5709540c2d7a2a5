use serde::Serialize;

use super::{LikelihoodTable, Observation, update};
use crate::error::SimError;

/// Ordered posteriors produced by folding [`update`] over an observation sequence.
///
/// Index 0 holds the prior, so a trace over `n` observations has `n + 1` beliefs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BeliefTrace {
    beliefs: Vec<f64>,
    observations: Vec<Observation>,
}

impl BeliefTrace {
    pub fn from_observations<I>(
        prior: f64,
        observations: I,
        table: &LikelihoodTable,
    ) -> Result<Self, SimError>
    where
        I: IntoIterator<Item = Observation>,
    {
        let observations = observations.into_iter();
        let (hint, _) = observations.size_hint();

        let mut beliefs = Vec::with_capacity(hint + 1);
        let mut seen = Vec::with_capacity(hint);
        beliefs.push(prior);

        let mut current = prior;
        for observation in observations {
            current = update(current, observation, table)?;
            beliefs.push(current);
            seen.push(observation);
        }

        // An empty stream never calls `update`, so validate the prior here too.
        if seen.is_empty() {
            crate::error::ensure_probability("prior", prior)?;
        }

        Ok(Self {
            beliefs,
            observations: seen,
        })
    }

    pub fn beliefs(&self) -> &[f64] {
        &self.beliefs
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn prior(&self) -> f64 {
        self.beliefs[0]
    }

    pub fn final_belief(&self) -> f64 {
        self.beliefs[self.beliefs.len() - 1]
    }

    pub fn steps(&self) -> usize {
        self.observations.len()
    }

    pub fn suspicious_count(&self) -> usize {
        self.observations
            .iter()
            .filter(|obs| obs.is_suspicious())
            .count()
    }

    /// First index whose belief is strictly greater than `threshold`.
    pub fn first_crossing(&self, threshold: f64) -> Result<usize, SimError> {
        if !threshold.is_finite() || threshold <= 0.0 || threshold >= 1.0 {
            return Err(SimError::invalid(
                "threshold",
                format!("threshold must lie in (0, 1) (got {threshold})"),
            ));
        }

        self.beliefs
            .iter()
            .position(|belief| *belief > threshold)
            .ok_or(SimError::ThresholdNeverCrossed {
                threshold,
                steps: self.steps(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_prior_at_index_zero() {
        let table = LikelihoodTable::default();
        let trace = BeliefTrace::from_observations(
            0.5,
            [Observation::Suspicious, Observation::Normal],
            &table,
        )
        .expect("trace");
        assert_eq!(trace.beliefs().len(), 3);
        assert_eq!(trace.prior(), 0.5);
        assert_eq!(trace.steps(), 2);
        assert_eq!(trace.suspicious_count(), 1);
    }

    #[test]
    fn repeated_suspicious_signals_never_lower_belief() {
        let table = LikelihoodTable::default();
        let trace = BeliefTrace::from_observations(
            0.01,
            std::iter::repeat(Observation::Suspicious).take(40),
            &table,
        )
        .expect("trace");
        assert!(
            trace
                .beliefs()
                .windows(2)
                .all(|pair| pair[1] >= pair[0])
        );
    }

    #[test]
    fn first_crossing_is_strict() {
        let table = LikelihoodTable::default();
        let trace = BeliefTrace::from_observations(
            0.5,
            [Observation::Suspicious, Observation::Suspicious],
            &table,
        )
        .expect("trace");

        assert_eq!(trace.first_crossing(0.9).expect("crosses"), 1);
        // The prior itself equals 0.5 and must not count as crossing 0.5.
        assert_eq!(trace.first_crossing(0.5).expect("crosses"), 1);
        assert_eq!(trace.first_crossing(0.99).expect("crosses"), 2);
    }

    #[test]
    fn missing_crossing_is_recoverable_not_found() {
        let table = LikelihoodTable::default();
        let trace = BeliefTrace::from_observations(
            0.5,
            [Observation::Normal, Observation::Suspicious],
            &table,
        )
        .expect("trace");

        let err = trace.first_crossing(0.99).expect_err("never crosses");
        assert!(err.is_recoverable());
        assert_eq!(
            err,
            SimError::ThresholdNeverCrossed {
                threshold: 0.99,
                steps: 2
            }
        );
    }

    #[test]
    fn rejects_thresholds_outside_open_interval() {
        let table = LikelihoodTable::default();
        let trace =
            BeliefTrace::from_observations(0.5, [Observation::Suspicious], &table).expect("trace");
        assert!(trace.first_crossing(1.0).is_err());
        assert!(trace.first_crossing(0.0).is_err());
    }

    #[test]
    fn empty_stream_still_validates_prior() {
        let table = LikelihoodTable::default();
        assert!(BeliefTrace::from_observations(2.0, Vec::new(), &table).is_err());
        let trace = BeliefTrace::from_observations(0.3, Vec::new(), &table).expect("trace");
        assert_eq!(trace.final_belief(), 0.3);
    }
}
