use super::{Hypothesis, LikelihoodTable, Observation};
use crate::error::{SimError, ensure_probability};

/// Exact two-hypothesis Bayes update of `P(HACKING)` after one observation.
///
/// ```text
/// p_data    = P(obs|HACKING)·prior + P(obs|SAFE)·(1 − prior)
/// posterior = P(obs|HACKING)·prior / p_data
/// ```
pub fn update(
    prior: f64,
    observation: Observation,
    table: &LikelihoodTable,
) -> Result<f64, SimError> {
    ensure_probability("prior", prior)?;

    let p_hacking = table.probability(Hypothesis::Hacking, observation);
    let p_safe = table.probability(Hypothesis::Safe, observation);

    let joint_hacking = p_hacking * prior;
    let p_data = joint_hacking + p_safe * (1.0 - prior);
    if p_data <= 0.0 || !p_data.is_finite() {
        return Err(SimError::DegenerateEvidence { observation });
    }

    Ok(joint_hacking / p_data)
}
