//! Fixed conditional-probability lookup `P(observation | hypothesis)`.

use serde::{Deserialize, Serialize};

use super::{Hypothesis, Observation};
use crate::error::{SimError, ensure_probability};

/// Rows may drift from one by at most this much before being rejected.
const ROW_SUM_TOLERANCE: f64 = 1e-9;

/// Complete 2x2 likelihood table indexed by hypothesis then observation.
///
/// The table can only be built through [`LikelihoodTable::new`] (or serde, which routes
/// through the same checks), so every instance has probabilities in `[0, 1]` and rows that
/// sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LikelihoodRows", into = "LikelihoodRows")]
pub struct LikelihoodTable {
    probs: [[f64; 2]; 2],
}

impl LikelihoodTable {
    /// Builds a table from `[SAFE, HACKING]` rows of `[SUSPICIOUS, NORMAL]` probabilities.
    pub fn new(probs: [[f64; 2]; 2]) -> Result<Self, SimError> {
        for hypothesis in Hypothesis::ALL {
            let row = probs[hypothesis.index()];
            for observation in Observation::ALL {
                let field = field_name(hypothesis, observation);
                ensure_probability(&field, row[observation.index()])?;
            }
            let sum: f64 = row.iter().sum();
            if (sum - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(SimError::invalid(
                    format!("likelihood.{}", row_name(hypothesis)),
                    format!("row must sum to 1 (got {sum})"),
                ));
            }
        }
        Ok(Self { probs })
    }

    /// Builds a table from the suspicion rate under each hypothesis.
    pub fn from_suspicion_rates(safe: f64, hacking: f64) -> Result<Self, SimError> {
        ensure_probability("likelihood.safe.suspicious", safe)?;
        ensure_probability("likelihood.hacking.suspicious", hacking)?;
        Self::new([[safe, 1.0 - safe], [hacking, 1.0 - hacking]])
    }

    pub fn probability(&self, hypothesis: Hypothesis, observation: Observation) -> f64 {
        self.probs[hypothesis.index()][observation.index()]
    }

    /// `P(SUSPICIOUS | hypothesis)`, the draw threshold used by the generator.
    pub fn suspicion_rate(&self, hypothesis: Hypothesis) -> f64 {
        self.probability(hypothesis, Observation::Suspicious)
    }

    /// `P(obs | HACKING) / P(obs | SAFE)`; infinite when the safe likelihood is zero.
    pub fn likelihood_ratio(&self, observation: Observation) -> f64 {
        let hacking = self.probability(Hypothesis::Hacking, observation);
        let safe = self.probability(Hypothesis::Safe, observation);
        if safe == 0.0 {
            f64::INFINITY
        } else {
            hacking / safe
        }
    }
}

impl Default for LikelihoodTable {
    fn default() -> Self {
        Self {
            probs: [[0.05, 0.95], [0.90, 0.10]],
        }
    }
}

fn row_name(hypothesis: Hypothesis) -> &'static str {
    match hypothesis {
        Hypothesis::Safe => "safe",
        Hypothesis::Hacking => "hacking",
    }
}

fn field_name(hypothesis: Hypothesis, observation: Observation) -> String {
    let column = match observation {
        Observation::Suspicious => "suspicious",
        Observation::Normal => "normal",
    };
    format!("likelihood.{}.{column}", row_name(hypothesis))
}

/// Serialized shape of one likelihood row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LikelihoodRow {
    pub suspicious: f64,
    pub normal: f64,
}

/// Serialized shape of the whole table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LikelihoodRows {
    pub safe: LikelihoodRow,
    pub hacking: LikelihoodRow,
}

impl TryFrom<LikelihoodRows> for LikelihoodTable {
    type Error = SimError;

    fn try_from(rows: LikelihoodRows) -> Result<Self, Self::Error> {
        LikelihoodTable::new([
            [rows.safe.suspicious, rows.safe.normal],
            [rows.hacking.suspicious, rows.hacking.normal],
        ])
    }
}

impl From<LikelihoodTable> for LikelihoodRows {
    fn from(table: LikelihoodTable) -> Self {
        let row = |hypothesis| LikelihoodRow {
            suspicious: table.probability(hypothesis, Observation::Suspicious),
            normal: table.probability(hypothesis, Observation::Normal),
        };
        LikelihoodRows {
            safe: row(Hypothesis::Safe),
            hacking: row(Hypothesis::Hacking),
        }
    }
}
