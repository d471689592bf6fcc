//! Consensus calculation: weighted approval ratio against a threshold.

use serde::{Deserialize, Serialize};

use super::decision::{Decision, Outcome};

/// Result of scoring one round's decisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// Sum of weights of Approve decisions.
    pub approval_weight: f64,
    /// Sum of weights of all non-abstaining decisions.
    pub total_weight: f64,
    /// `approval_weight / total_weight`, or 0.0 when nothing was weighed.
    pub score: f64,
    /// Threshold the score was compared against.
    pub threshold: f64,
    /// Whether `score >= threshold`.
    pub reached: bool,
}

/// Pure weighted-vote scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConsensusCalculator {
    /// Minimum approval ratio for consensus, in (0, 1].
    pub threshold: f64,
}

impl ConsensusCalculator {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Score a set of decisions.
    ///
    /// Reject and Veto count against, Abstain counts nowhere. With zero
    /// total weight the score is 0.0 and consensus is never reached.
    pub fn score(&self, decisions: &[Decision]) -> ConsensusResult {
        let mut approval_weight = 0.0;
        let mut total_weight = 0.0;

        for decision in decisions {
            match decision.outcome {
                Outcome::Approve => {
                    approval_weight += decision.weight;
                    total_weight += decision.weight;
                }
                Outcome::Reject | Outcome::Veto => total_weight += decision.weight,
                Outcome::Abstain => {}
            }
        }

        let score = if total_weight > 0.0 {
            approval_weight / total_weight
        } else {
            0.0
        };

        ConsensusResult {
            approval_weight,
            total_weight,
            score,
            threshold: self.threshold,
            reached: total_weight > 0.0 && score >= self.threshold,
        }
    }
}

impl Default for ConsensusCalculator {
    fn default() -> Self {
        Self { threshold: 0.7 }
    }
}
