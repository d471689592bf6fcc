//! Terminal debate outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::decision::{Decision, DecisionSet};

/// How a debate ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateStatus {
    /// Weighted approval met the threshold.
    Consensus,
    /// A veto-capable persona vetoed. Needs human or process intervention.
    Vetoed,
    /// `max_rounds` ran out without consensus (oscillation).
    Exhausted,
}

impl std::fmt::Display for DebateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Consensus => write!(f, "consensus"),
            Self::Vetoed => write!(f, "vetoed"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Result of one `DebateEngine::run` call.
///
/// `Vetoed` and `Exhausted` are modelled outcomes, not errors; callers
/// branch on `status` and should treat both as unsuccessful.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateResult {
    /// Identifier used in the debate's tracing span.
    pub debate_id: String,
    pub status: DebateStatus,
    /// Decisions of the last round that ran.
    pub final_decisions: DecisionSet,
    /// Consensus score of the last round that ran.
    pub score: f64,
    /// Threshold the score was compared against.
    pub threshold: f64,
    pub rounds_used: u32,
    /// The reported veto; set iff `status == Vetoed`.
    pub veto: Option<Decision>,
    /// Every round's decisions, oldest first. The last entry equals `final_decisions`.
    pub history: Vec<DecisionSet>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl DebateResult {
    /// Whether the caller may proceed.
    pub fn is_success(&self) -> bool {
        self.status == DebateStatus::Consensus
    }

    /// Human-readable failure message for `Vetoed` / `Exhausted`.
    pub fn failure_message(&self) -> Option<String> {
        match self.status {
            DebateStatus::Consensus => None,
            DebateStatus::Vetoed => Some(match &self.veto {
                Some(veto) => format!("VETOED by {}: {}", veto.persona_name, veto.reasoning),
                None => "VETOED".to_string(),
            }),
            DebateStatus::Exhausted => Some(format!(
                "Consensus not reached after {} iterations: {:.1}% < {:.1}%",
                self.rounds_used,
                self.score * 100.0,
                self.threshold * 100.0
            )),
        }
    }

    /// Compact summary line.
    pub fn summary_line(&self) -> String {
        let status = match self.status {
            DebateStatus::Consensus => "CONSENSUS",
            DebateStatus::Vetoed => "VETOED",
            DebateStatus::Exhausted => "EXHAUSTED",
        };
        format!(
            "[{}] {} rounds | score={:.1}% threshold={:.1}% | debate={}",
            status,
            self.rounds_used,
            self.score * 100.0,
            self.threshold * 100.0,
            self.debate_id
        )
    }
}
