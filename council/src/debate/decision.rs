//! Per-persona verdicts and the per-round decision set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::persona::Persona;

/// A persona's verdict on the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The artifact is acceptable.
    Approve,
    /// The artifact is not acceptable.
    Reject,
    /// Unconditional block. Only honoured from veto-capable personas.
    Veto,
    /// No vote. Only produced by [`FailurePolicy::Abstain`](super::FailurePolicy::Abstain);
    /// excluded from both sides of the consensus ratio.
    Abstain,
}

impl Outcome {
    /// Upper-case marker as used in the `DECISION:` line and round summaries.
    pub fn marker(self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
            Self::Veto => "VETO",
            Self::Abstain => "ABSTAIN",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
            Self::Veto => write!(f, "veto"),
            Self::Abstain => write!(f, "abstain"),
        }
    }
}

/// One persona's verdict in one round.
///
/// Weight and veto capability are copied from the persona at vote time so
/// the record stays stable even if the caller's registry changes later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub persona_slug: String,
    pub persona_name: String,
    pub weight: f64,
    pub veto_capable: bool,
    pub outcome: Outcome,
    pub reasoning: String,
    /// True when the engine substituted this decision for a failed review.
    #[serde(default)]
    pub synthetic: bool,
}

impl Decision {
    /// Record a persona's verdict.
    ///
    /// A Veto from a persona without veto power is downgraded to Reject.
    pub fn new(persona: &Persona, outcome: Outcome, reasoning: impl Into<String>) -> Self {
        let outcome = if outcome == Outcome::Veto && !persona.veto {
            debug!(
                persona = %persona.slug,
                "Veto from persona without veto power treated as reject"
            );
            Outcome::Reject
        } else {
            outcome
        };

        Self {
            persona_slug: persona.slug.clone(),
            persona_name: persona.name.clone(),
            weight: persona.weight,
            veto_capable: persona.veto,
            outcome,
            reasoning: reasoning.into(),
            synthetic: false,
        }
    }

    /// Stand-in decision for a persona whose review failed.
    pub fn synthetic(persona: &Persona, outcome: Outcome, reasoning: impl Into<String>) -> Self {
        Self {
            synthetic: true,
            ..Self::new(persona, outcome, reasoning)
        }
    }

    /// Whether this decision is a veto that must end the debate.
    pub fn is_veto(&self) -> bool {
        self.veto_capable && self.outcome == Outcome::Veto
    }
}

/// All decisions for one round, in persona registration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionSet {
    /// Round number (1-indexed).
    pub round: u32,
    pub decisions: Vec<Decision>,
    /// When the round's fan-out started.
    pub started_at: DateTime<Utc>,
    /// Wall-clock time until the last review of the round returned.
    pub duration_ms: u64,
}

impl DecisionSet {
    pub fn new(round: u32, decisions: Vec<Decision>) -> Self {
        Self {
            round,
            decisions,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    /// Attach timing captured by the engine.
    pub fn with_timing(mut self, started_at: DateTime<Utc>, duration_ms: u64) -> Self {
        self.started_at = started_at;
        self.duration_ms = duration_ms;
        self
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Decision> {
        self.decisions.iter()
    }

    /// Decision from the persona with the given slug.
    pub fn get(&self, slug: &str) -> Option<&Decision> {
        self.decisions.iter().find(|d| d.persona_slug == slug)
    }

    /// Number of decisions with the given outcome.
    pub fn count(&self, outcome: Outcome) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.outcome == outcome)
            .count()
    }

    /// Number of decisions the engine substituted for failed reviews.
    pub fn synthetic_count(&self) -> usize {
        self.decisions.iter().filter(|d| d.synthetic).count()
    }
}

impl<'a> IntoIterator for &'a DecisionSet {
    type Item = &'a Decision;
    type IntoIter = std::slice::Iter<'a, Decision>;

    fn into_iter(self) -> Self::IntoIter {
        self.decisions.iter()
    }
}
