//! Debate engine: drives the multi-round persona review loop.
//!
//! Ties together prompt synthesis, concurrent review fan-out, veto
//! resolution and consensus scoring to run one debate end-to-end.
//!
//! Each `run` call is self-contained: the engine holds no per-debate state,
//! so independent debates may share one engine concurrently.

use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn, Instrument, Span};
use uuid::Uuid;

use crate::otel;
use crate::persona::{Axiom, Persona, PersonaRegistry};

use super::consensus::ConsensusCalculator;
use super::decision::{Decision, DecisionSet, Outcome};
use super::outcome::{DebateResult, DebateStatus};
use super::review::{ReviewClient, ReviewError};
use super::synthesis::{RoundPrompt, DEFAULT_BASE_DIRECTIVE};
use super::veto::find_veto;

/// Structural errors. Returned before any round runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DebateError {
    #[error("no active personas to debate")]
    NoPersonas,

    #[error("input artifact text is empty")]
    EmptyInput,

    #[error("invalid debate config: {0}")]
    InvalidConfig(String),

    #[error("invalid persona '{slug}': {reason}")]
    InvalidPersona { slug: String, reason: String },

    #[error("duplicate persona slug: {0}")]
    DuplicatePersona(String),
}

/// What a failed review counts as.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Fail-open: a crashed reviewer endorses the artifact.
    #[default]
    Approve,
    /// Fail-closed: a crashed reviewer rejects the artifact.
    Reject,
    /// A crashed reviewer is excluded from the consensus ratio.
    Abstain,
}

impl FailurePolicy {
    pub fn outcome(self) -> Outcome {
        match self {
            Self::Approve => Outcome::Approve,
            Self::Reject => Outcome::Reject,
            Self::Abstain => Outcome::Abstain,
        }
    }

    /// Reasoning recorded on the synthetic decision.
    pub fn reasoning(self, cause: &ReviewError) -> String {
        match self {
            Self::Approve => format!("unavailable: {cause}, defaulting to approval"),
            Self::Reject => format!("unavailable: {cause}, defaulting to rejection"),
            Self::Abstain => format!("unavailable: {cause}, abstaining"),
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
            Self::Abstain => write!(f, "abstain"),
        }
    }
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "abstain" => Ok(Self::Abstain),
            other => Err(format!(
                "unknown failure policy '{other}' (expected approve, reject or abstain)"
            )),
        }
    }
}

/// Per-invocation debate settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateConfig {
    /// Minimum weighted approval ratio, in (0, 1].
    pub threshold: f64,
    /// Round budget. `1` gives a single-pass council.
    pub max_rounds: u32,
    /// What a failed review counts as.
    pub on_failure: FailurePolicy,
    /// Instruction placed at the top of every round prompt.
    pub base_directive: String,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            threshold: 0.70,
            max_rounds: 25,
            on_failure: FailurePolicy::default(),
            base_directive: DEFAULT_BASE_DIRECTIVE.to_string(),
        }
    }
}

impl DebateConfig {
    /// Single-round council with the default threshold.
    pub fn single_round() -> Self {
        Self {
            max_rounds: 1,
            ..Default::default()
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_failure_policy(mut self, on_failure: FailurePolicy) -> Self {
        self.on_failure = on_failure;
        self
    }

    pub fn validate(&self) -> Result<(), DebateError> {
        if !self.threshold.is_finite() || self.threshold <= 0.0 || self.threshold > 1.0 {
            return Err(DebateError::InvalidConfig(format!(
                "threshold must be in (0, 1], got {}",
                self.threshold
            )));
        }
        if self.max_rounds < 1 {
            return Err(DebateError::InvalidConfig(
                "max_rounds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// The artifact under review plus the axioms forwarded to every persona.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputArtifact {
    pub text: String,
    #[serde(default)]
    pub axioms: Vec<Axiom>,
}

impl InputArtifact {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            axioms: Vec::new(),
        }
    }

    pub fn with_axioms(mut self, axioms: Vec<Axiom>) -> Self {
        self.axioms = axioms;
        self
    }
}

/// Orchestrates debates over an injected [`ReviewClient`].
pub struct DebateEngine<C> {
    client: C,
}

impl<C: ReviewClient> DebateEngine<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run a debate to consensus, veto or exhaustion.
    ///
    /// Only structural problems are errors. Review failures are folded into
    /// synthetic decisions per `config.on_failure`.
    pub async fn run(
        &self,
        input: &InputArtifact,
        registry: &PersonaRegistry,
        config: &DebateConfig,
    ) -> Result<DebateResult, DebateError> {
        config.validate()?;
        if input.text.trim().is_empty() {
            return Err(DebateError::EmptyInput);
        }
        let personas = registry.active();
        if personas.is_empty() {
            return Err(DebateError::NoPersonas);
        }

        let debate_id = Uuid::new_v4().to_string();
        let span = otel::debate_span(
            &debate_id,
            personas.len(),
            config.threshold,
            config.max_rounds,
        );

        let result = self
            .debate(debate_id, input, &personas, config)
            .instrument(span.clone())
            .await;

        otel::record_debate_result(&span, &result);
        Ok(result)
    }

    async fn debate(
        &self,
        debate_id: String,
        input: &InputArtifact,
        personas: &[&Persona],
        config: &DebateConfig,
    ) -> DebateResult {
        let started_at = Utc::now();
        let clock = Instant::now();
        let calculator = ConsensusCalculator::new(config.threshold);
        let prompt = RoundPrompt::new(&config.base_directive, &input.axioms, &input.text);
        let mut history: Vec<DecisionSet> = Vec::new();
        let mut round: u32 = 1;

        info!(
            personas = personas.len(),
            threshold = config.threshold,
            max_rounds = config.max_rounds,
            on_failure = %config.on_failure,
            "Debate starting"
        );

        loop {
            let round_prompt = prompt.build(history.last());
            let span = otel::round_span(round);
            let decisions = self
                .run_round(round, personas, &round_prompt, config.on_failure)
                .instrument(span.clone())
                .await;

            let veto = find_veto(&decisions.decisions).cloned();
            let consensus = calculator.score(&decisions.decisions);
            otel::record_round_result(
                &span,
                &consensus,
                decisions.synthetic_count(),
                decisions.duration_ms,
            );

            info!(
                round,
                score = consensus.score,
                approval_weight = consensus.approval_weight,
                total_weight = consensus.total_weight,
                reached = consensus.reached,
                vetoed = veto.is_some(),
                "Round complete"
            );

            let status = if veto.is_some() {
                Some(DebateStatus::Vetoed)
            } else if consensus.reached {
                Some(DebateStatus::Consensus)
            } else if round >= config.max_rounds {
                Some(DebateStatus::Exhausted)
            } else {
                None
            };

            history.push(decisions);

            if let Some(status) = status {
                match status {
                    DebateStatus::Vetoed => {
                        if let Some(ref v) = veto {
                            warn!(round, persona = %v.persona_slug, "Debate vetoed");
                        }
                    }
                    DebateStatus::Exhausted => {
                        warn!(rounds = round, score = consensus.score, "Debate exhausted");
                    }
                    DebateStatus::Consensus => info!(round, "Consensus reached"),
                }

                let final_decisions = history
                    .last()
                    .cloned()
                    .unwrap_or_else(|| DecisionSet::new(round, Vec::new()));

                return DebateResult {
                    debate_id,
                    status,
                    final_decisions,
                    score: consensus.score,
                    threshold: config.threshold,
                    rounds_used: round,
                    veto,
                    history,
                    started_at,
                    duration_ms: clock.elapsed().as_millis() as u64,
                };
            }

            round += 1;
        }
    }

    /// Fan out one round to every persona concurrently and wait for all.
    ///
    /// Results are collected by registration position, not completion order.
    async fn run_round(
        &self,
        round: u32,
        personas: &[&Persona],
        prompt: &str,
        on_failure: FailurePolicy,
    ) -> DecisionSet {
        let started_at = Utc::now();
        let clock = Instant::now();

        let reviews = personas.iter().copied().map(|persona| {
            let span = otel::review_span(&persona.slug, round);
            async move {
                let decision = match self.client.review(persona, prompt).await {
                    Ok(verdict) => Decision::new(persona, verdict.outcome, verdict.reasoning),
                    Err(e) => {
                        warn!(
                            persona = %persona.slug,
                            round,
                            error = %e,
                            policy = %on_failure,
                            "Review failed, substituting synthetic decision"
                        );
                        Decision::synthetic(
                            persona,
                            on_failure.outcome(),
                            on_failure.reasoning(&e),
                        )
                    }
                };
                otel::record_review_result(
                    &Span::current(),
                    decision.outcome.marker(),
                    decision.synthetic,
                );
                decision
            }
            .instrument(span)
        });

        let decisions = join_all(reviews).await;
        DecisionSet::new(round, decisions)
            .with_timing(started_at, clock.elapsed().as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debate::review::{MockReviewClient, ReviewVerdict};

    fn registry(personas: Vec<Persona>) -> PersonaRegistry {
        PersonaRegistry::new(personas).unwrap()
    }

    #[test]
    fn test_config_defaults() {
        let config = DebateConfig::default();
        assert!((config.threshold - 0.70).abs() < f64::EPSILON);
        assert_eq!(config.max_rounds, 25);
        assert_eq!(config.on_failure, FailurePolicy::Approve);
        assert_eq!(DebateConfig::single_round().max_rounds, 1);
    }

    #[test]
    fn test_config_validation() {
        assert!(DebateConfig::default().validate().is_ok());
        assert!(DebateConfig::default().with_threshold(1.0).validate().is_ok());
        assert!(DebateConfig::default().with_threshold(0.0).validate().is_err());
        assert!(DebateConfig::default().with_threshold(1.01).validate().is_err());
        assert!(DebateConfig::default()
            .with_threshold(f64::NAN)
            .validate()
            .is_err());
        assert!(DebateConfig::default().with_max_rounds(0).validate().is_err());
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: DebateConfig =
            serde_json::from_str(r#"{"threshold": 0.5, "on_failure": "abstain"}"#).unwrap();
        assert!((config.threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.max_rounds, 25);
        assert_eq!(config.on_failure, FailurePolicy::Abstain);
    }

    #[test]
    fn test_failure_policy_parse_and_reasoning() {
        assert_eq!("Reject".parse::<FailurePolicy>().unwrap(), FailurePolicy::Reject);
        assert!("maybe".parse::<FailurePolicy>().is_err());

        let cause = ReviewError::RequestFailed("connection reset".to_string());
        assert_eq!(
            FailurePolicy::Approve.reasoning(&cause),
            "unavailable: request failed: connection reset, defaulting to approval"
        );
        assert!(FailurePolicy::Abstain.reasoning(&cause).ends_with("abstaining"));
    }

    #[tokio::test]
    async fn test_invalid_config_runs_no_rounds() {
        let mut client = MockReviewClient::new();
        client.expect_review().never();
        let engine = DebateEngine::new(client);

        let err = engine
            .run(
                &InputArtifact::new("text"),
                &registry(vec![Persona::new("a", "A", "x")]),
                &DebateConfig::default().with_max_rounds(0),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DebateError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let mut client = MockReviewClient::new();
        client.expect_review().never();
        let engine = DebateEngine::new(client);

        let err = engine
            .run(
                &InputArtifact::new("   "),
                &registry(vec![Persona::new("a", "A", "x")]),
                &DebateConfig::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, DebateError::EmptyInput);
    }

    #[tokio::test]
    async fn test_all_disabled_is_no_personas() {
        let mut client = MockReviewClient::new();
        client.expect_review().never();
        let engine = DebateEngine::new(client);

        let err = engine
            .run(
                &InputArtifact::new("text"),
                &registry(vec![Persona::new("a", "A", "x").with_enabled(false)]),
                &DebateConfig::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, DebateError::NoPersonas);
    }

    #[tokio::test]
    async fn test_one_call_per_active_persona() {
        let mut client = MockReviewClient::new();
        client
            .expect_review()
            .withf(|persona, _prompt| persona.slug != "off")
            .times(2)
            .returning(|_, _| Ok(ReviewVerdict::approve("fine")));
        let engine = DebateEngine::new(client);

        let result = engine
            .run(
                &InputArtifact::new("text"),
                &registry(vec![
                    Persona::new("a", "A", "x"),
                    Persona::new("off", "Off", "x").with_enabled(false),
                    Persona::new("b", "B", "y"),
                ]),
                &DebateConfig::default(),
            )
            .await
            .unwrap();

        assert_eq!(result.status, DebateStatus::Consensus);
        assert_eq!(result.final_decisions.len(), 2);
        assert!(result.final_decisions.get("off").is_none());
    }

    #[tokio::test]
    async fn test_non_veto_persona_veto_is_reject() {
        let mut client = MockReviewClient::new();
        client
            .expect_review()
            .returning(|_, _| Ok(ReviewVerdict::veto("absolutely not")));
        let engine = DebateEngine::new(client);

        let result = engine
            .run(
                &InputArtifact::new("text"),
                &registry(vec![Persona::new("a", "A", "x")]),
                &DebateConfig::single_round(),
            )
            .await
            .unwrap();

        assert_eq!(result.status, DebateStatus::Exhausted);
        assert!(result.veto.is_none());
        assert_eq!(
            result.final_decisions.get("a").unwrap().outcome,
            Outcome::Reject
        );
    }

    #[tokio::test]
    async fn test_failure_policy_reject_blocks_consensus() {
        let mut client = MockReviewClient::new();
        client
            .expect_review()
            .returning(|_, _| Err(ReviewError::Timeout(std::time::Duration::from_secs(30))));
        let engine = DebateEngine::new(client);

        let result = engine
            .run(
                &InputArtifact::new("text"),
                &registry(vec![Persona::new("a", "A", "x")]),
                &DebateConfig::single_round().with_failure_policy(FailurePolicy::Reject),
            )
            .await
            .unwrap();

        assert_eq!(result.status, DebateStatus::Exhausted);
        let decision = result.final_decisions.get("a").unwrap();
        assert!(decision.synthetic);
        assert_eq!(decision.outcome, Outcome::Reject);
        assert!(decision.reasoning.contains("defaulting to rejection"));
    }

    #[tokio::test]
    async fn test_second_round_prompt_carries_summary() {
        let mut client = MockReviewClient::new();
        let mut seq = mockall::Sequence::new();
        client
            .expect_review()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|_, prompt| !prompt.contains("Council Positions"))
            .returning(|_, _| Ok(ReviewVerdict::reject("needs sources")));
        client
            .expect_review()
            .times(1)
            .in_sequence(&mut seq)
            .withf(|_, prompt| prompt.contains("A (a): REJECT - needs sources"))
            .returning(|_, _| Ok(ReviewVerdict::approve("convinced")));
        let engine = DebateEngine::new(client);

        let result = engine
            .run(
                &InputArtifact::new("text"),
                &registry(vec![Persona::new("a", "A", "x")]),
                &DebateConfig::default().with_max_rounds(5),
            )
            .await
            .unwrap();

        assert_eq!(result.status, DebateStatus::Consensus);
        assert_eq!(result.rounds_used, 2);
        assert_eq!(result.history.len(), 2);
        assert_eq!(result.history[0].round, 1);
        assert_eq!(result.history[1].round, 2);
    }
}
