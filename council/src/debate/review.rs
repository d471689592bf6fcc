//! Review client boundary.
//!
//! The engine asks a [`ReviewClient`] for one persona's verdict on one
//! round prompt. How the underlying model is chosen, retried or billed is
//! the client's business. Clients must enforce their own timeouts and
//! return an error rather than hang.
//!
//! Text responses follow a marker contract:
//!
//! ```text
//! DECISION: APPROVE | REJECT | VETO
//! REASONING: free-form explanation
//! ```

use std::collections::HashMap;
use std::sync::{LazyLock, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persona::Persona;

use super::decision::Outcome;

static DECISION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)DECISION[*_`]*\s*:[*_`\s]*(APPROVE|REJECT|VETO)[A-Z]*")
        .expect("DECISION_MARKER regex should compile")
});

static REASONING_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)REASONING[*_`]*\s*:[*_`\s]*(.*)")
        .expect("REASONING_MARKER regex should compile")
});

/// Errors from a single persona review. Never surfaced to the debate caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    #[error("request failed: {0}")]
    RequestFailed(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("reviewer unavailable: {0}")]
    Unavailable(String),
}

/// A persona's parsed verdict, before the engine stamps persona metadata on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    pub outcome: Outcome,
    pub reasoning: String,
}

impl ReviewVerdict {
    pub fn new(outcome: Outcome, reasoning: impl Into<String>) -> Self {
        Self {
            outcome,
            reasoning: reasoning.into(),
        }
    }

    pub fn approve(reasoning: impl Into<String>) -> Self {
        Self::new(Outcome::Approve, reasoning)
    }

    pub fn reject(reasoning: impl Into<String>) -> Self {
        Self::new(Outcome::Reject, reasoning)
    }

    pub fn veto(reasoning: impl Into<String>) -> Self {
        Self::new(Outcome::Veto, reasoning)
    }

    /// Lenient parse: a response without a `DECISION:` marker is an approval.
    ///
    /// This is fail-open. Use [`parse_strict`](Self::parse_strict) to route
    /// unparseable responses through the engine's failure policy instead.
    pub fn parse(response: &str) -> Self {
        let outcome = parse_outcome(response).unwrap_or(Outcome::Approve);
        Self {
            outcome,
            reasoning: parse_reasoning(response),
        }
    }

    /// Strict parse: a missing `DECISION:` marker is an error.
    pub fn parse_strict(response: &str) -> Result<Self, ReviewError> {
        let outcome = parse_outcome(response).ok_or_else(|| {
            ReviewError::MalformedResponse(format!(
                "no DECISION marker in {} byte response",
                response.len()
            ))
        })?;
        Ok(Self {
            outcome,
            reasoning: parse_reasoning(response),
        })
    }
}

fn parse_outcome(response: &str) -> Option<Outcome> {
    let caps = DECISION_MARKER.captures(response)?;
    match caps.get(1)?.as_str().to_ascii_uppercase().as_str() {
        "APPROVE" => Some(Outcome::Approve),
        "REJECT" => Some(Outcome::Reject),
        "VETO" => Some(Outcome::Veto),
        _ => None,
    }
}

/// Text after `REASONING:`, minus any stray DECISION line; the whole
/// body when there is no usable marker.
fn parse_reasoning(response: &str) -> String {
    let marked = REASONING_MARKER
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .lines()
                .filter(|line| !DECISION_MARKER.is_match(line))
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .filter(|s| !s.is_empty());

    marked.unwrap_or_else(|| response.trim().to_string())
}

/// Capability the engine needs from the LLM-access layer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReviewClient: Send + Sync {
    /// Review `prompt` in the voice of `persona`.
    async fn review(&self, persona: &Persona, prompt: &str) -> Result<ReviewVerdict, ReviewError>;
}

#[async_trait]
impl<T: ReviewClient + ?Sized> ReviewClient for std::sync::Arc<T> {
    async fn review(&self, persona: &Persona, prompt: &str) -> Result<ReviewVerdict, ReviewError> {
        (**self).review(persona, prompt).await
    }
}

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Verdict(ReviewVerdict),
    Fail(ReviewError),
}

/// A recorded call to a [`ScriptedReviewer`].
#[derive(Debug, Clone)]
pub struct ReviewCall {
    pub persona_slug: String,
    pub prompt: String,
}

/// Deterministic reviewer for tests and dry runs.
///
/// Each persona gets a list of replies consumed one per call (one per
/// round); the last reply repeats once the list runs out. Personas with no
/// script fail with [`ReviewError::Unavailable`].
#[derive(Debug, Default)]
pub struct ScriptedReviewer {
    scripts: HashMap<String, Vec<ScriptedReply>>,
    delays: HashMap<String, Duration>,
    cursors: Mutex<HashMap<String, usize>>,
    calls: Mutex<Vec<ReviewCall>>,
}

impl ScriptedReviewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a sequence of replies for a persona.
    pub fn script(mut self, slug: &str, replies: Vec<ScriptedReply>) -> Self {
        self.scripts.insert(slug.to_string(), replies);
        self
    }

    /// Same verdict every round.
    pub fn always(self, slug: &str, outcome: Outcome, reasoning: &str) -> Self {
        self.script(
            slug,
            vec![ScriptedReply::Verdict(ReviewVerdict::new(outcome, reasoning))],
        )
    }

    /// Same failure every round.
    pub fn failing(self, slug: &str, error: ReviewError) -> Self {
        self.script(slug, vec![ScriptedReply::Fail(error)])
    }

    /// Delay every reply for a persona.
    pub fn with_delay(mut self, slug: &str, delay: Duration) -> Self {
        self.delays.insert(slug.to_string(), delay);
        self
    }

    /// All calls received so far, in arrival order.
    pub fn calls(&self) -> Vec<ReviewCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Calls received for one persona.
    pub fn calls_for(&self, slug: &str) -> Vec<ReviewCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.persona_slug == slug)
            .collect()
    }

    fn next_reply(&self, slug: &str) -> Option<ScriptedReply> {
        let replies = self.scripts.get(slug)?;
        let mut cursors = self.cursors.lock().ok()?;
        let cursor = cursors.entry(slug.to_string()).or_insert(0);
        let reply = replies.get(*cursor).or_else(|| replies.last()).cloned();
        *cursor += 1;
        reply
    }
}

#[async_trait]
impl ReviewClient for ScriptedReviewer {
    async fn review(&self, persona: &Persona, prompt: &str) -> Result<ReviewVerdict, ReviewError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ReviewCall {
                persona_slug: persona.slug.clone(),
                prompt: prompt.to_string(),
            });
        }

        if let Some(delay) = self.delays.get(&persona.slug) {
            tokio::time::sleep(*delay).await;
        }

        match self.next_reply(&persona.slug) {
            Some(ScriptedReply::Verdict(verdict)) => Ok(verdict),
            Some(ScriptedReply::Fail(error)) => Err(error),
            None => Err(ReviewError::Unavailable(format!(
                "no script for persona {}",
                persona.slug
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_markers() {
        let verdict = ReviewVerdict::parse(
            "Some preamble.\nDECISION: REJECT\nREASONING: The second paragraph contradicts the first.",
        );
        assert_eq!(verdict.outcome, Outcome::Reject);
        assert_eq!(
            verdict.reasoning,
            "The second paragraph contradicts the first."
        );
    }

    #[test]
    fn test_parse_case_insensitive() {
        let verdict = ReviewVerdict::parse("decision: veto\nreasoning: leaks credentials");
        assert_eq!(verdict.outcome, Outcome::Veto);
        assert_eq!(verdict.reasoning, "leaks credentials");
    }

    #[test]
    fn test_parse_markdown_emphasis() {
        let verdict = ReviewVerdict::parse("**DECISION:** **APPROVE**\n**REASONING:** Solid.");
        assert_eq!(verdict.outcome, Outcome::Approve);
        assert_eq!(verdict.reasoning, "Solid.");
    }

    #[test]
    fn test_parse_reasoning_before_decision() {
        let verdict = ReviewVerdict::parse("REASONING: too long\nDECISION: REJECT");
        assert_eq!(verdict.outcome, Outcome::Reject);
        assert_eq!(verdict.reasoning, "too long");
    }

    #[test]
    fn test_parse_missing_decision_defaults_to_approve() {
        let verdict = ReviewVerdict::parse("Looks reasonable to me overall.");
        assert_eq!(verdict.outcome, Outcome::Approve);
        assert_eq!(verdict.reasoning, "Looks reasonable to me overall.");
    }

    #[test]
    fn test_parse_missing_reasoning_uses_body() {
        let verdict = ReviewVerdict::parse("  DECISION: REJECT because it rambles  ");
        assert_eq!(verdict.outcome, Outcome::Reject);
        assert_eq!(verdict.reasoning, "DECISION: REJECT because it rambles");
    }

    #[test]
    fn test_parse_inflected_decision() {
        let rejected = ReviewVerdict::parse("DECISION: REJECTED\nREASONING: factual errors");
        assert_eq!(rejected.outcome, Outcome::Reject);
        assert_eq!(rejected.reasoning, "factual errors");

        let vetoed = ReviewVerdict::parse("DECISION: VETOED\nREASONING: leaks secrets");
        assert_eq!(vetoed.outcome, Outcome::Veto);

        let approved = ReviewVerdict::parse("**DECISION:** Approved\nREASONING: fine");
        assert_eq!(approved.outcome, Outcome::Approve);

        let strict = ReviewVerdict::parse_strict("DECISION: Vetoes\nREASONING: unsafe").unwrap();
        assert_eq!(strict.outcome, Outcome::Veto);
    }

    #[test]
    fn test_parse_unknown_decision_word() {
        let verdict = ReviewVerdict::parse("DECISION: MAYBE\nREASONING: unsure");
        assert_eq!(verdict.outcome, Outcome::Approve);
    }

    #[test]
    fn test_parse_strict_rejects_missing_marker() {
        let err = ReviewVerdict::parse_strict("I think it is fine").unwrap_err();
        assert!(matches!(err, ReviewError::MalformedResponse(_)));

        let ok = ReviewVerdict::parse_strict("DECISION: APPROVE\nREASONING: ok").unwrap();
        assert_eq!(ok.outcome, Outcome::Approve);
    }

    #[tokio::test]
    async fn test_scripted_reviewer_sequence_and_repeat() {
        let persona = Persona::new("a", "A", "x");
        let reviewer = ScriptedReviewer::new().script(
            "a",
            vec![
                ScriptedReply::Verdict(ReviewVerdict::reject("r1")),
                ScriptedReply::Verdict(ReviewVerdict::approve("r2")),
            ],
        );

        let first = reviewer.review(&persona, "p1").await.unwrap();
        let second = reviewer.review(&persona, "p2").await.unwrap();
        let third = reviewer.review(&persona, "p3").await.unwrap();
        assert_eq!(first.outcome, Outcome::Reject);
        assert_eq!(second.outcome, Outcome::Approve);
        assert_eq!(third.reasoning, "r2");

        let calls = reviewer.calls_for("a");
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].prompt, "p3");
    }

    #[tokio::test]
    async fn test_scripted_reviewer_unknown_persona() {
        let reviewer = ScriptedReviewer::new();
        let err = reviewer
            .review(&Persona::new("ghost", "Ghost", ""), "p")
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_arc_forwarding() {
        let reviewer =
            std::sync::Arc::new(ScriptedReviewer::new().always("a", Outcome::Veto, "no"));
        let verdict = reviewer
            .review(&Persona::new("a", "A", ""), "p")
            .await
            .unwrap();
        assert_eq!(verdict.outcome, Outcome::Veto);
    }
}
