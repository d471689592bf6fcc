//! OpenTelemetry-Compatible Span Helpers
//!
//! Structured `tracing` span builders for the debate engine. All spans use
//! dot-notation field names compatible with OpenTelemetry semantic
//! conventions; result fields start empty and are recorded once known.
//!
//! # Span Hierarchy
//!
//! ```text
//! council.debate          (root: one per DebateEngine::run)
//!   └─ council.round      (one per fan-out wave)
//!       └─ council.review (one per persona per round)
//! ```

use tracing::Span;

use crate::debate::{ConsensusResult, DebateResult};

/// Root span for one debate.
pub const SPAN_DEBATE: &str = "council.debate";

/// One round of concurrent persona reviews.
pub const SPAN_ROUND: &str = "council.round";

/// One persona review call.
pub const SPAN_REVIEW: &str = "council.review";

/// Create the root span for a debate.
///
/// Fields filled later via [`record_debate_result`]: `council.status`,
/// `council.rounds_used`, `council.score`, `council.duration_ms`.
pub fn debate_span(debate_id: &str, personas: usize, threshold: f64, max_rounds: u32) -> Span {
    tracing::info_span!(
        "council.debate",
        "debate.id" = %debate_id,
        "council.personas" = personas,
        "council.threshold" = threshold,
        "council.max_rounds" = max_rounds,
        "council.status" = tracing::field::Empty,
        "council.rounds_used" = tracing::field::Empty,
        "council.score" = tracing::field::Empty,
        "council.duration_ms" = tracing::field::Empty,
    )
}

/// Record the terminal result on a debate span.
pub fn record_debate_result(span: &Span, result: &DebateResult) {
    span.record("council.status", tracing::field::display(result.status));
    span.record("council.rounds_used", result.rounds_used);
    span.record("council.score", result.score);
    span.record("council.duration_ms", result.duration_ms);
}

/// Create a span for one round.
///
/// Fields filled later via [`record_round_result`].
pub fn round_span(round: u32) -> Span {
    tracing::info_span!(
        "council.round",
        "council.round.number" = round,
        "council.score" = tracing::field::Empty,
        "council.reached" = tracing::field::Empty,
        "council.synthetic" = tracing::field::Empty,
        "council.duration_ms" = tracing::field::Empty,
    )
}

/// Record the scored result of a round.
pub fn record_round_result(
    span: &Span,
    consensus: &ConsensusResult,
    synthetic: usize,
    duration_ms: u64,
) {
    span.record("council.score", consensus.score);
    span.record("council.reached", consensus.reached);
    span.record("council.synthetic", synthetic);
    span.record("council.duration_ms", duration_ms);
}

/// Create a span for one persona review.
pub fn review_span(persona: &str, round: u32) -> Span {
    tracing::debug_span!(
        "council.review",
        "persona.slug" = %persona,
        "council.round.number" = round,
        "council.outcome" = tracing::field::Empty,
        "council.failed" = tracing::field::Empty,
    )
}

/// Record how a review ended.
pub fn record_review_result(span: &Span, outcome: &str, failed: bool) {
    span.record("council.outcome", outcome);
    span.record("council.failed", failed);
}
