//! Persona Council Library
//!
//! This library provides a multi-persona adversarial debate engine:
//! - Weighted personas with optional veto power
//! - Concurrent per-round review fan-out through an injected `ReviewClient`
//! - Weighted consensus scoring against a configurable threshold
//! - Multi-round re-synthesis so personas can revise after seeing peers
//! - Bounded iteration that fails with `Exhausted` on non-convergence
//!
//! # Usage
//!
//! ```rust,ignore
//! use council::{DebateConfig, DebateEngine, InputArtifact, Persona, PersonaRegistry};
//!
//! let registry = PersonaRegistry::new(vec![
//!     Persona::new("skeptic", "The Skeptic", "Attack every unsupported claim.").with_weight(0.6),
//!     Persona::new("guardian", "Guardian", "Block anything unsafe.").with_weight(0.4).with_veto(true),
//! ])?;
//!
//! let engine = DebateEngine::new(my_review_client);
//! let result = engine
//!     .run(&InputArtifact::new(draft), &registry, &DebateConfig::default())
//!     .await?;
//!
//! if let Some(message) = result.failure_message() {
//!     eprintln!("{message}");
//! }
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod debate;
pub mod otel;
pub mod persona;

// Re-export key debate types
pub use debate::{
    find_veto, ConsensusCalculator, ConsensusResult, DebateConfig, DebateEngine, DebateError,
    DebateResult, DebateStatus, Decision, DecisionSet, FailurePolicy, InputArtifact, Outcome,
    ReviewClient, ReviewError, ReviewVerdict, RoundPrompt, RoundSynthesizer, ScriptedReviewer,
};

// Re-export persona types
pub use persona::{Axiom, Persona, PersonaRegistry};
