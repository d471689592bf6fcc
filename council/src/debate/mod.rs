//! Debate Engine: Weighted Persona Council
//!
//! Runs an artifact past a weighted council of personas, round after round,
//! until the council agrees, a veto-capable persona blocks it, or the
//! round budget runs out.
//!
//! # Debate Flow
//!
//! ```text
//! run() ─ validate config / input / personas ──✗──→ DebateError
//!   │
//!   ▼
//! Round r: build prompt (r > 1 adds RoundSynthesizer summary of r-1)
//!   │
//!   ├─ fan out ReviewClient::review to every active persona (concurrent)
//!   │     └─ failure → synthetic decision per FailurePolicy
//!   ├─ join (registration order) → DecisionSet
//!   │
//!   ├─ find_veto?           ── yes → Vetoed
//!   ├─ consensus reached?   ── yes → Consensus
//!   ├─ r == max_rounds?     ── yes → Exhausted
//!   └─ r += 1 and loop
//! ```

pub mod consensus;
pub mod decision;
pub mod engine;
pub mod outcome;
pub mod review;
pub mod synthesis;
pub mod veto;

pub use consensus::{ConsensusCalculator, ConsensusResult};
pub use decision::{Decision, DecisionSet, Outcome};
pub use engine::{DebateConfig, DebateEngine, DebateError, FailurePolicy, InputArtifact};
pub use outcome::{DebateResult, DebateStatus};
pub use review::{
    ReviewCall, ReviewClient, ReviewError, ReviewVerdict, ScriptedReply, ScriptedReviewer,
};
pub use synthesis::{RoundPrompt, RoundSynthesizer, DEFAULT_BASE_DIRECTIVE};
pub use veto::find_veto;
