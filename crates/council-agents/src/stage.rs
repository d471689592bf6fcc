//! Council pipeline stage.
//!
//! Runs the debate engine over an artifact and turns the two unsuccessful
//! outcomes into stage errors, so an enclosing pipeline aborts on a veto
//! or on non-convergence and proceeds only on consensus.

use council::{
    DebateConfig, DebateEngine, DebateError, DebateResult, DebateStatus, InputArtifact,
    PersonaRegistry, ReviewClient,
};
use thiserror::Error;
use tracing::{error, info};

/// Why the council stage refused to pass the artifact on.
#[derive(Debug, Error)]
pub enum StageError {
    /// Structural problem; no round ran.
    #[error(transparent)]
    Debate(#[from] DebateError),

    /// A veto-capable persona blocked the artifact.
    #[error("{message}")]
    Vetoed {
        message: String,
        result: Box<DebateResult>,
    },

    /// The round budget ran out (oscillation).
    #[error("{message}")]
    Exhausted {
        message: String,
        result: Box<DebateResult>,
    },
}

impl StageError {
    /// The debate record, when a debate actually ran.
    pub fn result(&self) -> Option<&DebateResult> {
        match self {
            Self::Debate(_) => None,
            Self::Vetoed { result, .. } | Self::Exhausted { result, .. } => Some(&**result),
        }
    }
}

/// Artifact approved by the council, with the debate attached.
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub text: String,
    pub result: DebateResult,
}

/// Run the council over `input`.
pub async fn run_stage<C: ReviewClient>(
    engine: &DebateEngine<C>,
    input: InputArtifact,
    registry: &PersonaRegistry,
    config: &DebateConfig,
) -> Result<StageOutput, StageError> {
    let result = engine.run(&input, registry, config).await?;
    info!(summary = %result.summary_line(), "Council stage finished");

    let message = result.failure_message().unwrap_or_default();
    match result.status {
        DebateStatus::Consensus => Ok(StageOutput {
            text: input.text,
            result,
        }),
        DebateStatus::Vetoed => {
            error!(%message, "Council stage aborted by veto");
            Err(StageError::Vetoed {
                message,
                result: Box::new(result),
            })
        }
        DebateStatus::Exhausted => {
            error!(%message, "Council stage aborted, oscillation detected");
            Err(StageError::Exhausted {
                message,
                result: Box::new(result),
            })
        }
    }
}
