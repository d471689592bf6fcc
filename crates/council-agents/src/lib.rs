//! LLM-backed reviewers and the council pipeline stage.

pub mod chat_reviewer;
pub mod config;
pub mod prompts;
pub mod stage;

pub use chat_reviewer::ChatReviewer;
pub use config::{CouncilFile, EndpointConfig};
pub use stage::{run_stage, StageError, StageOutput};
