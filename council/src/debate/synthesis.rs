//! Round prompt construction and cross-round synthesis.
//!
//! Round 1 sees the base directive, the axioms and the artifact. Every
//! later round additionally sees a summary of the previous round's
//! decisions so each persona can revise its stance after reading its peers.

use crate::persona::Axiom;

use super::decision::DecisionSet;

/// Instruction placed at the top of every round prompt unless overridden.
pub const DEFAULT_BASE_DIRECTIVE: &str = "Review the artifact below strictly from your own \
perspective. Judge it against the axioms, state whether it should be approved, and explain \
the single most important reason for your decision.";

/// Builds the summary of round `r` that is appended to round `r + 1`.
pub struct RoundSynthesizer;

impl RoundSynthesizer {
    /// Render one line per decision, in registration order:
    /// `<name> (<slug>): <OUTCOME> - <reasoning>`.
    pub fn summarize(previous: &DecisionSet) -> String {
        let lines = previous
            .iter()
            .map(|d| {
                format!(
                    "{} ({}): {} - {}",
                    d.persona_name,
                    d.persona_slug,
                    d.outcome.marker(),
                    single_line(&d.reasoning)
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "## Round {} Council Positions\n\n{}\n\nYou have now seen your peers' reasoning. \
             You may revise your stance if their arguments persuade you, or hold it if they do not.",
            previous.round, lines
        )
    }
}

/// Prompt inputs that stay fixed for the whole debate.
#[derive(Debug, Clone, Copy)]
pub struct RoundPrompt<'a> {
    pub base_directive: &'a str,
    pub axioms: &'a [Axiom],
    pub text: &'a str,
}

impl<'a> RoundPrompt<'a> {
    pub fn new(base_directive: &'a str, axioms: &'a [Axiom], text: &'a str) -> Self {
        Self {
            base_directive,
            axioms,
            text,
        }
    }

    /// Prompt for the round following `previous`, or for round 1 when `None`.
    pub fn build(&self, previous: Option<&DecisionSet>) -> String {
        let mut prompt = String::with_capacity(self.text.len() + 512);
        prompt.push_str(self.base_directive.trim());

        if !self.axioms.is_empty() {
            prompt.push_str("\n\n## Axioms\n\n");
            let axioms = self
                .axioms
                .iter()
                .map(|a| format!("- {}: {}", a.title, a.statement))
                .collect::<Vec<_>>()
                .join("\n");
            prompt.push_str(&axioms);
        }

        prompt.push_str("\n\n## Artifact\n\n");
        prompt.push_str(self.text);

        if let Some(previous) = previous {
            prompt.push_str("\n\n");
            prompt.push_str(&RoundSynthesizer::summarize(previous));
        }

        prompt
    }
}

fn single_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
