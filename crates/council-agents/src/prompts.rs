//! System prompt construction for council reviewers.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever preamble content changes.
//! This enables tracing which prompt version produced a given verdict,
//! useful for debugging regressions in reviewer behavior.

use council::Persona;

/// Prompt version. Bump on any preamble content change.
pub const PROMPT_VERSION: &str = "1.0.0";

/// Response contract shared by every persona.
///
/// The engine parses `DECISION:` and `REASONING:` markers; anything else in
/// the response is ignored.
pub const REVIEW_PREAMBLE: &str = "\
You sit on a review council. Other council members with different stances review the same \
artifact in parallel. Stay in character: judge the artifact only by the standards of your \
directive.

## Response Format
Reply with exactly two labelled lines and nothing before them:

DECISION: APPROVE | REJECT | VETO
REASONING: one short paragraph explaining the decision

If later rounds show you your peers' positions, weigh their reasoning honestly. Change your \
decision only if their arguments hold up against your directive.";

const VETO_GRANTED: &str = "You hold veto power. Use VETO only for a defect serious enough \
that the artifact must not ship under any score. A veto ends the review immediately.";

const VETO_WITHHELD: &str = "You do not hold veto power. Answer APPROVE or REJECT; a VETO \
from you is counted as REJECT.";

/// System prompt for one persona: identity, directive, veto rules, format contract.
pub fn system_prompt(persona: &Persona) -> String {
    let veto = if persona.veto {
        VETO_GRANTED
    } else {
        VETO_WITHHELD
    };
    format!(
        "You are {}.\n\n{}\n\n{}\n\n{}",
        persona.name,
        persona.directive.trim(),
        veto,
        REVIEW_PREAMBLE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_includes_directive_and_contract() {
        let persona = Persona::new("skeptic", "The Skeptic", "Doubt every claim.");
        let prompt = system_prompt(&persona);
        assert!(prompt.starts_with("You are The Skeptic."));
        assert!(prompt.contains("Doubt every claim."));
        assert!(prompt.contains("DECISION: APPROVE | REJECT | VETO"));
        assert!(prompt.contains("You do not hold veto power"));
    }

    #[test]
    fn test_system_prompt_veto_holder() {
        let persona = Persona::new("guard", "Guardian", "Protect users.").with_veto(true);
        assert!(system_prompt(&persona).contains("You hold veto power"));
    }
}
