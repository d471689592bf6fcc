//! Endpoint settings from the environment and council definition files.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use council::{Axiom, DebateConfig, Persona, PersonaRegistry};
use serde::Deserialize;

/// OpenAI-compatible chat completions endpoint used by every persona.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Base URL including the `/v1` suffix.
    pub url: String,
    pub model: String,
    /// Bearer token. Local servers usually need none.
    pub api_key: Option<String>,
    /// Per-request timeout. The engine imposes none of its own.
    pub timeout: Duration,
    pub temperature: f32,
    /// Treat responses without a `DECISION:` marker as failed reviews.
    pub strict_parse: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("COUNCIL_LLM_URL")
                .unwrap_or_else(|_| "http://localhost:8080/v1".into()),
            model: std::env::var("COUNCIL_LLM_MODEL").unwrap_or_else(|_| "default".into()),
            api_key: std::env::var("COUNCIL_LLM_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            timeout: Duration::from_secs(env_parse("COUNCIL_LLM_TIMEOUT_SECS", 120)),
            temperature: env_parse("COUNCIL_LLM_TEMPERATURE", 0.3),
            strict_parse: env_parse("COUNCIL_STRICT_PARSE", false),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Council definition: debate settings, axioms and personas.
///
/// ```toml
/// [debate]
/// threshold = 0.7
/// max_rounds = 5
/// on_failure = "reject"
///
/// [[axioms]]
/// title = "Evidence"
/// statement = "Every claim needs support."
///
/// [[personas]]
/// slug = "guardian"
/// name = "Guardian"
/// directive = "Block anything unsafe."
/// weight = 0.4
/// veto = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CouncilFile {
    #[serde(default)]
    pub debate: DebateConfig,
    #[serde(default)]
    pub axioms: Vec<Axiom>,
    #[serde(default)]
    pub personas: Vec<Persona>,
}

impl CouncilFile {
    /// Load from `.toml`, `.yaml` or `.yml`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read council file {}", path.display()))?;

        let parsed = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&raw),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&raw),
            other => bail!(
                "Unsupported council file extension {:?} for {} (expected .toml, .yaml or .yml)",
                other,
                path.display()
            ),
        };
        parsed.with_context(|| format!("Failed to parse council file {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("invalid TOML")
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).context("invalid YAML")
    }

    /// Validated persona registry in file order.
    pub fn registry(&self) -> Result<PersonaRegistry> {
        PersonaRegistry::new(self.personas.clone()).context("Invalid persona definitions")
    }
}
