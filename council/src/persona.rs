//! Personas: weighted, possibly veto-capable reviewer roles.
//!
//! A [`PersonaRegistry`] is loaded once per debate by the caller and is
//! read-only for the lifetime of that debate. Registration order matters:
//! it fixes the order of every [`DecisionSet`](crate::debate::DecisionSet)
//! and therefore which veto is reported when several personas veto at once.

use serde::{Deserialize, Serialize};

use crate::debate::DebateError;

/// One reviewer role on the council.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    /// Unique identifier.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Instructions defining the persona's evaluative stance.
    pub directive: String,
    /// Voting weight. Weights need not sum to 1.0.
    pub weight: f64,
    /// Whether a Veto from this persona ends the debate.
    #[serde(default)]
    pub veto: bool,
    /// Disabled personas are skipped by the engine.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Persona {
    /// Create an enabled, non-veto persona with weight 1.0.
    pub fn new(
        slug: impl Into<String>,
        name: impl Into<String>,
        directive: impl Into<String>,
    ) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            directive: directive.into(),
            weight: 1.0,
            veto: false,
            enabled: true,
        }
    }

    /// Set the voting weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Grant or revoke veto power.
    pub fn with_veto(mut self, veto: bool) -> Self {
        self.veto = veto;
        self
    }

    /// Enable or disable the persona.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    fn validate(&self) -> Result<(), DebateError> {
        if self.slug.trim().is_empty() {
            return Err(DebateError::InvalidPersona {
                slug: self.slug.clone(),
                reason: "slug must not be empty".to_string(),
            });
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(DebateError::InvalidPersona {
                slug: self.slug.clone(),
                reason: format!("weight must be finite and non-negative, got {}", self.weight),
            });
        }
        Ok(())
    }
}

/// A guiding principle forwarded to every persona alongside the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Axiom {
    pub title: String,
    pub statement: String,
}

impl Axiom {
    pub fn new(title: impl Into<String>, statement: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            statement: statement.into(),
        }
    }
}

/// Ordered, validated set of personas.
///
/// An empty registry is valid; the engine rejects it at `run` time with
/// [`DebateError::NoPersonas`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
}

impl PersonaRegistry {
    /// Build a registry, rejecting duplicate slugs and invalid weights.
    pub fn new(personas: Vec<Persona>) -> Result<Self, DebateError> {
        for (idx, persona) in personas.iter().enumerate() {
            persona.validate()?;
            if personas[..idx].iter().any(|p| p.slug == persona.slug) {
                return Err(DebateError::DuplicatePersona(persona.slug.clone()));
            }
        }
        Ok(Self { personas })
    }

    /// All personas in registration order.
    pub fn all(&self) -> &[Persona] {
        &self.personas
    }

    /// Enabled personas in registration order.
    pub fn active(&self) -> Vec<&Persona> {
        self.personas.iter().filter(|p| p.enabled).collect()
    }

    pub fn get(&self, slug: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.slug == slug)
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }

    /// Sum of the weights of all active personas.
    pub fn active_weight(&self) -> f64 {
        self.personas
            .iter()
            .filter(|p| p.enabled)
            .map(|p| p.weight)
            .sum()
    }
}

impl<'de> Deserialize<'de> for PersonaRegistry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let personas = Vec::<Persona>::deserialize(deserializer)?;
        Self::new(personas).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_preserves_order() {
        let registry = PersonaRegistry::new(vec![
            Persona::new("skeptic", "Skeptic", "Doubt everything"),
            Persona::new("editor", "Editor", "Tighten prose"),
            Persona::new("security", "Security", "Look for leaks"),
        ])
        .unwrap();

        let slugs: Vec<&str> = registry.all().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, vec!["skeptic", "editor", "security"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_duplicate_slug_rejected() {
        let err = PersonaRegistry::new(vec![
            Persona::new("a", "A", "x"),
            Persona::new("a", "A again", "y"),
        ])
        .unwrap_err();
        assert!(matches!(err, DebateError::DuplicatePersona(ref s) if s == "a"));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let err = PersonaRegistry::new(vec![Persona::new("a", "A", "x").with_weight(-0.1)])
            .unwrap_err();
        assert!(matches!(err, DebateError::InvalidPersona { .. }));
    }

    #[test]
    fn test_nan_weight_rejected() {
        let err = PersonaRegistry::new(vec![Persona::new("a", "A", "x").with_weight(f64::NAN)])
            .unwrap_err();
        assert!(err.to_string().contains("weight"));
    }

    #[test]
    fn test_blank_slug_rejected() {
        assert!(PersonaRegistry::new(vec![Persona::new("  ", "Blank", "x")]).is_err());
    }

    #[test]
    fn test_active_filters_disabled() {
        let registry = PersonaRegistry::new(vec![
            Persona::new("a", "A", "x").with_weight(0.5),
            Persona::new("b", "B", "y").with_weight(0.3).with_enabled(false),
            Persona::new("c", "C", "z").with_weight(0.2),
        ])
        .unwrap();

        let active: Vec<&str> = registry.active().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(active, vec!["a", "c"]);
        assert!((registry.active_weight() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_empty_registry_is_valid() {
        let registry = PersonaRegistry::new(vec![]).unwrap();
        assert!(registry.is_empty());
        assert!(registry.active().is_empty());
    }

    #[test]
    fn test_deserialize_defaults() {
        let json = r#"[{"slug":"a","name":"A","directive":"d","weight":0.4}]"#;
        let registry: PersonaRegistry = serde_json::from_str(json).unwrap();
        let persona = registry.get("a").unwrap();
        assert!(!persona.veto);
        assert!(persona.enabled);
    }

    #[test]
    fn test_deserialize_validates() {
        let json = r#"[{"slug":"a","name":"A","directive":"d","weight":1.0},
                       {"slug":"a","name":"B","directive":"d","weight":1.0}]"#;
        assert!(serde_json::from_str::<PersonaRegistry>(json).is_err());
    }
}
