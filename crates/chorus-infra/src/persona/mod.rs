//! Built-in character personalities.
//!
//! Each kind (`Analyst`, `Contrarian`, `Enthusiast`) is a struct composing a
//! shared [`PersonaCore`] that carries the policy values and voice data. The
//! kinds differ only in how they score engagement probability.
//!
//! [`build_personality`] turns a roster entry into a profile and
//! [`build_registry`] registers the whole roster (or the default cast).

pub mod analyst;
pub mod contrarian;
pub mod enthusiast;

use std::sync::Arc;

use chorus_core::personality::PersonalityProfile;
use chorus_core::personality::registry::PersonalityRegistry;
use chorus_core::personality::scoring::keyword_relevance;
use chorus_types::config::{CharacterDefinition, CharacterKind, ChorusConfig};
use chorus_types::content::clamp_unit;
use chorus_types::error::RegistryError;

pub use analyst::Analyst;
pub use contrarian::Contrarian;
pub use enthusiast::Enthusiast;

/// Policy values and voice data shared by every personality kind.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonaCore {
    pub id: String,
    pub display_name: String,
    pub voice: String,
    pub interests: Vec<String>,
    pub signature_phrases: Vec<String>,
    pub fallback_responses: Vec<String>,
    pub engagement_threshold: f64,
    pub cooldown_minutes: u32,
    pub max_daily_interactions: u32,
    pub max_replies_per_thread: usize,
}

impl PersonaCore {
    /// Apply roster overrides on top of a kind's defaults.
    pub fn with_overrides(mut self, definition: &CharacterDefinition) -> Self {
        self.id = definition.id.trim().to_string();
        if let Some(name) = &definition.display_name {
            self.display_name = name.clone();
        }
        if let Some(threshold) = definition.engagement_threshold {
            self.engagement_threshold = clamp_unit(threshold);
        }
        if let Some(minutes) = definition.cooldown_minutes {
            self.cooldown_minutes = minutes;
        }
        if let Some(cap) = definition.max_daily_interactions {
            self.max_daily_interactions = cap;
        }
        if let Some(cap) = definition.max_replies_per_thread {
            self.max_replies_per_thread = cap;
        }
        for interest in &definition.interests {
            let interest = interest.trim().to_lowercase();
            if !interest.is_empty() && !self.interests.contains(&interest) {
                self.interests.push(interest);
            }
        }
        self
    }

    /// Keyword overlap between the character's interests and `topics`.
    pub fn topic_relevance(&self, topics: &[String]) -> f64 {
        keyword_relevance(&self.interests, topics)
    }
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Build the profile for one roster entry.
pub fn build_personality(
    definition: &CharacterDefinition,
    config: &ChorusConfig,
) -> Arc<dyn PersonalityProfile> {
    let replies = config.default_max_replies_per_character;
    match definition.kind {
        CharacterKind::Analyst => Arc::new(Analyst::new(
            Analyst::default_core(&definition.id, replies).with_overrides(definition),
        )),
        CharacterKind::Contrarian => Arc::new(Contrarian::new(
            Contrarian::default_core(&definition.id, replies).with_overrides(definition),
        )),
        CharacterKind::Enthusiast => Arc::new(Enthusiast::new(
            Enthusiast::default_core(&definition.id, replies).with_overrides(definition),
        )),
    }
}

/// The roster used when the config defines no characters.
pub fn default_cast() -> Vec<CharacterDefinition> {
    vec![
        CharacterDefinition::new("ada", CharacterKind::Analyst),
        CharacterDefinition::new("rex", CharacterKind::Contrarian),
        CharacterDefinition::new("sunny", CharacterKind::Enthusiast),
    ]
}

/// Register every configured character, or the default cast when the
/// roster is empty.
pub fn build_registry(config: &ChorusConfig) -> Result<PersonalityRegistry, RegistryError> {
    let roster = if config.characters.is_empty() {
        default_cast()
    } else {
        config.characters.clone()
    };

    let mut registry = PersonalityRegistry::new();
    for definition in &roster {
        registry.register(build_personality(definition, config))?;
    }
    tracing::debug!(characters = registry.len(), "Personality registry built");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cast_is_registered_when_roster_empty() {
        let registry = build_registry(&ChorusConfig::default()).unwrap();
        assert_eq!(registry.ids(), vec!["ada", "rex", "sunny"]);
    }

    #[test]
    fn overrides_replace_kind_defaults() {
        let mut definition = CharacterDefinition::new("quant", CharacterKind::Analyst);
        definition.display_name = Some("The Quant".to_string());
        definition.engagement_threshold = Some(0.9);
        definition.cooldown_minutes = Some(1);
        definition.max_replies_per_thread = Some(4);
        definition.interests = vec!["Crypto".to_string()];

        let profile = build_personality(&definition, &ChorusConfig::default());
        assert_eq!(profile.id(), "quant");
        assert_eq!(profile.display_name(), "The Quant");
        assert_eq!(profile.engagement_threshold(), 0.9);
        assert_eq!(profile.cooldown_minutes(), 1);
        assert_eq!(profile.max_replies_per_thread(), 4);
        assert!(profile.interests().contains(&"crypto".to_string()));
        assert!(profile.topic_relevance(&["crypto".to_string()]) >= 0.5);
    }

    #[test]
    fn thread_cap_defaults_to_config() {
        let config = ChorusConfig {
            default_max_replies_per_character: 3,
            ..ChorusConfig::default()
        };
        let profile = build_personality(&CharacterDefinition::new("ada", CharacterKind::Analyst), &config);
        assert_eq!(profile.max_replies_per_thread(), 3);
    }

    #[test]
    fn duplicate_roster_ids_fail_registration() {
        let config = ChorusConfig {
            characters: vec![
                CharacterDefinition::new("ada", CharacterKind::Analyst),
                CharacterDefinition::new("ada", CharacterKind::Contrarian),
            ],
            ..ChorusConfig::default()
        };
        assert!(matches!(
            build_registry(&config),
            Err(RegistryError::DuplicateCharacter(id)) if id == "ada"
        ));
    }

    #[test]
    fn every_kind_has_voice_material() {
        for definition in default_cast() {
            let profile = build_personality(&definition, &ChorusConfig::default());
            assert!(!profile.signature_phrases().is_empty());
            assert!(!profile.fallback_responses().is_empty());
            assert!(!profile.interests().is_empty());
            let snapshot = profile.snapshot();
            assert_eq!(snapshot.character_id, definition.id);
        }
    }
}
