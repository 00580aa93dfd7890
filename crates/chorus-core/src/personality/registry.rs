//! Personality registry for runtime character lookup.
//!
//! A simple id-indexed registry of shared personality profiles. Iteration
//! order is sorted by id so fan-out and reports are deterministic.

use std::collections::BTreeMap;
use std::sync::Arc;

use chorus_types::error::RegistryError;

use super::PersonalityProfile;

/// Registry of available characters, indexed by character id.
#[derive(Clone, Default)]
pub struct PersonalityRegistry {
    profiles: BTreeMap<String, Arc<dyn PersonalityProfile>>,
}

impl PersonalityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            profiles: BTreeMap::new(),
        }
    }

    /// Register a profile under its own id.
    ///
    /// Rejects blank ids and ids that are already registered.
    pub fn register(&mut self, profile: Arc<dyn PersonalityProfile>) -> Result<(), RegistryError> {
        let id = profile.id().trim().to_string();
        if id.is_empty() {
            return Err(RegistryError::InvalidId("character id is empty".to_string()));
        }
        if self.profiles.contains_key(&id) {
            return Err(RegistryError::DuplicateCharacter(id));
        }
        self.profiles.insert(id, profile);
        Ok(())
    }

    /// Remove a character, returning its profile if it was registered.
    pub fn unregister(&mut self, id: &str) -> Option<Arc<dyn PersonalityProfile>> {
        self.profiles.remove(id)
    }

    /// Look up a profile by character id.
    pub fn get(&self, id: &str) -> Option<&Arc<dyn PersonalityProfile>> {
        self.profiles.get(id)
    }

    /// Look up a profile, failing with `RegistryError::NotFound`.
    pub fn require(&self, id: &str) -> Result<&Arc<dyn PersonalityProfile>, RegistryError> {
        self.get(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    /// All registered ids, sorted.
    pub fn ids(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }

    /// All registered profiles, sorted by id.
    pub fn profiles(&self) -> impl Iterator<Item = &Arc<dyn PersonalityProfile>> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl std::fmt::Debug for PersonalityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersonalityRegistry")
            .field("characters", &self.profiles.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personality::testing::StubPersonality;

    #[test]
    fn register_and_lookup() {
        let mut registry = PersonalityRegistry::new();
        registry.register(Arc::new(StubPersonality::new("rex"))).unwrap();
        registry.register(Arc::new(StubPersonality::new("ada"))).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.ids(), vec!["ada".to_string(), "rex".to_string()]);
        assert!(registry.get("ada").is_some());
        assert!(registry.get("zed").is_none());
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut registry = PersonalityRegistry::new();
        registry.register(Arc::new(StubPersonality::new("ada"))).unwrap();
        let err = registry
            .register(Arc::new(StubPersonality::new("ada")))
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateCharacter(id) if id == "ada"));
    }

    #[test]
    fn blank_id_is_rejected() {
        let mut registry = PersonalityRegistry::new();
        let err = registry
            .register(Arc::new(StubPersonality::new("  ")))
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidId(_)));
    }

    #[test]
    fn require_reports_missing_id() {
        let registry = PersonalityRegistry::new();
        let err = registry.require("ghost").err().unwrap();
        assert_eq!(err.to_string(), "character 'ghost' not found");
    }

    #[test]
    fn unregister_removes_profile() {
        let mut registry = PersonalityRegistry::new();
        registry.register(Arc::new(StubPersonality::new("ada"))).unwrap();
        assert!(registry.unregister("ada").is_some());
        assert!(registry.is_empty());
    }
}
