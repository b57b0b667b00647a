//! Gift-card provider registry.
//!
//! Loaded once at startup from `config/providers.yaml` and shared read-only
//! with every component that needs to map a provider id to its kind or
//! single-letter source code.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Source letter reserved for offers. No provider may claim it.
pub const OFFER_SOURCE_LETTER: &str = "O";

/// Source letter reported for gift cards whose provider is not registered.
pub const UNKNOWN_SOURCE_LETTER: &str = "?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Tango,
    Blackhawk,
    Tremendous,
    Amazon,
}

impl ProviderKind {
    /// Every provider kind, in declaration order.
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Tango,
        ProviderKind::Blackhawk,
        ProviderKind::Tremendous,
        ProviderKind::Amazon,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Tango => "tango",
            ProviderKind::Blackhawk => "blackhawk",
            ProviderKind::Tremendous => "tremendous",
            ProviderKind::Amazon => "amazon",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Matches `gift_cards.provider_id`.
    pub id: i64,
    pub name: String,
    pub kind: ProviderKind,
    /// Single uppercase ASCII letter shown next to items from this provider.
    pub letter: String,
}

#[derive(Debug, Deserialize)]
pub struct ProvidersFile {
    pub providers: Vec<ProviderConfig>,
}

/// Immutable provider lookup keyed by provider id.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    by_id: HashMap<i64, ProviderConfig>,
}

impl ProviderRegistry {
    /// Builds a registry after validating the provider list.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] on duplicate ids or names, empty
    /// names, malformed letters, or a provider claiming the offer letter.
    pub fn new(providers: Vec<ProviderConfig>) -> Result<Self, ConfigError> {
        validate_providers(&providers)?;
        let by_id = providers.into_iter().map(|p| (p.id, p)).collect();
        Ok(Self { by_id })
    }

    #[must_use]
    pub fn get(&self, provider_id: i64) -> Option<&ProviderConfig> {
        self.by_id.get(&provider_id)
    }

    /// Returns the provider's letter, or [`UNKNOWN_SOURCE_LETTER`] when the
    /// provider is not registered.
    #[must_use]
    pub fn letter_for(&self, provider_id: i64) -> &str {
        self.by_id
            .get(&provider_id)
            .map_or(UNKNOWN_SOURCE_LETTER, |p| p.letter.as_str())
    }

    #[must_use]
    pub fn kind_of(&self, provider_id: i64) -> Option<ProviderKind> {
        self.by_id.get(&provider_id).map(|p| p.kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Load and validate the provider registry from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_providers(path: &Path) -> Result<ProviderRegistry, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ProvidersFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let providers_file: ProvidersFile =
        serde_yaml::from_str(&content).map_err(ConfigError::ProvidersFileParse)?;

    ProviderRegistry::new(providers_file.providers)
}

fn validate_providers(providers: &[ProviderConfig]) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();
    let mut seen_names = HashSet::new();

    for provider in providers {
        if provider.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "provider {} must have a non-empty name",
                provider.id
            )));
        }

        if !seen_ids.insert(provider.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate provider id: {}",
                provider.id
            )));
        }

        if !seen_names.insert(provider.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate provider name: '{}'",
                provider.name
            )));
        }

        let mut chars = provider.letter.chars();
        let valid_letter = matches!(
            (chars.next(), chars.next()),
            (Some(c), None) if c.is_ascii_uppercase()
        );
        if !valid_letter {
            return Err(ConfigError::Validation(format!(
                "provider '{}' has invalid letter '{}'; must be one uppercase ASCII letter",
                provider.name, provider.letter
            )));
        }

        if provider.letter == OFFER_SOURCE_LETTER {
            return Err(ConfigError::Validation(format!(
                "provider '{}' uses reserved offer letter '{OFFER_SOURCE_LETTER}'",
                provider.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(id: i64, name: &str, kind: ProviderKind, letter: &str) -> ProviderConfig {
        ProviderConfig {
            id,
            name: name.to_string(),
            kind,
            letter: letter.to_string(),
        }
    }

    #[test]
    fn letter_for_known_provider() {
        let registry =
            ProviderRegistry::new(vec![provider(1, "Tango", ProviderKind::Tango, "T")]).unwrap();
        assert_eq!(registry.letter_for(1), "T");
        assert_eq!(registry.kind_of(1), Some(ProviderKind::Tango));
    }

    #[test]
    fn letter_for_unknown_provider_is_sentinel() {
        let registry = ProviderRegistry::default();
        assert_eq!(registry.letter_for(99), UNKNOWN_SOURCE_LETTER);
        assert!(registry.kind_of(99).is_none());
    }

    #[test]
    fn validate_rejects_duplicate_id() {
        let err = ProviderRegistry::new(vec![
            provider(1, "Tango", ProviderKind::Tango, "T"),
            provider(1, "Blackhawk", ProviderKind::Blackhawk, "B"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate provider id"));
    }

    #[test]
    fn validate_rejects_duplicate_name_case_insensitive() {
        let err = ProviderRegistry::new(vec![
            provider(1, "Tango", ProviderKind::Tango, "T"),
            provider(2, "tango", ProviderKind::Tango, "G"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("duplicate provider name"));
    }

    #[test]
    fn validate_rejects_offer_letter() {
        let err =
            ProviderRegistry::new(vec![provider(1, "Other", ProviderKind::Amazon, "O")]).unwrap_err();
        assert!(err.to_string().contains("reserved offer letter"));
    }

    #[test]
    fn validate_rejects_multi_character_letter() {
        let err = ProviderRegistry::new(vec![provider(1, "Tango", ProviderKind::Tango, "TG")])
            .unwrap_err();
        assert!(err.to_string().contains("invalid letter"));
    }

    #[test]
    fn validate_rejects_lowercase_letter() {
        let err = ProviderRegistry::new(vec![provider(1, "Tango", ProviderKind::Tango, "t")])
            .unwrap_err();
        assert!(err.to_string().contains("invalid letter"));
    }

    #[test]
    fn validate_rejects_empty_name() {
        let err =
            ProviderRegistry::new(vec![provider(1, " ", ProviderKind::Tango, "T")]).unwrap_err();
        assert!(err.to_string().contains("non-empty name"));
    }

    #[test]
    fn provider_kind_display_matches_serde() {
        for kind in ProviderKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }

    #[test]
    fn load_providers_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("providers.yaml");
        assert!(
            path.exists(),
            "providers.yaml missing at {path:?}; required for this test"
        );
        let registry = load_providers(&path).expect("providers.yaml should load");
        assert!(!registry.is_empty());
    }
}
