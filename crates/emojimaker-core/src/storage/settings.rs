//! Load/save contract for persisted editor settings.

use std::sync::Arc;

use super::{Storage, StorageError, StorageResult, recover_elements};
use crate::element::Element;
use crate::language::Language;
use crate::snap::AssistSettings;

/// Storage keys for persisted settings.
pub mod keys {
    pub const ELEMENTS: &str = "emoji-maker-elements";
    pub const GUIDELINES: &str = "emoji-maker-guidelines";
    pub const SNAPPING: &str = "emoji-maker-snapping";
    pub const BOUNDARIES: &str = "emoji-maker-show-boundaries";
    pub const LANGUAGE: &str = "emoji-maker-language";
}

/// Reads and writes editor settings through a storage backend.
///
/// Loads never fail: absent or malformed values fall back to defaults.
pub struct SettingsManager<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> Clone for SettingsManager<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: Storage> SettingsManager<S> {
    /// Create a new settings manager with the given storage backend.
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Failed to read {}: {}", key, e);
                None
            }
        }
    }

    /// Load the persisted element sequence, dropping invalid entries.
    pub fn load_elements(&self) -> Vec<Element> {
        let Some(json) = self.read(keys::ELEMENTS) else {
            return Vec::new();
        };

        match recover_elements(&json) {
            Ok(recovered) => {
                if !recovered.is_clean() {
                    log::warn!(
                        "Recovered {} elements, dropped {} invalid entries",
                        recovered.elements.len(),
                        recovered.dropped
                    );
                }
                recovered.elements
            }
            Err(e) => {
                log::warn!("Discarding unreadable persisted elements: {}", e);
                if let Err(e) = self.storage.remove(keys::ELEMENTS) {
                    log::warn!("Failed to remove {}: {}", keys::ELEMENTS, e);
                }
                Vec::new()
            }
        }
    }

    /// Save the element sequence.
    pub fn save_elements(&self, elements: &[Element]) -> StorageResult<()> {
        let json = serde_json::to_string(elements)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.set(keys::ELEMENTS, &json)
    }

    /// Load a boolean flag. Only the exact string `"true"` is true.
    fn load_flag(&self, key: &str) -> bool {
        self.read(key).as_deref() == Some("true")
    }

    fn save_flag(&self, key: &str, value: bool) -> StorageResult<()> {
        self.storage.set(key, if value { "true" } else { "false" })
    }

    pub fn load_guidelines(&self) -> bool {
        self.load_flag(keys::GUIDELINES)
    }

    pub fn save_guidelines(&self, value: bool) -> StorageResult<()> {
        self.save_flag(keys::GUIDELINES, value)
    }

    pub fn load_snapping(&self) -> bool {
        self.load_flag(keys::SNAPPING)
    }

    pub fn save_snapping(&self, value: bool) -> StorageResult<()> {
        self.save_flag(keys::SNAPPING, value)
    }

    pub fn load_boundaries(&self) -> bool {
        self.load_flag(keys::BOUNDARIES)
    }

    pub fn save_boundaries(&self, value: bool) -> StorageResult<()> {
        self.save_flag(keys::BOUNDARIES, value)
    }

    /// Load all alignment assist flags.
    pub fn load_assist(&self) -> AssistSettings {
        AssistSettings {
            show_guidelines: self.load_guidelines(),
            enable_snapping: self.load_snapping(),
            show_other_boundaries: self.load_boundaries(),
        }
    }

    /// Save all alignment assist flags.
    pub fn save_assist(&self, assist: &AssistSettings) -> StorageResult<()> {
        self.save_guidelines(assist.show_guidelines)?;
        self.save_snapping(assist.enable_snapping)?;
        self.save_boundaries(assist.show_other_boundaries)
    }

    /// Load the active language (default `zh`).
    pub fn load_language(&self) -> Language {
        Language::parse_or_default(self.read(keys::LANGUAGE).as_deref())
    }

    pub fn save_language(&self, language: Language) -> StorageResult<()> {
        self.storage.set(keys::LANGUAGE, language.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn manager() -> SettingsManager<MemoryStorage> {
        SettingsManager::new(Arc::new(MemoryStorage::new()))
    }

    #[test]
    fn test_defaults_when_absent() {
        let settings = manager();
        assert!(settings.load_elements().is_empty());
        assert_eq!(settings.load_assist(), AssistSettings::default());
        assert_eq!(settings.load_language(), Language::Zh);
    }

    #[test]
    fn test_flags_roundtrip() {
        let settings = manager();
        let assist = AssistSettings {
            show_guidelines: true,
            enable_snapping: false,
            show_other_boundaries: true,
        };
        settings.save_assist(&assist).unwrap();
        assert_eq!(settings.load_assist(), assist);
        assert_eq!(
            settings.storage().get(keys::GUIDELINES).unwrap().as_deref(),
            Some("true")
        );
    }

    #[test]
    fn test_only_exact_true_is_true() {
        let settings = manager();
        for value in ["TRUE", "1", "yes", ""] {
            settings.storage().set(keys::SNAPPING, value).unwrap();
            assert!(!settings.load_snapping());
        }
    }

    #[test]
    fn test_unknown_language_falls_back() {
        let settings = manager();
        settings.storage().set(keys::LANGUAGE, "fr").unwrap();
        assert_eq!(settings.load_language(), Language::Zh);

        settings.save_language(Language::En).unwrap();
        assert_eq!(settings.load_language(), Language::En);
    }

    #[test]
    fn test_elements_roundtrip() {
        let settings = manager();
        let elements = vec![Element::text("a"), Element::text("b")];
        settings.save_elements(&elements).unwrap();
        assert_eq!(settings.load_elements(), elements);
    }

    #[test]
    fn test_unreadable_elements_are_removed() {
        let settings = manager();
        settings.storage().set(keys::ELEMENTS, "not json").unwrap();
        assert!(settings.load_elements().is_empty());
        assert!(!settings.storage().contains(keys::ELEMENTS).unwrap());
    }
}
