//! Language catalog: registration and lifecycle rules for languages.

use crate::error::{Error, Result};
use crate::key::validate_language_code;
use crate::language::{default_languages, Language, LanguageUpdate, NewLanguage};
use crate::store::{LanguageStore, Store, TranslationStore};
use std::sync::Arc;
use tracing::info;

pub struct LanguageCatalog {
    store: Arc<dyn Store>,
}

impl LanguageCatalog {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Register a language.
    ///
    /// # Errors
    /// * `Validation` for a malformed code or blank names
    /// * `BusinessRuleViolation` for an inactive default language
    /// * `Conflict` if the code is already registered
    pub async fn create_language(&self, language: NewLanguage) -> Result<Language> {
        validate_language_code(&language.code)?;
        validate_names(Some(&language.name), Some(&language.native_name))?;
        if language.is_default && !language.is_active {
            return Err(Error::business_rule("the default language must be active"));
        }

        let created = self.store.create_language(language).await?;
        info!(
            "Registered language '{}' ({}){}",
            created.code,
            created.name,
            if created.is_default { " as default" } else { "" }
        );
        Ok(created)
    }

    pub async fn get_language(&self, code: &str) -> Result<Language> {
        self.store
            .find_language(code)
            .await?
            .ok_or_else(|| Error::not_found(format!("language '{}'", code)))
    }

    pub async fn list_languages(&self, active_only: bool) -> Result<Vec<Language>> {
        self.store.list_languages(active_only).await
    }

    pub async fn default_language(&self) -> Result<Option<Language>> {
        Ok(self
            .store
            .list_languages(false)
            .await?
            .into_iter()
            .find(|l| l.is_default))
    }

    pub async fn update_language(&self, code: &str, update: LanguageUpdate) -> Result<Language> {
        validate_names(update.name.as_ref(), update.native_name.as_ref())?;

        let current = self.get_language(code).await?;
        if current.is_default && update.is_active == Some(false) {
            return Err(Error::business_rule(format!(
                "language '{}' is the default and cannot be deactivated",
                code
            )));
        }

        self.store.update_language(code, update).await
    }

    /// Make `code` the only default language.
    pub async fn set_default_language(&self, code: &str) -> Result<Language> {
        let language = self.get_language(code).await?;
        if !language.is_active {
            return Err(Error::business_rule(format!(
                "language '{}' is inactive and cannot be the default",
                code
            )));
        }

        let language = self.store.set_default_language(code).await?;
        info!("Default language is now '{}'", code);
        Ok(language)
    }

    /// Remove a language that is neither default nor referenced by translations.
    pub async fn delete_language(&self, code: &str) -> Result<()> {
        let language = self.get_language(code).await?;
        if language.is_default {
            return Err(Error::business_rule(format!(
                "language '{}' is the default and cannot be deleted",
                code
            )));
        }

        let translations = self.store.count_by_language(code).await?;
        if translations > 0 {
            return Err(Error::business_rule(format!(
                "language '{}' has {} translations and cannot be deleted",
                code, translations
            )));
        }

        self.store.delete_language(code).await?;
        info!("Deleted language '{}'", code);
        Ok(())
    }

    /// Insert the built-in languages that are missing. Returns how many were added.
    ///
    /// A seeded language only becomes default when no default exists yet.
    pub async fn seed_defaults(&self) -> Result<usize> {
        let mut has_default = self.default_language().await?.is_some();
        let mut added = 0;

        for mut language in default_languages() {
            if self.store.find_language(&language.code).await?.is_some() {
                continue;
            }
            if language.is_default && has_default {
                language.is_default = false;
            }
            has_default |= language.is_default;
            self.create_language(language).await?;
            added += 1;
        }

        Ok(added)
    }
}

fn validate_names(name: Option<&String>, native_name: Option<&String>) -> Result<()> {
    if name.is_some_and(|n| n.trim().is_empty()) {
        return Err(Error::validation("language name must not be empty"));
    }
    if native_name.is_some_and(|n| n.trim().is_empty()) {
        return Err(Error::validation("native language name must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::translation::{Approval, NewTranslation};

    fn catalog() -> (LanguageCatalog, MemoryStore) {
        let store = MemoryStore::new();
        (LanguageCatalog::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_seed_defaults_is_idempotent() {
        let (catalog, _store) = catalog();

        assert_eq!(catalog.seed_defaults().await.unwrap(), 2);
        assert_eq!(catalog.seed_defaults().await.unwrap(), 0);

        let default = catalog.default_language().await.unwrap().expect("Should have default");
        assert_eq!(default.code, "en");
    }

    #[tokio::test]
    async fn test_seed_keeps_existing_default() {
        let (catalog, _store) = catalog();
        catalog
            .create_language(NewLanguage::new("fr", "French", "Français").as_default())
            .await
            .unwrap();

        catalog.seed_defaults().await.unwrap();

        let default = catalog.default_language().await.unwrap().unwrap();
        assert_eq!(default.code, "fr");
        assert!(!catalog.get_language("en").await.unwrap().is_default);
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let (catalog, _store) = catalog();

        let bad_code = catalog
            .create_language(NewLanguage::new("ENG", "English", "English"))
            .await;
        assert!(matches!(bad_code, Err(Error::Validation(_))));

        let blank_name = catalog
            .create_language(NewLanguage::new("en", " ", "English"))
            .await;
        assert!(matches!(blank_name, Err(Error::Validation(_))));

        let mut inactive_default = NewLanguage::new("en", "English", "English").as_default();
        inactive_default.is_active = false;
        let result = catalog.create_language(inactive_default).await;
        assert!(matches!(result, Err(Error::BusinessRuleViolation(_))));
    }

    #[tokio::test]
    async fn test_set_default_moves_flag() {
        let (catalog, _store) = catalog();
        catalog.seed_defaults().await.unwrap();

        catalog.set_default_language("es").await.expect("Should switch");

        let languages = catalog.list_languages(false).await.unwrap();
        let defaults: Vec<_> = languages.iter().filter(|l| l.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].code, "es");
    }

    #[tokio::test]
    async fn test_inactive_language_cannot_become_default() {
        let (catalog, _store) = catalog();
        catalog.seed_defaults().await.unwrap();
        catalog
            .update_language(
                "es",
                LanguageUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let result = catalog.set_default_language("es").await;
        assert!(matches!(result, Err(Error::BusinessRuleViolation(_))));
    }

    #[tokio::test]
    async fn test_default_cannot_be_deactivated() {
        let (catalog, _store) = catalog();
        catalog.seed_defaults().await.unwrap();

        let result = catalog
            .update_language(
                "en",
                LanguageUpdate {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(Error::BusinessRuleViolation(_))));
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let (catalog, store) = catalog();
        catalog.seed_defaults().await.unwrap();
        catalog
            .create_language(NewLanguage::new("fr", "French", "Français"))
            .await
            .unwrap();

        let default = catalog.delete_language("en").await;
        assert!(matches!(default, Err(Error::BusinessRuleViolation(_))));

        store
            .create(NewTranslation {
                key: "k".to_string(),
                original_text: "Hello".to_string(),
                destination_text: "Hola".to_string(),
                language_code: "es".to_string(),
                context: None,
                approval: Approval::Pending,
            })
            .await
            .unwrap();
        let referenced = catalog.delete_language("es").await;
        assert!(matches!(referenced, Err(Error::BusinessRuleViolation(_))));

        catalog.delete_language("fr").await.expect("Should delete unused language");
        assert!(matches!(
            catalog.delete_language("fr").await,
            Err(Error::NotFound(_))
        ));
    }
}
