use super::{LanguageStore, TranslationStore};
use crate::error::{Error, Result};
use crate::language::{Language, LanguageUpdate, NewLanguage};
use crate::translation::{Approval, NewTranslation, Translation, TranslationUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    languages: BTreeMap<String, Language>,
    translations: BTreeMap<i64, Translation>,
    next_id: i64,
}

/// In-process store. Every operation runs under one lock, so the
/// (key, language) uniqueness check and the default-language swap are atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LanguageStore for MemoryStore {
    async fn find_language(&self, code: &str) -> Result<Option<Language>> {
        let tables = self.tables.lock().await;
        Ok(tables.languages.get(code).cloned())
    }

    async fn list_languages(&self, active_only: bool) -> Result<Vec<Language>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .languages
            .values()
            .filter(|lang| !active_only || lang.is_active)
            .cloned()
            .collect())
    }

    async fn create_language(&self, language: NewLanguage) -> Result<Language> {
        let mut tables = self.tables.lock().await;
        if tables.languages.contains_key(&language.code) {
            return Err(Error::conflict(format!(
                "language '{}' already exists",
                language.code
            )));
        }

        let now = Utc::now();
        if language.is_default {
            for existing in tables.languages.values_mut().filter(|l| l.is_default) {
                existing.is_default = false;
                existing.updated_at = now;
            }
        }

        let language = language.into_language(now);
        tables
            .languages
            .insert(language.code.clone(), language.clone());
        Ok(language)
    }

    async fn update_language(&self, code: &str, update: LanguageUpdate) -> Result<Language> {
        let mut tables = self.tables.lock().await;
        let language = tables
            .languages
            .get_mut(code)
            .ok_or_else(|| Error::not_found(format!("language '{}'", code)))?;
        update.apply(language, Utc::now());
        Ok(language.clone())
    }

    async fn set_default_language(&self, code: &str) -> Result<Language> {
        let mut tables = self.tables.lock().await;
        if !tables.languages.contains_key(code) {
            return Err(Error::not_found(format!("language '{}'", code)));
        }

        let now = Utc::now();
        for language in tables.languages.values_mut() {
            let should_be_default = language.code == code;
            if language.is_default != should_be_default {
                language.is_default = should_be_default;
                language.updated_at = now;
            }
        }

        Ok(tables.languages[code].clone())
    }

    async fn delete_language(&self, code: &str) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables
            .languages
            .remove(code)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("language '{}'", code)))
    }
}

#[async_trait]
impl TranslationStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Translation>> {
        let tables = self.tables.lock().await;
        Ok(tables.translations.get(&id).cloned())
    }

    async fn find_by_key_and_language(
        &self,
        key: &str,
        language_code: &str,
    ) -> Result<Option<Translation>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .translations
            .values()
            .find(|t| t.key == key && t.language_code == language_code)
            .cloned())
    }

    async fn create(&self, translation: NewTranslation) -> Result<Translation> {
        let mut tables = self.tables.lock().await;
        let duplicate = tables
            .translations
            .values()
            .any(|t| t.key == translation.key && t.language_code == translation.language_code);
        if duplicate {
            return Err(Error::conflict(format!(
                "translation with key {} already exists for '{}'",
                translation.key, translation.language_code
            )));
        }

        tables.next_id += 1;
        let translation = translation.into_translation(tables.next_id, Utc::now());
        tables
            .translations
            .insert(translation.id, translation.clone());
        Ok(translation)
    }

    async fn update(&self, id: i64, update: TranslationUpdate) -> Result<Translation> {
        let mut tables = self.tables.lock().await;
        let translation = tables
            .translations
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("translation {}", id)))?;
        update.apply(translation, Utc::now());
        Ok(translation.clone())
    }

    async fn approve(
        &self,
        id: i64,
        approved_by: &str,
        approved_at: DateTime<Utc>,
    ) -> Result<Translation> {
        let mut tables = self.tables.lock().await;
        let translation = tables
            .translations
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("translation {}", id)))?;
        if translation.is_approved() {
            return Err(Error::business_rule(format!(
                "translation {} is already approved",
                id
            )));
        }

        translation.approval = Approval::Approved {
            approved_by: approved_by.to_string(),
            approved_at,
        };
        translation.updated_at = approved_at;
        Ok(translation.clone())
    }

    async fn increment_usage(&self, id: i64) -> Result<()> {
        let mut tables = self.tables.lock().await;
        let translation = tables
            .translations
            .get_mut(&id)
            .ok_or_else(|| Error::not_found(format!("translation {}", id)))?;
        translation.usage_count += 1;
        translation.last_used_at = Some(Utc::now());
        Ok(())
    }

    async fn find_pending_approval(&self) -> Result<Vec<Translation>> {
        let tables = self.tables.lock().await;
        let mut pending: Vec<Translation> = tables
            .translations
            .values()
            .filter(|t| !t.is_approved())
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(pending)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let mut tables = self.tables.lock().await;
        tables
            .translations
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Error::not_found(format!("translation {}", id)))
    }

    async fn count_by_language(&self, language_code: &str) -> Result<i64> {
        let tables = self.tables.lock().await;
        Ok(tables
            .translations
            .values()
            .filter(|t| t.language_code == language_code)
            .count() as i64)
    }
}
