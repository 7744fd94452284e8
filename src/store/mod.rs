//! Persistence seam for languages and translations.
//!
//! - `memory`: process-local store, used by tests and dry runs
//! - `postgres`: sqlx-backed store with the unique indexes the invariants rely on
//!
//! Stores are plain persistence. Business rules (delete protection, approval
//! transitions) live in the service layer.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::Result;
use crate::language::{Language, LanguageUpdate, NewLanguage};
use crate::translation::{NewTranslation, Translation, TranslationUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait LanguageStore: Send + Sync {
    async fn find_language(&self, code: &str) -> Result<Option<Language>>;

    /// List languages ordered by code.
    async fn list_languages(&self, active_only: bool) -> Result<Vec<Language>>;

    /// Insert a language. Fails `Conflict` if the code exists. When the new
    /// language is default, the previous default is cleared in the same step.
    async fn create_language(&self, language: NewLanguage) -> Result<Language>;

    async fn update_language(&self, code: &str, update: LanguageUpdate) -> Result<Language>;

    /// Make `code` the only default language. Fails `NotFound` if absent.
    async fn set_default_language(&self, code: &str) -> Result<Language>;

    async fn delete_language(&self, code: &str) -> Result<()>;
}

#[async_trait]
pub trait TranslationStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Translation>>;

    async fn find_by_key_and_language(
        &self,
        key: &str,
        language_code: &str,
    ) -> Result<Option<Translation>>;

    /// Insert a translation. Fails `Conflict` if (key, language) exists.
    async fn create(&self, translation: NewTranslation) -> Result<Translation>;

    async fn update(&self, id: i64, update: TranslationUpdate) -> Result<Translation>;

    /// Move a pending translation to approved in one atomic step.
    /// Fails `BusinessRuleViolation` if it is already approved, `NotFound` if absent.
    async fn approve(
        &self,
        id: i64,
        approved_by: &str,
        approved_at: DateTime<Utc>,
    ) -> Result<Translation>;

    /// Bump `usage_count` and stamp `last_used_at`.
    async fn increment_usage(&self, id: i64) -> Result<()>;

    /// Pending translations, oldest first.
    async fn find_pending_approval(&self) -> Result<Vec<Translation>>;

    async fn delete(&self, id: i64) -> Result<()>;

    async fn count_by_language(&self, language_code: &str) -> Result<i64>;
}

/// Everything the services need from persistence.
pub trait Store: LanguageStore + TranslationStore {}

impl<T: LanguageStore + TranslationStore> Store for T {}
