//! Lookup-or-create translation service and the approval workflow.
//!
//! `translate` answers from the store when the (text, language) key is cached
//! and otherwise asks the provider, saving its answer as a pending entry.
//! Admin operations (explicit create, update, approve, delete) go through the
//! same service so the business rules live in one place.

use crate::error::{Error, Result};
use crate::key::derive_key;
use crate::language::Language;
use crate::metrics::TranslationMetrics;
use crate::provider::TranslationProvider;
use crate::store::{LanguageStore, Store, TranslationStore};
use crate::translation::{
    Approval, NewTranslation, TranslateResult, Translation, TranslationContext, TranslationUpdate,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Source language used when neither the caller nor the catalog names one
const FALLBACK_SOURCE_LANGUAGE: &str = "en";

/// Input bounds and business-rule thresholds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Longest accepted text, in characters
    pub max_text_length: usize,
    /// Most items accepted by `translate_batch`
    pub max_batch_size: usize,
    /// Approved entries used more often than this cannot be deleted
    pub delete_protection_threshold: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_text_length: 5000,
            max_batch_size: 100,
            delete_protection_threshold: 100,
        }
    }
}

/// Admin request to store a translation directly.
#[derive(Debug, Clone, Default)]
pub struct CreateTranslation {
    pub text: String,
    pub language_code: String,
    pub destination_text: String,
    pub context: Option<TranslationContext>,
    /// Create the entry already approved by this reviewer
    pub approved_by: Option<String>,
}

pub struct Translator {
    store: Arc<dyn Store>,
    provider: Arc<dyn TranslationProvider>,
    limits: Limits,
    metrics: TranslationMetrics,
    /// Background usage updates started by cache hits
    usage_updates: Mutex<JoinSet<()>>,
}

impl Translator {
    pub fn new(
        store: Arc<dyn Store>,
        provider: Arc<dyn TranslationProvider>,
        limits: Limits,
    ) -> Self {
        Self {
            store,
            provider,
            limits,
            metrics: TranslationMetrics::new(),
            usage_updates: Mutex::new(JoinSet::new()),
        }
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Wait for every usage update started so far.
    ///
    /// Call before the runtime shuts down; pending updates are cancelled otherwise.
    pub async fn flush(&self) {
        let mut updates = self.usage_updates.lock().await;
        while let Some(result) = updates.join_next().await {
            if let Err(e) = result {
                warn!("Usage update task did not complete: {}", e);
            }
        }
    }

    // ==================== Lookup-or-create ====================

    /// Return the cached translation of `text`, or create a pending one.
    ///
    /// # Errors
    /// * `Validation` if the text is blank or longer than `max_text_length`,
    ///   or the target language is inactive
    /// * `NotFound` if the target language is not registered
    /// * `Provider` if the provider fails on a cache miss
    /// * `Conflict` if a concurrent miss inserted the same key first
    pub async fn translate(
        &self,
        text: &str,
        target_language_code: &str,
        source_language_code: Option<&str>,
        context: Option<TranslationContext>,
    ) -> Result<TranslateResult> {
        self.validate_text(text)?;
        let language = self.resolve_target(target_language_code).await?;
        self.lookup_or_create(text, &language, source_language_code, context)
            .await
    }

    /// Translate many texts into one language.
    ///
    /// The size bound and the target language are checked up front. After
    /// that, an item that fails for any reason comes back as its original
    /// text with `from_cache: false` instead of failing the batch.
    pub async fn translate_batch(
        &self,
        texts: &[String],
        target_language_code: &str,
        source_language_code: Option<&str>,
        context: Option<TranslationContext>,
    ) -> Result<Vec<TranslateResult>> {
        if texts.len() > self.limits.max_batch_size {
            return Err(Error::validation(format!(
                "batch has {} items, maximum is {}",
                texts.len(),
                self.limits.max_batch_size
            )));
        }
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let language = self.resolve_target(target_language_code).await?;
        let mut results = Vec::with_capacity(texts.len());

        for (index, text) in texts.iter().enumerate() {
            let outcome = match self.validate_text(text) {
                Ok(()) => {
                    self.lookup_or_create(text, &language, source_language_code, context.clone())
                        .await
                }
                Err(e) => Err(e),
            };

            let result = outcome.unwrap_or_else(|e| {
                warn!(
                    "Batch item {} for '{}' fell back to original text: {}",
                    index, language.code, e
                );
                self.metrics.record_batch_fallback();
                TranslateResult {
                    translated_text: text.clone(),
                    from_cache: false,
                }
            });
            results.push(result);
        }

        info!(
            "Translated batch of {} items into '{}'",
            results.len(),
            language.code
        );
        Ok(results)
    }

    fn validate_text(&self, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::validation("text must not be empty"));
        }
        let length = text.chars().count();
        if length > self.limits.max_text_length {
            return Err(Error::validation(format!(
                "text has {} characters, maximum is {}",
                length, self.limits.max_text_length
            )));
        }
        Ok(())
    }

    async fn resolve_target(&self, code: &str) -> Result<Language> {
        let language = self
            .store
            .find_language(code)
            .await?
            .ok_or_else(|| Error::not_found(format!("language '{}'", code)))?;

        if !language.is_active {
            return Err(Error::validation(format!(
                "language '{}' is not active",
                code
            )));
        }
        Ok(language)
    }

    async fn resolve_source(&self, requested: Option<&str>) -> Result<String> {
        if let Some(code) = requested {
            return Ok(code.to_string());
        }
        let default = self
            .store
            .list_languages(false)
            .await?
            .into_iter()
            .find(|l| l.is_default);
        Ok(default
            .map(|l| l.code)
            .unwrap_or_else(|| FALLBACK_SOURCE_LANGUAGE.to_string()))
    }

    async fn lookup_or_create(
        &self,
        text: &str,
        language: &Language,
        source_language_code: Option<&str>,
        context: Option<TranslationContext>,
    ) -> Result<TranslateResult> {
        let key = derive_key(text, &language.code)?;

        if let Some(cached) = self
            .store
            .find_by_key_and_language(&key, &language.code)
            .await?
        {
            debug!("Cache hit for translation {} ('{}')", cached.id, language.code);
            self.metrics.record_cache_hit();
            self.record_usage(cached.id).await;
            return Ok(TranslateResult {
                translated_text: cached.destination_text,
                from_cache: true,
            });
        }

        debug!("Cache miss for key {} ('{}')", key, language.code);
        self.metrics.record_cache_miss();

        let source = self.resolve_source(source_language_code).await?;
        let original = text.trim();

        self.metrics.record_provider_call();
        let translated = match self
            .provider
            .translate(original, &source, &language.code)
            .await
        {
            Ok(translated) => translated,
            Err(e) => {
                self.metrics.record_provider_failure();
                return Err(Error::Provider(e));
            }
        };

        let created = self
            .store
            .create(NewTranslation {
                key,
                original_text: original.to_string(),
                destination_text: translated,
                language_code: language.code.clone(),
                context,
                approval: Approval::Pending,
            })
            .await?;

        info!(
            "Created pending translation {} ('{}' via {})",
            created.id,
            language.code,
            self.provider.name()
        );

        Ok(TranslateResult {
            translated_text: created.destination_text,
            from_cache: false,
        })
    }

    /// Bump the usage counter without holding up the caller.
    async fn record_usage(&self, id: i64) {
        let store = Arc::clone(&self.store);
        let mut updates = self.usage_updates.lock().await;
        // Reap finished updates so the set stays small
        while updates.try_join_next().is_some() {}
        updates.spawn(async move {
            if let Err(e) = store.increment_usage(id).await {
                warn!("Failed to record usage for translation {}: {}", id, e);
            }
        });
    }

    // ==================== Approval workflow ====================

    /// Mark a pending translation as approved.
    ///
    /// Approving twice is an error, not a no-op. Of two concurrent approvals
    /// exactly one succeeds.
    pub async fn approve(&self, id: i64, approved_by: &str) -> Result<Translation> {
        let approved_by = approved_by.trim();
        if approved_by.is_empty() {
            return Err(Error::validation("approver must not be empty"));
        }

        let approved = self.store.approve(id, approved_by, Utc::now()).await?;

        info!("Translation {} approved by {}", id, approved_by);
        Ok(approved)
    }

    pub async fn pending_approvals(&self) -> Result<Vec<Translation>> {
        self.store.find_pending_approval().await
    }

    // ==================== Admin operations ====================

    pub async fn get_translation(&self, id: i64) -> Result<Translation> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("translation {}", id)))
    }

    /// Store a translation supplied by an admin, optionally pre-approved.
    pub async fn create_translation(&self, request: CreateTranslation) -> Result<Translation> {
        self.validate_text(&request.text)?;
        if request.destination_text.trim().is_empty() {
            return Err(Error::validation("destination text must not be empty"));
        }

        let language = self
            .store
            .find_language(&request.language_code)
            .await?
            .ok_or_else(|| Error::not_found(format!("language '{}'", request.language_code)))?;
        let key = derive_key(&request.text, &language.code)?;

        let approval = match request.approved_by.as_deref().map(str::trim) {
            None => Approval::Pending,
            Some("") => return Err(Error::validation("approver must not be empty")),
            Some(approver) => Approval::Approved {
                approved_by: approver.to_string(),
                approved_at: Utc::now(),
            },
        };

        let created = self
            .store
            .create(NewTranslation {
                key,
                original_text: request.text.trim().to_string(),
                destination_text: request.destination_text,
                language_code: language.code,
                context: request.context,
                approval,
            })
            .await?;

        info!(
            "Created translation {} ('{}', approved: {})",
            created.id,
            created.language_code,
            created.is_approved()
        );
        Ok(created)
    }

    /// Edit the text or context of a translation.
    ///
    /// Approval cannot change here; use `approve`.
    pub async fn update_translation(
        &self,
        id: i64,
        update: TranslationUpdate,
    ) -> Result<Translation> {
        if update.approval.is_some() {
            return Err(Error::business_rule(
                "approval state changes only through approve",
            ));
        }
        if let Some(text) = &update.destination_text {
            if text.trim().is_empty() {
                return Err(Error::validation("destination text must not be empty"));
            }
        }
        self.store.update(id, update).await
    }

    /// Delete a translation unless it is approved and heavily used.
    pub async fn delete_translation(&self, id: i64) -> Result<()> {
        let translation = self.get_translation(id).await?;
        if translation.is_approved()
            && translation.usage_count > self.limits.delete_protection_threshold
        {
            return Err(Error::business_rule(format!(
                "translation {} is approved and used {} times (limit {})",
                id, translation.usage_count, self.limits.delete_protection_threshold
            )));
        }

        self.store.delete(id).await?;
        info!("Deleted translation {}", id);
        Ok(())
    }
}
