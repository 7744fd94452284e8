use super::{LanguageStore, TranslationStore};
use crate::error::{Error, Result};
use crate::language::{Direction, Language, LanguageUpdate, LocaleInfo, NewLanguage};
use crate::translation::{Approval, NewTranslation, Translation, TranslationContext, TranslationUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::info;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS languages (
        code TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        native_name TEXT NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        is_default BOOLEAN NOT NULL DEFAULT FALSE,
        direction TEXT NOT NULL DEFAULT 'ltr',
        region TEXT,
        currency TEXT,
        date_format TEXT,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )",
    // At most one default language
    "CREATE UNIQUE INDEX IF NOT EXISTS languages_single_default
        ON languages (is_default) WHERE is_default",
    "CREATE TABLE IF NOT EXISTS language_values (
        id BIGSERIAL PRIMARY KEY,
        cache_key TEXT NOT NULL,
        original_text TEXT NOT NULL,
        destination_text TEXT NOT NULL,
        language_code TEXT NOT NULL REFERENCES languages (code),
        category TEXT,
        module TEXT,
        component TEXT,
        field TEXT,
        approved_by TEXT,
        approved_at TIMESTAMPTZ,
        usage_count BIGINT NOT NULL DEFAULT 0,
        last_used_at TIMESTAMPTZ,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        CONSTRAINT approval_complete CHECK ((approved_by IS NULL) = (approved_at IS NULL))
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS language_values_key_language
        ON language_values (cache_key, language_code)",
    "CREATE INDEX IF NOT EXISTS language_values_pending
        ON language_values (created_at) WHERE approved_by IS NULL",
];

const LANGUAGE_COLUMNS: &str = "code, name, native_name, is_active, is_default, direction, \
     region, currency, date_format, created_at, updated_at";

const TRANSLATION_COLUMNS: &str = "id, cache_key, original_text, destination_text, language_code, \
     category, module, component, field, approved_by, approved_at, usage_count, last_used_at, \
     created_at, updated_at";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database. Does not touch the schema; call `migrate`.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes if they do not exist.
    pub async fn migrate(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is up to date");
        Ok(())
    }

    async fn find_translation_locked(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        id: i64,
    ) -> Result<Translation> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM language_values WHERE id = $1 FOR UPDATE",
            TRANSLATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        match row {
            Some(row) => translation_from_row(&row),
            None => Err(Error::not_found(format!("translation {}", id))),
        }
    }
}

/// Map unique-index violations to `Conflict`, anything else to `Database`.
fn conflict_or_database(error: sqlx::Error, describe: impl FnOnce() -> String) -> Error {
    match &error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            Error::conflict(describe())
        }
        _ => Error::Database(error),
    }
}

fn language_from_row(row: &PgRow) -> Result<Language> {
    let direction: String = row.try_get("direction")?;
    Ok(Language {
        code: row.try_get("code")?,
        name: row.try_get("name")?,
        native_name: row.try_get("native_name")?,
        is_active: row.try_get("is_active")?,
        is_default: row.try_get("is_default")?,
        locale: LocaleInfo {
            direction: Direction::parse(&direction)?,
            region: row.try_get("region")?,
            currency: row.try_get("currency")?,
            date_format: row.try_get("date_format")?,
        },
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn translation_from_row(row: &PgRow) -> Result<Translation> {
    let category: Option<String> = row.try_get("category")?;
    let module: Option<String> = row.try_get("module")?;
    let component: Option<String> = row.try_get("component")?;
    let field: Option<String> = row.try_get("field")?;
    let context = if category.is_none() && module.is_none() && component.is_none() && field.is_none()
    {
        None
    } else {
        Some(TranslationContext {
            category,
            module,
            component,
            field,
        })
    };

    let approved_by: Option<String> = row.try_get("approved_by")?;
    let approved_at: Option<DateTime<Utc>> = row.try_get("approved_at")?;
    let approval = match (approved_by, approved_at) {
        (Some(approved_by), Some(approved_at)) => Approval::Approved {
            approved_by,
            approved_at,
        },
        _ => Approval::Pending,
    };

    Ok(Translation {
        id: row.try_get("id")?,
        key: row.try_get("cache_key")?,
        original_text: row.try_get("original_text")?,
        destination_text: row.try_get("destination_text")?,
        language_code: row.try_get("language_code")?,
        context,
        approval,
        usage_count: row.try_get("usage_count")?,
        last_used_at: row.try_get("last_used_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn approval_columns(approval: &Approval) -> (Option<&str>, Option<DateTime<Utc>>) {
    match approval {
        Approval::Pending => (None, None),
        Approval::Approved {
            approved_by,
            approved_at,
        } => (Some(approved_by.as_str()), Some(*approved_at)),
    }
}

fn context_columns(
    context: Option<&TranslationContext>,
) -> (Option<&str>, Option<&str>, Option<&str>, Option<&str>) {
    match context {
        Some(ctx) => (
            ctx.category.as_deref(),
            ctx.module.as_deref(),
            ctx.component.as_deref(),
            ctx.field.as_deref(),
        ),
        None => (None, None, None, None),
    }
}

#[async_trait]
impl LanguageStore for PgStore {
    async fn find_language(&self, code: &str) -> Result<Option<Language>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM languages WHERE code = $1",
            LANGUAGE_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(language_from_row).transpose()
    }

    async fn list_languages(&self, active_only: bool) -> Result<Vec<Language>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM languages WHERE is_active OR NOT $1 ORDER BY code",
            LANGUAGE_COLUMNS
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(language_from_row).collect()
    }

    async fn create_language(&self, language: NewLanguage) -> Result<Language> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        if language.is_default {
            sqlx::query("UPDATE languages SET is_default = FALSE, updated_at = $1 WHERE is_default")
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        let code = language.code.clone();
        let row = sqlx::query(&format!(
            "INSERT INTO languages ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
             RETURNING {}",
            LANGUAGE_COLUMNS, LANGUAGE_COLUMNS
        ))
        .bind(&language.code)
        .bind(&language.name)
        .bind(&language.native_name)
        .bind(language.is_active)
        .bind(language.is_default)
        .bind(language.locale.direction.as_str())
        .bind(&language.locale.region)
        .bind(&language.locale.currency)
        .bind(&language.locale.date_format)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_or_database(e, || format!("language '{}' already exists", code)))?;

        let created = language_from_row(&row)?;
        tx.commit().await?;
        Ok(created)
    }

    async fn update_language(&self, code: &str, update: LanguageUpdate) -> Result<Language> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            "SELECT {} FROM languages WHERE code = $1 FOR UPDATE",
            LANGUAGE_COLUMNS
        ))
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::not_found(format!("language '{}'", code)))?;

        let mut language = language_from_row(&row)?;
        update.apply(&mut language, Utc::now());

        sqlx::query(
            "UPDATE languages SET name = $2, native_name = $3, is_active = $4, direction = $5,
                 region = $6, currency = $7, date_format = $8, updated_at = $9
             WHERE code = $1",
        )
        .bind(&language.code)
        .bind(&language.name)
        .bind(&language.native_name)
        .bind(language.is_active)
        .bind(language.locale.direction.as_str())
        .bind(&language.locale.region)
        .bind(&language.locale.currency)
        .bind(&language.locale.date_format)
        .bind(language.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(language)
    }

    async fn set_default_language(&self, code: &str) -> Result<Language> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let exists = sqlx::query("SELECT code FROM languages WHERE code = $1 FOR UPDATE")
            .bind(code)
            .fetch_optional(&mut *tx)
            .await?
            .is_some();
        if !exists {
            return Err(Error::not_found(format!("language '{}'", code)));
        }

        // Clear first: the partial unique index is checked per row
        sqlx::query(
            "UPDATE languages SET is_default = FALSE, updated_at = $2
             WHERE is_default AND code <> $1",
        )
        .bind(code)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query(&format!(
            "UPDATE languages SET is_default = TRUE, updated_at = $2 WHERE code = $1 RETURNING {}",
            LANGUAGE_COLUMNS
        ))
        .bind(code)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let language = language_from_row(&row)?;
        tx.commit().await?;
        Ok(language)
    }

    async fn delete_language(&self, code: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM languages WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found(format!("language '{}'", code)));
        }
        Ok(())
    }
}

#[async_trait]
impl TranslationStore for PgStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Translation>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM language_values WHERE id = $1",
            TRANSLATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(translation_from_row).transpose()
    }

    async fn find_by_key_and_language(
        &self,
        key: &str,
        language_code: &str,
    ) -> Result<Option<Translation>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM language_values WHERE cache_key = $1 AND language_code = $2",
            TRANSLATION_COLUMNS
        ))
        .bind(key)
        .bind(language_code)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(translation_from_row).transpose()
    }

    async fn create(&self, translation: NewTranslation) -> Result<Translation> {
        let now = Utc::now();
        let (category, module, component, field) = context_columns(translation.context.as_ref());
        let (approved_by, approved_at) = approval_columns(&translation.approval);

        let row = sqlx::query(&format!(
            "INSERT INTO language_values (cache_key, original_text, destination_text, language_code,
                 category, module, component, field, approved_by, approved_at, usage_count,
                 last_used_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, 0, NULL, $11, $11)
             RETURNING {}",
            TRANSLATION_COLUMNS
        ))
        .bind(&translation.key)
        .bind(&translation.original_text)
        .bind(&translation.destination_text)
        .bind(&translation.language_code)
        .bind(category)
        .bind(module)
        .bind(component)
        .bind(field)
        .bind(approved_by)
        .bind(approved_at)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            conflict_or_database(e, || {
                format!(
                    "translation with key {} already exists for '{}'",
                    translation.key, translation.language_code
                )
            })
        })?;

        translation_from_row(&row)
    }

    async fn update(&self, id: i64, update: TranslationUpdate) -> Result<Translation> {
        let mut tx = self.pool.begin().await?;
        let mut translation = Self::find_translation_locked(&mut tx, id).await?;
        update.apply(&mut translation, Utc::now());

        let (category, module, component, field) = context_columns(translation.context.as_ref());
        let (approved_by, approved_at) = approval_columns(&translation.approval);

        sqlx::query(
            "UPDATE language_values SET destination_text = $2, category = $3, module = $4,
                 component = $5, field = $6, approved_by = $7, approved_at = $8, updated_at = $9
             WHERE id = $1",
        )
        .bind(id)
        .bind(&translation.destination_text)
        .bind(category)
        .bind(module)
        .bind(component)
        .bind(field)
        .bind(approved_by)
        .bind(approved_at)
        .bind(translation.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(translation)
    }

    async fn approve(
        &self,
        id: i64,
        approved_by: &str,
        approved_at: DateTime<Utc>,
    ) -> Result<Translation> {
        let row = sqlx::query(&format!(
            "UPDATE language_values SET approved_by = $2, approved_at = $3, updated_at = $3
             WHERE id = $1 AND approved_by IS NULL
             RETURNING {}",
            TRANSLATION_COLUMNS
        ))
        .bind(id)
        .bind(approved_by)
        .bind(approved_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return translation_from_row(&row);
        }
        match self.find_by_id(id).await? {
            Some(_) => Err(Error::business_rule(format!(
                "translation {} is already approved",
                id
            ))),
            None => Err(Error::not_found(format!("translation {}", id))),
        }
    }

    async fn increment_usage(&self, id: i64) -> Result<()> {
        let result = sqlx::query(
            "UPDATE language_values SET usage_count = usage_count + 1, last_used_at = $2
             WHERE id = $1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found(format!("translation {}", id)));
        }
        Ok(())
    }

    async fn find_pending_approval(&self) -> Result<Vec<Translation>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM language_values WHERE approved_by IS NULL ORDER BY created_at, id",
            TRANSLATION_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(translation_from_row).collect()
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM language_values WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::not_found(format!("translation {}", id)));
        }
        Ok(())
    }

    async fn count_by_language(&self, language_code: &str) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM language_values WHERE language_code = $1")
                .bind(language_code)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
