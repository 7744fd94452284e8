//! Translation records (cached language values) and their approval state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form tags describing where a text is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationContext {
    pub category: Option<String>,
    pub module: Option<String>,
    pub component: Option<String>,
    pub field: Option<String>,
}

/// Review state of a translation.
///
/// `Pending --approve--> Approved`; there is no way back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Approval {
    Pending,
    Approved {
        approved_by: String,
        approved_at: DateTime<Utc>,
    },
}

impl Approval {
    pub fn is_approved(&self) -> bool {
        matches!(self, Approval::Approved { .. })
    }
}

/// A cached translation of one source text into one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub id: i64,
    pub key: String,
    pub original_text: String,
    pub destination_text: String,
    pub language_code: String,
    pub context: Option<TranslationContext>,
    pub approval: Approval,
    pub usage_count: i64,
    pub last_used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Translation {
    pub fn is_approved(&self) -> bool {
        self.approval.is_approved()
    }
}

/// Input for inserting a translation. The store assigns `id` and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTranslation {
    pub key: String,
    pub original_text: String,
    pub destination_text: String,
    pub language_code: String,
    pub context: Option<TranslationContext>,
    pub approval: Approval,
}

impl NewTranslation {
    pub(crate) fn into_translation(self, id: i64, now: DateTime<Utc>) -> Translation {
        Translation {
            id,
            key: self.key,
            original_text: self.original_text,
            destination_text: self.destination_text,
            language_code: self.language_code,
            context: self.context,
            approval: self.approval,
            usage_count: 0,
            last_used_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a translation. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationUpdate {
    pub destination_text: Option<String>,
    pub context: Option<TranslationContext>,
    pub approval: Option<Approval>,
}

impl TranslationUpdate {
    pub(crate) fn apply(self, translation: &mut Translation, now: DateTime<Utc>) {
        if let Some(text) = self.destination_text {
            translation.destination_text = text;
        }
        if let Some(context) = self.context {
            translation.context = Some(context);
        }
        if let Some(approval) = self.approval {
            translation.approval = approval;
        }
        translation.updated_at = now;
    }
}

/// Outcome of a lookup-or-create call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslateResult {
    pub translated_text: String,
    pub from_cache: bool,
}
