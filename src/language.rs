//! Language records: the locales translations can target.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text direction of a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "ltr" => Ok(Direction::Ltr),
            "rtl" => Ok(Direction::Rtl),
            other => Err(Error::validation(format!(
                "unknown text direction '{}'",
                other
            ))),
        }
    }
}

/// Locale metadata attached to a language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LocaleInfo {
    pub direction: Direction,
    /// Region code (e.g., "US", "MX")
    pub region: Option<String>,
    /// ISO 4217 currency code (e.g., "USD")
    pub currency: Option<String>,
    /// Display date format (e.g., "MM/DD/YYYY")
    pub date_format: Option<String>,
}

/// A registered language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Language {
    /// ISO 639-1 language code (e.g., "en", "es")
    pub code: String,
    /// English name of the language (e.g., "Spanish")
    pub name: String,
    /// Native name of the language (e.g., "Español")
    pub native_name: String,
    pub is_active: bool,
    pub is_default: bool,
    pub locale: LocaleInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLanguage {
    pub code: String,
    pub name: String,
    pub native_name: String,
    pub is_active: bool,
    pub is_default: bool,
    pub locale: LocaleInfo,
}

impl NewLanguage {
    /// Active, non-default language with left-to-right locale metadata.
    pub fn new(code: &str, name: &str, native_name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            native_name: native_name.to_string(),
            is_active: true,
            is_default: false,
            locale: LocaleInfo::default(),
        }
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn with_locale(mut self, locale: LocaleInfo) -> Self {
        self.locale = locale;
        self
    }

    pub(crate) fn into_language(self, now: DateTime<Utc>) -> Language {
        Language {
            code: self.code,
            name: self.name,
            native_name: self.native_name,
            is_active: self.is_active,
            is_default: self.is_default,
            locale: self.locale,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a language. `None` fields are left unchanged.
///
/// The default flag is not part of this update; it moves through
/// `set_default_language` so exclusivity holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageUpdate {
    pub name: Option<String>,
    pub native_name: Option<String>,
    pub is_active: Option<bool>,
    pub locale: Option<LocaleInfo>,
}

impl LanguageUpdate {
    pub(crate) fn apply(self, language: &mut Language, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            language.name = name;
        }
        if let Some(native_name) = self.native_name {
            language.native_name = native_name;
        }
        if let Some(is_active) = self.is_active {
            language.is_active = is_active;
        }
        if let Some(locale) = self.locale {
            language.locale = locale;
        }
        language.updated_at = now;
    }
}

/// Languages inserted by `seed` when absent: English (default) and Spanish.
pub fn default_languages() -> Vec<NewLanguage> {
    vec![
        NewLanguage::new("en", "English", "English")
            .as_default()
            .with_locale(LocaleInfo {
                direction: Direction::Ltr,
                region: Some("US".to_string()),
                currency: Some("USD".to_string()),
                date_format: Some("MM/DD/YYYY".to_string()),
            }),
        NewLanguage::new("es", "Spanish", "Español").with_locale(LocaleInfo {
            direction: Direction::Ltr,
            region: Some("ES".to_string()),
            currency: Some("EUR".to_string()),
            date_format: Some("DD/MM/YYYY".to_string()),
        }),
    ]
}
