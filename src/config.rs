use crate::provider::{EchoProvider, OpenAiConfig, OpenAiProvider, TranslationProvider};
use crate::translator::Limits;
use anyhow::{bail, Context, Result};
use std::sync::Arc;

/// Which translation provider handles cache misses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Echo,
    OpenAi,
}

impl ProviderKind {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "echo" => Ok(ProviderKind::Echo),
            "openai" => Ok(ProviderKind::OpenAi),
            other => bail!("Unknown TRANSLATION_PROVIDER '{}' (expected echo or openai)", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,

    // Provider
    pub provider: ProviderKind,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_api_url: String,

    // Limits
    pub max_text_length: usize,
    pub max_batch_size: usize,
    pub delete_protection_threshold: i64,
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Limits::default();

        let provider = match std::env::var("TRANSLATION_PROVIDER") {
            Ok(value) => ProviderKind::parse(&value)?,
            Err(_) => ProviderKind::Echo,
        };

        let config = Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL not set")?,

            provider,
            openai_api_key: std::env::var("OPENAI_API_KEY").ok(),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_api_url: std::env::var("OPENAI_API_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),

            max_text_length: parse_or("MAX_TEXT_LENGTH", defaults.max_text_length),
            max_batch_size: parse_or("MAX_BATCH_SIZE", defaults.max_batch_size),
            delete_protection_threshold: parse_or(
                "DELETE_PROTECTION_THRESHOLD",
                defaults.delete_protection_threshold,
            ),
        };

        if config.provider == ProviderKind::OpenAi && config.openai_api_key.is_none() {
            bail!("OPENAI_API_KEY not set (required when TRANSLATION_PROVIDER=openai)");
        }

        Ok(config)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_text_length: self.max_text_length,
            max_batch_size: self.max_batch_size,
            delete_protection_threshold: self.delete_protection_threshold,
        }
    }

    /// Build the configured provider.
    pub fn build_provider(&self) -> Result<Arc<dyn TranslationProvider>> {
        match self.provider {
            ProviderKind::Echo => Ok(Arc::new(EchoProvider)),
            ProviderKind::OpenAi => {
                let api_key = self
                    .openai_api_key
                    .as_deref()
                    .context("OPENAI_API_KEY not set")?;
                Ok(Arc::new(OpenAiProvider::new(OpenAiConfig::new(
                    api_key,
                    &self.openai_model,
                    &self.openai_api_url,
                ))))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "DATABASE_URL",
        "TRANSLATION_PROVIDER",
        "OPENAI_API_KEY",
        "OPENAI_MODEL",
        "OPENAI_API_URL",
        "MAX_TEXT_LENGTH",
        "MAX_BATCH_SIZE",
        "DELETE_PROTECTION_THRESHOLD",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/translations");

        let config = Config::from_env().expect("Should load");
        assert_eq!(config.provider, ProviderKind::Echo);
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert_eq!(config.limits(), Limits::default());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_requires_database_url() {
        clear_env();
        let result = Config::from_env();
        assert!(result.unwrap_err().to_string().contains("DATABASE_URL"));
    }

    #[test]
    #[serial]
    fn test_from_env_overrides_limits() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/translations");
        std::env::set_var("MAX_TEXT_LENGTH", "200");
        std::env::set_var("MAX_BATCH_SIZE", "not-a-number");
        std::env::set_var("DELETE_PROTECTION_THRESHOLD", "10");

        let config = Config::from_env().expect("Should load");
        assert_eq!(config.max_text_length, 200);
        assert_eq!(config.max_batch_size, 100);
        assert_eq!(config.delete_protection_threshold, 10);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_openai_requires_api_key() {
        clear_env();
        std::env::set_var("DATABASE_URL", "postgres://localhost/translations");
        std::env::set_var("TRANSLATION_PROVIDER", "openai");

        let result = Config::from_env();
        assert!(result.unwrap_err().to_string().contains("OPENAI_API_KEY"));

        std::env::set_var("OPENAI_API_KEY", "sk-test");
        let config = Config::from_env().expect("Should load with key");
        assert_eq!(config.build_provider().unwrap().name(), "openai");

        clear_env();
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!(ProviderKind::parse("echo").unwrap(), ProviderKind::Echo);
        assert_eq!(ProviderKind::parse(" OpenAI ").unwrap(), ProviderKind::OpenAi);
        assert!(ProviderKind::parse("deepl").is_err());
    }
}
