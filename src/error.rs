use thiserror::Error;

/// Typed failures surfaced by the translation cache.
///
/// None of these are retried internally. Provider errors are the only ones
/// that carry an `anyhow` chain, since providers talk to external services.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad input shape, length or format
    #[error("validation failed: {0}")]
    Validation(String),

    /// Referenced language or translation does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate (key, language) pair or duplicate language code
    #[error("conflict: {0}")]
    Conflict(String),

    /// Operation blocked by a business rule (delete protection, double approval)
    #[error("business rule violation: {0}")]
    BusinessRuleViolation(String),

    #[error("translation provider failed: {0:#}")]
    Provider(anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn business_rule(msg: impl Into<String>) -> Self {
        Self::BusinessRuleViolation(msg.into())
    }
}
