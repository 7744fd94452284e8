//! Cache key derivation.
//!
//! A key identifies one (source text, language) pair. It is a hex-encoded
//! SHA-256 digest of `"{trimmed_text}_{language_code}"`, so surrounding
//! whitespace does not produce distinct cache entries.

use crate::error::{Error, Result};
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

static LANGUAGE_CODE: OnceLock<Regex> = OnceLock::new();

fn language_code_pattern() -> &'static Regex {
    LANGUAGE_CODE.get_or_init(|| Regex::new(r"^[a-z]{2}$").expect("static pattern is valid"))
}

/// Check that a language code is two lowercase ASCII letters (ISO 639-1 shape).
pub fn validate_language_code(code: &str) -> Result<()> {
    if language_code_pattern().is_match(code) {
        Ok(())
    } else {
        Err(Error::validation(format!(
            "invalid language code '{}': expected two lowercase letters",
            code
        )))
    }
}

/// Derive the cache key for a text in a language.
///
/// # Errors
/// * `Validation` if `text` is empty or whitespace-only
/// * `Validation` if `language_code` is not two lowercase letters
pub fn derive_key(text: &str, language_code: &str) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("text must not be empty"));
    }
    validate_language_code(language_code)?;

    let digest = Sha256::digest(format!("{}_{}", trimmed, language_code).as_bytes());
    Ok(format!("{:x}", digest))
}
