//! Translation lookup cache with an approval workflow.
//!
//! - `key`: deterministic cache keys over (text, language)
//! - `store`: persistence seam (in-memory and PostgreSQL)
//! - `provider`: producers of translations for cache misses
//! - `translator`: lookup-or-create, batch translation, approval, admin operations
//! - `catalog`: language registration and default-language rules

pub mod catalog;
pub mod config;
pub mod error;
pub mod key;
pub mod language;
pub mod metrics;
pub mod provider;
pub mod retry;
pub mod store;
pub mod translation;
pub mod translator;

pub use error::{Error, Result};
