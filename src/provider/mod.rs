//! Translation providers: whatever produces text for a cache miss.

mod echo;
mod openai;

pub use echo::EchoProvider;
pub use openai::{OpenAiConfig, OpenAiProvider};

use async_trait::async_trait;

#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translate `text` from `source` to `target` (ISO 639-1 codes).
    async fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
