use super::TranslationProvider;
use async_trait::async_trait;

/// Placeholder provider: tags the text with the target code instead of
/// translating it. Same-language requests come back unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoProvider;

#[async_trait]
impl TranslationProvider for EchoProvider {
    async fn translate(&self, text: &str, source: &str, target: &str) -> anyhow::Result<String> {
        if source == target {
            return Ok(text.to_string());
        }
        Ok(format!("[{}] {}", target, text))
    }

    fn name(&self) -> &'static str {
        "echo"
    }
}
