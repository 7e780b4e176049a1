use async_trait::async_trait;

use super::errors::AiResult;

/// A language model used for writing assistance.
///
/// Implementations return the model's raw answer. Trimming, fallbacks and
/// retries are applied by [`AiService`](super::AiService).
#[async_trait]
pub trait TextTransform: Send + Sync {
    /// Short summary of `text` in two or three sentences
    async fn summarize(&self, text: &str) -> AiResult<String>;

    /// `text` rewritten for grammar, clarity and readability
    async fn enhance(&self, text: &str) -> AiResult<String>;

    /// A few words that continue `text`, given the surrounding `context`
    async fn autocomplete(&self, text: &str, context: &str) -> AiResult<String>;

    /// One-sentence definition of `word`
    async fn define(&self, word: &str) -> AiResult<String>;

    /// Cheap round trip used to verify credentials
    async fn health_check(&self) -> AiResult<()> {
        Ok(())
    }
}
