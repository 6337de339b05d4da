//! Reply source trait

use async_trait::async_trait;

use crate::{Language, Result};

/// Produces a reply for a user prompt
///
/// Implementations:
/// - `KeywordResolver` - canned per-language keyword table with simulated latency
///
/// A future backend-backed implementation slots in here unchanged.
/// Callers may drop the returned future to abandon a resolution.
#[async_trait]
pub trait ReplySource: Send + Sync + 'static {
    /// Resolve `prompt` to a reply in `language`
    async fn resolve(&self, prompt: &str, language: Language) -> Result<String>;

    /// Get source name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    struct Echo;

    #[async_trait]
    impl ReplySource for Echo {
        async fn resolve(&self, prompt: &str, language: Language) -> Result<String> {
            if prompt.is_empty() {
                return Err(Error::Resolution("empty prompt".to_string()));
            }
            Ok(format!("[{}] {}", language.code(), prompt))
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_reply_source_object_safe() {
        let source: Box<dyn ReplySource> = Box::new(Echo);
        let reply = source.resolve("soil", Language::Hindi).await.unwrap();
        assert_eq!(reply, "[hi] soil");
        assert!(source.resolve("", Language::English).await.is_err());
    }
}
