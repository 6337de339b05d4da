//! Canned reply resolver
//!
//! Stands in for a remote advisory service: waits a random, configurable
//! latency and answers from the language catalog's keyword tables.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use kisan_chat_config::{LanguageCatalog, ResolverConfig};
use kisan_chat_core::{Language, ReplySource, Result};

/// Keyword-table reply source with simulated latency
pub struct KeywordResolver {
    catalog: Arc<LanguageCatalog>,
    min_latency_ms: u64,
    max_latency_ms: u64,
}

impl KeywordResolver {
    pub fn new(catalog: Arc<LanguageCatalog>, config: &ResolverConfig) -> Self {
        Self {
            catalog,
            min_latency_ms: config.min_latency_ms,
            max_latency_ms: config.max_latency_ms.max(config.min_latency_ms),
        }
    }

    /// Resolver that answers without delay
    pub fn instant(catalog: Arc<LanguageCatalog>) -> Self {
        Self {
            catalog,
            min_latency_ms: 0,
            max_latency_ms: 0,
        }
    }

    /// Synchronous table lookup
    pub fn lookup(&self, prompt: &str, language: Language) -> &str {
        self.catalog.reply_for(prompt, language)
    }

    fn latency(&self) -> Duration {
        let ms = if self.min_latency_ms >= self.max_latency_ms {
            self.min_latency_ms
        } else {
            rand::thread_rng().gen_range(self.min_latency_ms..=self.max_latency_ms)
        };
        Duration::from_millis(ms)
    }
}

#[async_trait]
impl ReplySource for KeywordResolver {
    async fn resolve(&self, prompt: &str, language: Language) -> Result<String> {
        let delay = self.latency();
        tracing::debug!(
            language = %language,
            delay_ms = delay.as_millis() as u64,
            "Resolving reply"
        );

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        Ok(self.lookup(prompt, language).to_string())
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn catalog() -> Arc<LanguageCatalog> {
        Arc::new(LanguageCatalog::builtin().clone())
    }

    #[tokio::test]
    async fn test_resolve_keyword() {
        let resolver = KeywordResolver::instant(catalog());
        let reply = resolver
            .resolve("Which fertilizer for wheat?", Language::English)
            .await
            .unwrap();
        assert!(reply.starts_with("A balanced NPK fertilizer"));

        let reply = resolver.resolve("मिट्टी", Language::Hindi).await.unwrap();
        assert!(reply.starts_with("काली कपास मिट्टी"));
    }

    #[tokio::test]
    async fn test_resolve_default() {
        let resolver = KeywordResolver::instant(catalog());
        let reply = resolver.resolve("xyz", Language::English).await.unwrap();
        assert_eq!(reply, catalog().reply_profile(Language::English).default_reply);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_within_bounds() {
        let resolver = KeywordResolver::new(
            catalog(),
            &ResolverConfig {
                min_latency_ms: 1000,
                max_latency_ms: 2000,
            },
        );

        for _ in 0..5 {
            let started = tokio::time::Instant::now();
            resolver.resolve("soil", Language::English).await.unwrap();
            let elapsed = started.elapsed();
            assert!(elapsed >= Duration::from_millis(1000));
            assert!(elapsed <= Duration::from_millis(2001));
        }
    }

    #[tokio::test]
    async fn test_dropping_future_cancels() {
        let resolver = KeywordResolver::new(
            catalog(),
            &ResolverConfig {
                min_latency_ms: 10_000,
                max_latency_ms: 10_000,
            },
        );

        let started = Instant::now();
        let result =
            tokio::time::timeout(Duration::from_millis(20), resolver.resolve("soil", Language::English))
                .await;
        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
