//! Resilient metadata client wrapper with exponential backoff retry
//!
//! Wraps any MetadataSource implementation with retry logic to handle transient
//! failures (the public Jikan API rate-limits aggressively).

use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use charpick_domain::{AnimeId, AnimeMetadata, RosterMember};

use crate::infrastructure::ports::{MetadataFetchError, MetadataSource};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (0 = no retries, just the initial attempt)
    pub max_retries: u32,
    /// Base delay in milliseconds before first retry
    pub base_delay_ms: u64,
    /// Maximum delay in milliseconds (caps exponential growth)
    pub max_delay_ms: u64,
    /// Jitter factor (0.0-1.0) for randomizing delays
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay_ms: 500,
            max_delay_ms: 5000,
            jitter_factor: 0.2,
        }
    }
}

/// Wrapper that adds retry logic to any metadata source
pub struct ResilientMetadataSource {
    inner: Arc<dyn MetadataSource>,
    config: RetryConfig,
}

impl ResilientMetadataSource {
    pub fn new(inner: Arc<dyn MetadataSource>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// Calculate delay for a given attempt number using exponential backoff with jitter
    fn calculate_delay(&self, attempt: u32) -> u64 {
        let base = self.config.base_delay_ms;
        // Exponential: base * 2^(attempt-1)
        let exponential = base.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
        let capped = exponential.min(self.config.max_delay_ms);

        let jitter_range = (capped as f64 * self.config.jitter_factor) as i64;
        if jitter_range > 0 {
            let jitter = rand::thread_rng().gen_range(-jitter_range..=jitter_range);
            (capped as i64 + jitter).max(0) as u64
        } else {
            capped
        }
    }

    async fn execute_with_retry<T, F, Fut>(
        &self,
        operation_name: &str,
        anime_id: AnimeId,
        operation: F,
    ) -> Result<T, MetadataFetchError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, MetadataFetchError>>,
    {
        let mut attempt = 0;
        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        tracing::info!(
                            attempt = attempt + 1,
                            operation = operation_name,
                            anime_id = %anime_id,
                            "Metadata request succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(e) if attempt < self.config.max_retries && e.is_retryable() => {
                    attempt += 1;
                    let delay = self.calculate_delay(attempt);
                    tracing::warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = delay,
                        error = %e,
                        operation = operation_name,
                        anime_id = %anime_id,
                        "Metadata request failed, retrying..."
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl MetadataSource for ResilientMetadataSource {
    async fn get_anime_by_id(&self, id: AnimeId) -> Result<AnimeMetadata, MetadataFetchError> {
        self.execute_with_retry("get_anime_by_id", id, || self.inner.get_anime_by_id(id))
            .await
    }

    async fn get_anime_roster(
        &self,
        id: AnimeId,
    ) -> Result<Vec<RosterMember>, MetadataFetchError> {
        self.execute_with_retry("get_anime_roster", id, || self.inner.get_anime_roster(id))
            .await
    }
}
