//! Retry utilities with exponential backoff.
//!
//! The analysis client makes a single attempt. Retrying is an explicit
//! policy applied by wrapping an analyzer in [`RetryingAnalyzer`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use shotlist_models::{EncodedVideo, Shot};

use crate::client::ShotAnalyzer;
use crate::error::{AnalysisError, AnalysisResult};

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Base delay for exponential backoff (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Operation name for logging.
    pub operation_name: String,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            operation_name: "operation".to_string(),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with the given operation name.
    pub fn new(operation_name: impl Into<String>) -> Self {
        Self {
            operation_name: operation_name.into(),
            ..Default::default()
        }
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay for exponential backoff.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Calculate delay for a given attempt number.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay = self.base_delay.saturating_mul(2u32.saturating_pow(attempt));
        delay.min(self.max_delay)
    }
}

/// Execute an async operation, retrying errors accepted by `should_retry`.
pub async fn retry_async<F, Fut, T, E, P>(
    config: &RetryConfig,
    should_retry: P,
    operation: F,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < config.max_retries && should_retry(&e) => {
                let delay = config.delay_for_attempt(attempt);
                attempt += 1;
                warn!(
                    "{} attempt {} failed, retrying in {:?}: {}",
                    config.operation_name, attempt, delay, e
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                debug!(
                    "{} giving up after {} attempts",
                    config.operation_name,
                    attempt + 1
                );
                return Err(e);
            }
        }
    }
}

/// Analyzer wrapper that retries transient failures.
pub struct RetryingAnalyzer<A> {
    inner: A,
    config: RetryConfig,
}

impl<A: ShotAnalyzer> RetryingAnalyzer<A> {
    pub fn new(inner: A, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl<A: ShotAnalyzer> ShotAnalyzer for RetryingAnalyzer<A> {
    async fn analyze(&self, payload: &EncodedVideo) -> AnalysisResult<Vec<Shot>> {
        retry_async(&self.config, AnalysisError::is_retryable, || {
            self.inner.analyze(payload)
        })
        .await
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
