//! Retry provider - decorator that adds automatic retry with backoff.
//!
//! Wraps any [`LLMProvider`] to transparently retry transient errors:
//! connection failures and HTTP 429/5xx statuses as classified by
//! [`ProviderError::is_retryable`](crate::error::ProviderError::is_retryable).
//!
//! The run loop treats a provider call as atomic-but-possibly-slow; retry
//! lives entirely inside this decorator and is never duplicated upstream.
//!
//! # Example
//!
//! ```rust,ignore
//! use femtoagent::providers::{AnthropicProvider, RetryProvider};
//! use std::sync::Arc;
//!
//! let inner = AnthropicProvider::new("api-key");
//! let provider = RetryProvider::new(Arc::new(inner));
//!
//! // Use `provider` as any other LLMProvider - retries happen automatically.
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::conversation::Message;
use crate::error::{AgentError, Result};

use super::{ChatOptions, LLMProvider, LLMResponse, ToolDefinition};

/// Default number of attempts per logical call (first try + retries).
const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default base backoff delay in milliseconds.
const DEFAULT_BASE_DELAY_MS: u64 = 1000;

/// A decorator provider that retries transient LLM errors with a fixed
/// exponential backoff schedule.
///
/// With the defaults, a logical call makes up to 3 attempts, sleeping 1s
/// after the first failure and 2s after the second (the schedule doubles per
/// attempt, with no jitter). Non-transient errors are returned immediately
/// without consuming a retry; after the last attempt the last observed error
/// propagates to the caller.
pub struct RetryProvider {
    /// The wrapped provider that performs actual LLM requests.
    inner: Arc<dyn LLMProvider>,
    /// Total attempts per logical call. Default: 3.
    max_attempts: u32,
    /// Base delay in milliseconds for the exponential schedule. Default: 1000.
    base_delay_ms: u64,
}

impl std::fmt::Debug for RetryProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryProvider")
            .field("inner", &self.inner.name())
            .field("max_attempts", &self.max_attempts)
            .field("base_delay_ms", &self.base_delay_ms)
            .finish()
    }
}

impl RetryProvider {
    /// Create a new `RetryProvider` wrapping the given inner provider.
    ///
    /// Uses default retry settings: 3 attempts, 1s base delay.
    pub fn new(inner: Arc<dyn LLMProvider>) -> Self {
        Self {
            inner,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
        }
    }

    /// Set the total number of attempts per logical call (minimum 1).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Set the base delay in milliseconds for the backoff schedule.
    ///
    /// The delay after failed attempt `n` (0-indexed) is
    /// `base_delay_ms * 2^n`. Tests shrink this to keep runs fast.
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }
}

/// Check whether an [`AgentError`] represents a transient failure that
/// should be retried.
///
/// Only classified provider errors are ever retried; configuration,
/// validation, and template errors propagate immediately.
pub fn is_retryable(err: &AgentError) -> bool {
    match err {
        AgentError::Provider(pe) => pe.is_retryable(),
        _ => false,
    }
}

/// Compute the backoff delay for a failed attempt (0-indexed).
///
/// Fixed exponential schedule with no jitter: `base * 2^attempt`.
pub fn backoff_delay(attempt: u32, base_delay_ms: u64) -> Duration {
    Duration::from_millis(base_delay_ms.saturating_mul(1u64 << attempt.min(16)))
}

#[async_trait]
impl LLMProvider for RetryProvider {
    fn name(&self) -> &str {
        // Delegate to the inner provider; the wrapping is evident from the
        // type itself.
        self.inner.name()
    }

    fn default_model(&self) -> &str {
        self.inner.default_model()
    }

    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<LLMResponse> {
        let mut last_err: Option<AgentError> = None;

        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                if let Some(ref err) = last_err {
                    warn!(
                        provider = self.inner.name(),
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "Retrying chat request after transient error"
                    );
                }
                tokio::time::sleep(backoff_delay(attempt - 1, self.base_delay_ms)).await;
            }

            match self
                .inner
                .chat(messages.clone(), tools.clone(), model, options.clone())
                .await
            {
                Ok(response) => return Ok(response),
                Err(err) => {
                    if !is_retryable(&err) || attempt + 1 == self.max_attempts {
                        return Err(err);
                    }
                    last_err = Some(err);
                }
            }
        }

        // Unreachable: the loop always returns. Keep a sensible fallback for
        // the compiler.
        Err(last_err
            .unwrap_or_else(|| AgentError::Config("Retry loop exited without result".to_string())))
    }
}
