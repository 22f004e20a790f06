//! Providers module - LLM providers (Anthropic, OpenAI, etc.)
//!
//! This module defines the `LLMProvider` trait and common types for
//! interacting with various LLM providers. Each provider implements the
//! `LLMProvider` trait to provide a consistent interface; the
//! [`RetryProvider`] decorator adds transparent retry with backoff around
//! any of them.
//!
//! # Example
//!
//! ```rust,ignore
//! use femtoagent::providers::{AnthropicProvider, ChatOptions, LLMProvider, RetryProvider};
//! use femtoagent::conversation::Message;
//! use std::sync::Arc;
//!
//! async fn example() {
//!     let provider = RetryProvider::new(Arc::new(AnthropicProvider::new("your-api-key")));
//!     let messages = vec![Message::user("Hello!")];
//!     let options = ChatOptions::new().with_max_tokens(1000);
//!
//!     let response = provider.chat(messages, vec![], None, options).await.unwrap();
//!     println!("Response: {}", response.content);
//! }
//! ```

pub mod anthropic;
pub mod openai;
pub mod retry;
mod types;

use std::sync::Arc;

use crate::config::Config;
use crate::error::{AgentError, ProviderError, Result};

pub use anthropic::AnthropicProvider;
pub use openai::OpenAIProvider;
pub use retry::RetryProvider;
pub use types::{ChatOptions, LLMProvider, LLMResponse, ToolChoice, ToolDefinition};

/// Provider IDs currently supported by [`from_config`].
pub const SUPPORTED_PROVIDERS: &[&str] = &["anthropic", "openai"];

/// Longest error-body excerpt carried inside a classified provider error.
const MAX_ERROR_BODY_LEN: usize = 600;

/// Classify an HTTP status code and response body into a [`ProviderError`].
///
/// This centralizes the mapping so that every adapter produces consistent
/// typed errors for the retry wrapper to classify. Long bodies are truncated
/// to keep error strings readable.
pub fn parse_provider_error(status: u16, body: &str) -> ProviderError {
    let message = if body.len() > MAX_ERROR_BODY_LEN {
        let mut end = MAX_ERROR_BODY_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    };
    ProviderError::Status {
        code: status,
        message,
    }
}

/// Resolve a provider by name from configuration, wrapped in the retry
/// decorator.
///
/// # Arguments
/// * `name` - Provider id ("anthropic" or "openai")
/// * `config` - Loaded configuration carrying API keys and model overrides
///
/// # Errors
/// Returns a `Config` error for unknown provider names or missing API keys.
pub fn from_config(name: &str, config: &Config) -> Result<Arc<dyn LLMProvider>> {
    let inner: Arc<dyn LLMProvider> = match name {
        "anthropic" => {
            let settings = &config.providers.anthropic;
            let api_key = settings.api_key.as_deref().ok_or_else(|| {
                AgentError::Config("anthropic provider selected but no API key configured".into())
            })?;
            match &settings.model {
                Some(model) => Arc::new(AnthropicProvider::new(api_key).with_default_model(model)),
                None => Arc::new(AnthropicProvider::new(api_key)),
            }
        }
        "openai" => {
            let settings = &config.providers.openai;
            let api_key = settings.api_key.as_deref().ok_or_else(|| {
                AgentError::Config("openai provider selected but no API key configured".into())
            })?;
            let mut provider = OpenAIProvider::new(api_key);
            if let Some(model) = &settings.model {
                provider = provider.with_default_model(model);
            }
            if let Some(base_url) = &settings.base_url {
                provider = provider.with_base_url(base_url);
            }
            Arc::new(provider)
        }
        other => {
            return Err(AgentError::Config(format!(
                "Unknown provider: '{}'. Supported: {}",
                other,
                SUPPORTED_PROVIDERS.join(", ")
            )));
        }
    };

    Ok(Arc::new(RetryProvider::new(inner)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_parse_provider_error_codes() {
        for code in [429u16, 500, 502, 503, 504] {
            let err = parse_provider_error(code, "transient");
            assert_eq!(err.status_code(), Some(code));
            assert!(err.is_retryable());
        }
        for code in [400u16, 401, 402, 403, 404, 418] {
            let err = parse_provider_error(code, "permanent");
            assert_eq!(err.status_code(), Some(code));
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn test_parse_provider_error_truncates_long_bodies() {
        let body = "x".repeat(5000);
        let err = parse_provider_error(500, &body);
        let rendered = err.to_string();
        assert!(rendered.len() < 1000);
        assert!(rendered.contains("..."));
    }

    #[test]
    fn test_from_config_unknown_provider() {
        let config = Config::default();
        let err = from_config("cohere", &config).err().unwrap();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn test_from_config_missing_api_key() {
        let config = Config::default();
        let err = from_config("anthropic", &config).err().unwrap();
        assert!(err.to_string().contains("no API key"));
    }

    #[test]
    fn test_from_config_resolves_anthropic() {
        let mut config = Config::default();
        config.providers.anthropic.api_key = Some("sk-test".into());
        let provider = from_config("anthropic", &config).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn test_from_config_openai_model_override() {
        let mut config = Config::default();
        config.providers.openai.api_key = Some("sk-test".into());
        config.providers.openai.model = Some("gpt-4o-mini".into());
        let provider = from_config("openai", &config).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.default_model(), "gpt-4o-mini");
    }
}
