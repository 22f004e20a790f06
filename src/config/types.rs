//! Configuration type definitions for FemtoAgent
//!
//! All types implement serde traits for JSON serialization and have sensible
//! defaults, so a missing or partial config file always yields a usable
//! configuration.

use serde::{Deserialize, Serialize};

/// Main configuration struct for FemtoAgent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Agent run defaults (max tokens, temperature, iterations)
    pub agents: AgentConfig,
    /// LLM provider credentials and model overrides
    pub providers: ProvidersConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

// ============================================================================
// Agent Defaults
// ============================================================================

/// Default run parameters applied when the builder does not override them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum tokens per provider response.
    pub max_tokens: u32,
    /// Sampling temperature; `None` uses the provider default.
    pub temperature: Option<f32>,
    /// Maximum provider rounds per run.
    pub max_iterations: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: None,
            max_iterations: 10,
        }
    }
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Per-provider credentials and overrides.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    /// Anthropic settings
    pub anthropic: ProviderSettings,
    /// OpenAI (or OpenAI-compatible) settings
    pub openai: ProviderSettings,
}

/// Settings for a single provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// API key. Usually supplied via environment rather than the file.
    pub api_key: Option<String>,
    /// Default model override.
    pub model: Option<String>,
    /// Base URL override (OpenAI-compatible endpoints only).
    pub base_url: Option<String>,
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Compact human-readable text
    Compact,
    /// Structured JSON lines
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// Default filter level when `RUST_LOG` is unset.
    pub level: String,
    /// Optional log file path (json format only).
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            level: "info".to_string(),
            file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.agents.max_tokens, 4096);
        assert_eq!(config.agents.max_iterations, 10);
        assert!(config.agents.temperature.is_none());
        assert!(config.providers.anthropic.api_key.is_none());
    }

    #[test]
    fn test_config_partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"agents": {"max_tokens": 2048}}"#).unwrap();
        assert_eq!(config.agents.max_tokens, 2048);
        assert_eq!(config.agents.max_iterations, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_roundtrip() {
        let mut config = Config::default();
        config.providers.openai.model = Some("gpt-4o-mini".into());
        config.agents.temperature = Some(0.2);

        let json = serde_json::to_string(&config).unwrap();
        let restored: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.providers.openai.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(restored.agents.temperature, Some(0.2));
    }
}
