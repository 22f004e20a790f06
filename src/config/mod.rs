//! Configuration management for FemtoAgent
//!
//! Configuration is loaded from an optional JSON file with environment
//! variable overrides. API keys are normally supplied through the
//! environment (`.env` files are honored via `dotenvy`).

mod types;

pub use types::*;

use std::path::Path;

use crate::error::Result;

impl Config {
    /// Load configuration from a specific path with environment overrides.
    ///
    /// A missing file yields the default configuration; environment
    /// variables are applied on top either way.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        // Pick up a .env file before reading the environment.
        dotenvy::dotenv().ok();

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            serde_json::from_str(&content)?
        } else {
            Config::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Build configuration from environment variables alone.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Crate-specific knobs use the `FEMTOAGENT_` prefix; provider API keys
    /// use their conventional variable names.
    fn apply_env_overrides(&mut self) {
        // Agent defaults
        if let Ok(val) = std::env::var("FEMTOAGENT_AGENTS_MAX_TOKENS") {
            if let Ok(v) = val.parse() {
                self.agents.max_tokens = v;
            }
        }
        if let Ok(val) = std::env::var("FEMTOAGENT_AGENTS_TEMPERATURE") {
            if let Ok(v) = val.parse() {
                self.agents.temperature = Some(v);
            }
        }
        if let Ok(val) = std::env::var("FEMTOAGENT_AGENTS_MAX_ITERATIONS") {
            if let Ok(v) = val.parse() {
                self.agents.max_iterations = v;
            }
        }

        // Provider credentials
        if let Ok(val) = std::env::var("ANTHROPIC_API_KEY") {
            self.providers.anthropic.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("OPENAI_API_KEY") {
            self.providers.openai.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("OPENAI_BASE_URL") {
            self.providers.openai.base_url = Some(val);
        }
        if let Ok(val) = std::env::var("FEMTOAGENT_ANTHROPIC_MODEL") {
            self.providers.anthropic.model = Some(val);
        }
        if let Ok(val) = std::env::var("FEMTOAGENT_OPENAI_MODEL") {
            self.providers.openai.model = Some(val);
        }

        // Logging
        if let Ok(val) = std::env::var("FEMTOAGENT_LOG_LEVEL") {
            self.logging.level = val;
        }
    }
}
