//! Provider types for FemtoAgent
//!
//! This module defines the core types and traits for LLM providers,
//! including the `LLMProvider` trait, chat options, tool choice, and
//! response types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::conversation::{Message, ToolCall, Usage};
use crate::error::Result;

/// Definition of a tool that can be called by the LLM.
///
/// Tool definitions describe the available tools, their parameters,
/// and how the LLM should invoke them. The structured-output contract is
/// surfaced to the model as one of these, too.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The name of the tool (must be unique)
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new tool definition.
    ///
    /// # Example
    /// ```
    /// use femtoagent::providers::ToolDefinition;
    /// use serde_json::json;
    ///
    /// let tool = ToolDefinition::new(
    ///     "web_search",
    ///     "Search the web for information",
    ///     json!({
    ///         "type": "object",
    ///         "properties": {
    ///             "query": { "type": "string", "description": "Search query" }
    ///         },
    ///         "required": ["query"]
    ///     }),
    /// );
    /// assert_eq!(tool.name, "web_search");
    /// ```
    pub fn new(name: &str, description: &str, parameters: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            parameters,
        }
    }
}

/// Directive controlling which tool the model must invoke on its next turn.
///
/// Carried explicitly on the run loop and transitioned after the first round
/// that emits tool calls, so a configured output schema is forced exactly
/// once rather than indefinitely.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ToolChoice {
    /// The model picks freely among the offered tools (or none)
    #[default]
    Auto,
    /// The model must invoke the named tool
    Tool(String),
}

impl ToolChoice {
    /// Forced choice of the named tool.
    pub fn forced(name: &str) -> Self {
        ToolChoice::Tool(name.to_string())
    }

    /// Whether a specific tool is being forced.
    pub fn is_forced(&self) -> bool {
        matches!(self, ToolChoice::Tool(_))
    }
}

/// Trait for LLM providers (Anthropic, OpenAI, etc.).
///
/// Implement this trait to add support for a new LLM provider. The provider
/// is responsible for translating between the canonical message format and
/// its wire format, in both directions; native response types never cross
/// this boundary.
///
/// Failures must be classified into
/// [`ProviderError`](crate::error::ProviderError) variants so the retry
/// wrapper can tell transient from permanent without inspecting provider
/// internals.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Send a chat completion request to the LLM.
    ///
    /// # Arguments
    /// * `messages` - The canonical conversation
    /// * `tools` - Available tools the LLM can call (empty = no tools offered)
    /// * `model` - Optional model override (uses default if None)
    /// * `options` - Sampling parameters, system prompt, and tool choice
    ///
    /// # Returns
    /// The LLM's response, which may include text content and/or tool calls.
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<LLMResponse>;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;

    /// Get the provider name (e.g., "anthropic", "openai").
    fn name(&self) -> &str;
}

/// Options for chat completion requests.
///
/// Use the builder pattern to construct options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatOptions {
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Temperature for sampling (0.0 = deterministic, 1.0 = creative)
    pub temperature: Option<f32>,
    /// System prompt, kept out of the conversation itself
    pub system: Option<String>,
    /// Which tool the model must call, if any
    pub tool_choice: ToolChoice,
}

impl ChatOptions {
    /// Create new default chat options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of tokens to generate.
    ///
    /// # Example
    /// ```
    /// use femtoagent::providers::ChatOptions;
    ///
    /// let options = ChatOptions::new().with_max_tokens(1000);
    /// assert_eq!(options.max_tokens, Some(1000));
    /// ```
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the temperature for sampling.
    ///
    /// Lower values (e.g., 0.2) make output more focused and deterministic.
    /// Higher values (e.g., 0.8) make output more creative and diverse.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the system prompt for the request.
    pub fn with_system(mut self, system: &str) -> Self {
        self.system = Some(system.to_string());
        self
    }

    /// Set the tool-choice directive.
    ///
    /// # Example
    /// ```
    /// use femtoagent::providers::{ChatOptions, ToolChoice};
    ///
    /// let options = ChatOptions::new().with_tool_choice(ToolChoice::forced("Summary"));
    /// assert!(options.tool_choice.is_forced());
    /// ```
    pub fn with_tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = tool_choice;
        self
    }
}

/// Response from an LLM chat completion request.
///
/// Strictly canonical: text content (empty string when the provider returned
/// none), zero or more tool calls, and token usage when the provider
/// reported it.
#[derive(Debug, Clone, PartialEq)]
pub struct LLMResponse {
    /// Text content of the response
    pub content: String,
    /// Tool calls made by the LLM (if any)
    pub tool_calls: Vec<ToolCall>,
    /// Token usage information (if available)
    pub usage: Option<Usage>,
}

impl LLMResponse {
    /// Create a simple text response with no tool calls.
    ///
    /// # Example
    /// ```
    /// use femtoagent::providers::LLMResponse;
    ///
    /// let response = LLMResponse::text("Hello, world!");
    /// assert_eq!(response.content, "Hello, world!");
    /// assert!(!response.has_tool_calls());
    /// ```
    pub fn text(content: &str) -> Self {
        Self {
            content: content.to_string(),
            tool_calls: vec![],
            usage: None,
        }
    }

    /// Create a response with tool calls.
    pub fn with_tools(content: &str, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: content.to_string(),
            tool_calls,
            usage: None,
        }
    }

    /// Check if this response contains any tool calls.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Set usage information for this response.
    pub fn with_usage(mut self, usage: Usage) -> Self {
        self.usage = Some(usage);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_llm_response_text() {
        let response = LLMResponse::text("Hello, world!");
        assert_eq!(response.content, "Hello, world!");
        assert!(!response.has_tool_calls());
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_llm_response_with_tools() {
        let call = ToolCall::new("call_1", "search", json!({"query": "rust"}));
        let response = LLMResponse::with_tools("Searching.", vec![call]);

        assert_eq!(response.content, "Searching.");
        assert!(response.has_tool_calls());
        assert_eq!(response.tool_calls[0].name, "search");
    }

    #[test]
    fn test_llm_response_with_usage() {
        let response = LLMResponse::text("Hello").with_usage(Usage::new(100, 50));
        assert_eq!(response.usage, Some(Usage::new(100, 50)));
    }

    #[test]
    fn test_chat_options_builder() {
        let options = ChatOptions::new()
            .with_max_tokens(1000)
            .with_temperature(0.7)
            .with_system("You are helpful.")
            .with_tool_choice(ToolChoice::forced("Summary"));

        assert_eq!(options.max_tokens, Some(1000));
        assert_eq!(options.temperature, Some(0.7));
        assert_eq!(options.system.as_deref(), Some("You are helpful."));
        assert_eq!(options.tool_choice, ToolChoice::Tool("Summary".into()));
    }

    #[test]
    fn test_chat_options_default() {
        let options = ChatOptions::default();
        assert!(options.max_tokens.is_none());
        assert!(options.temperature.is_none());
        assert!(options.system.is_none());
        assert_eq!(options.tool_choice, ToolChoice::Auto);
    }

    #[test]
    fn test_tool_choice() {
        assert!(!ToolChoice::Auto.is_forced());
        assert!(ToolChoice::forced("Record").is_forced());
        assert_eq!(ToolChoice::default(), ToolChoice::Auto);
    }

    #[test]
    fn test_tool_definition_serialization() {
        let tool = ToolDefinition::new(
            "search",
            "Search the web",
            json!({"type": "object"}),
        );

        let encoded = serde_json::to_string(&tool).unwrap();
        let parsed: ToolDefinition = serde_json::from_str(&encoded).unwrap();

        assert_eq!(parsed.name, "search");
        assert_eq!(parsed.description, "Search the web");
    }
}
