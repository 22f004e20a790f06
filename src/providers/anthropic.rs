//! Anthropic LLM provider implementation
//!
//! This module implements the `LLMProvider` trait for the Anthropic Messages
//! API, handling message conversion, tool calls, forced tool choice, and
//! response parsing.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::conversation::{Message, ToolCall, Usage};
use crate::error::{ProviderError, Result};

use super::{
    parse_provider_error, ChatOptions, LLMProvider, LLMResponse, ToolChoice, ToolDefinition,
};

/// The Anthropic Messages API endpoint URL.
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// The default model to use.
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// The Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Fallback max_tokens when the caller did not set one.
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic LLM provider.
///
/// Translates the canonical conversation into Messages API content blocks
/// (text / tool_use / tool_result) and back.
pub struct AnthropicProvider {
    /// API key for authentication
    api_key: String,
    /// HTTP client for making requests
    client: Client,
    /// Model used when the request carries no override
    default_model: String,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider with the given API key.
    ///
    /// # Example
    /// ```
    /// use femtoagent::providers::{AnthropicProvider, LLMProvider};
    ///
    /// let provider = AnthropicProvider::new("sk-ant-api03-xxx");
    /// assert_eq!(provider.name(), "anthropic");
    /// ```
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| Client::new()),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create a provider with a custom HTTP client (testing, proxies).
    pub fn with_client(api_key: &str, client: Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            client,
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Override the default model.
    pub fn with_default_model(mut self, model: &str) -> Self {
        self.default_model = model.to_string();
        self
    }
}

#[async_trait]
impl LLMProvider for AnthropicProvider {
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<LLMResponse> {
        let model = model.unwrap_or(&self.default_model);

        let has_tools = !tools.is_empty();
        let request = AnthropicRequest {
            model: model.to_string(),
            max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            messages: convert_messages(messages),
            system: options.system,
            tools: if !has_tools {
                None
            } else {
                Some(convert_tools(tools))
            },
            tool_choice: if !has_tools {
                None
            } else {
                Some(convert_tool_choice(&options.tool_choice))
            },
            temperature: options.temperature,
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();

            // Surface the structured API error when the body parses.
            let body = if let Ok(error_response) =
                serde_json::from_str::<AnthropicErrorResponse>(&error_text)
            {
                format!(
                    "{} - {}",
                    error_response.error.r#type, error_response.error.message
                )
            } else {
                error_text
            };

            return Err(parse_provider_error(status, &body).into());
        }

        let api_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        Ok(convert_response(api_response))
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

// ============================================================================
// Anthropic API Request Types
// ============================================================================

/// Messages API request body.
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<AnthropicMessage>,
    /// System prompt (separate from messages in this API)
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// A message in Anthropic's format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct AnthropicMessage {
    /// Role: "user" or "assistant"
    role: String,
    /// Message content (string or array of blocks)
    content: AnthropicContent,
}

/// Message content - simple text or content blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<AnthropicContentBlock>),
}

/// A content block within a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    /// Assistant requesting a tool invocation
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Caller providing the result of a tool invocation
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_error: Option<bool>,
    },
}

/// Anthropic tool definition.
#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

// ============================================================================
// Anthropic API Response Types
// ============================================================================

/// Messages API response body.
#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContentBlock>,
    usage: AnthropicUsage,
    #[allow(dead_code)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorResponse {
    error: AnthropicApiError,
}

#[derive(Debug, Deserialize)]
struct AnthropicApiError {
    r#type: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert canonical messages to Anthropic wire format.
///
/// Tool outcomes already travel grouped in a single role-flipped message, so
/// each becomes one user message holding tool_result blocks.
fn convert_messages(messages: Vec<Message>) -> Vec<AnthropicMessage> {
    let mut converted = Vec::with_capacity(messages.len());

    for msg in messages {
        if msg.has_tool_results() {
            let blocks = msg
                .tool_results
                .into_iter()
                .map(|outcome| AnthropicContentBlock::ToolResult {
                    tool_use_id: outcome.id,
                    content: outcome.content,
                    is_error: if outcome.is_error { Some(true) } else { None },
                })
                .collect();
            converted.push(AnthropicMessage {
                role: "user".to_string(),
                content: AnthropicContent::Blocks(blocks),
            });
        } else if msg.has_tool_calls() {
            let mut blocks: Vec<AnthropicContentBlock> = Vec::new();
            if !msg.content.is_empty() {
                blocks.push(AnthropicContentBlock::Text { text: msg.content });
            }
            for tc in msg.tool_calls {
                blocks.push(AnthropicContentBlock::ToolUse {
                    id: tc.id,
                    name: tc.name,
                    input: tc.arguments,
                });
            }
            converted.push(AnthropicMessage {
                role: "assistant".to_string(),
                content: AnthropicContent::Blocks(blocks),
            });
        } else {
            converted.push(AnthropicMessage {
                role: msg.role.to_string(),
                content: AnthropicContent::Text(msg.content),
            });
        }
    }

    converted
}

/// Convert canonical tool definitions to Anthropic format.
fn convert_tools(tools: Vec<ToolDefinition>) -> Vec<AnthropicTool> {
    tools
        .into_iter()
        .map(|t| AnthropicTool {
            name: t.name,
            description: t.description,
            input_schema: t.parameters,
        })
        .collect()
}

/// Convert the tool-choice directive to Anthropic format.
fn convert_tool_choice(choice: &ToolChoice) -> serde_json::Value {
    match choice {
        ToolChoice::Auto => serde_json::json!({"type": "auto"}),
        ToolChoice::Tool(name) => serde_json::json!({"type": "tool", "name": name}),
    }
}

/// Convert an Anthropic response to the canonical LLMResponse.
fn convert_response(response: AnthropicResponse) -> LLMResponse {
    let mut content = String::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();

    for block in response.content {
        match block {
            AnthropicContentBlock::Text { text } => {
                if !content.is_empty() {
                    content.push('\n');
                }
                content.push_str(&text);
            }
            AnthropicContentBlock::ToolUse { id, name, input } => {
                tool_calls.push(ToolCall::new(&id, &name, input));
            }
            AnthropicContentBlock::ToolResult { .. } => {
                // Tool results do not appear in responses; ignore gracefully.
            }
        }
    }

    let usage = Usage::new(response.usage.input_tokens, response.usage.output_tokens);

    LLMResponse {
        content,
        tool_calls,
        usage: Some(usage),
    }
}
