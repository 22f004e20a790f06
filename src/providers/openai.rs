//! OpenAI LLM provider implementation
//!
//! This module implements the `LLMProvider` trait for the OpenAI Chat
//! Completions API. A configurable base URL makes it usable against any
//! OpenAI-compatible endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::conversation::{Message, ToolCall, Usage};
use crate::error::{ProviderError, Result};

use super::{
    parse_provider_error, ChatOptions, LLMProvider, LLMResponse, ToolChoice, ToolDefinition,
};

/// Default API base URL.
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// The default model to use.
const DEFAULT_MODEL: &str = "gpt-4o";

/// OpenAI (and OpenAI-compatible) LLM provider.
pub struct OpenAIProvider {
    /// API key for authentication
    api_key: String,
    /// HTTP client for making requests
    client: Client,
    /// API base URL (override for compatible endpoints)
    base_url: String,
    /// Model used when the request carries no override
    default_model: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with the given API key.
    ///
    /// # Example
    /// ```
    /// use femtoagent::providers::{LLMProvider, OpenAIProvider};
    ///
    /// let provider = OpenAIProvider::new("sk-xxx");
    /// assert_eq!(provider.name(), "openai");
    /// ```
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: OPENAI_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create a provider with a custom HTTP client (testing, proxies).
    pub fn with_client(api_key: &str, client: Client) -> Self {
        Self {
            api_key: api_key.to_string(),
            client,
            base_url: OPENAI_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Override the API base URL (for OpenAI-compatible endpoints).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Override the default model.
    pub fn with_default_model(mut self, model: &str) -> Self {
        self.default_model = model.to_string();
        self
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn chat(
        &self,
        messages: Vec<Message>,
        tools: Vec<ToolDefinition>,
        model: Option<&str>,
        options: ChatOptions,
    ) -> Result<LLMResponse> {
        let model = model.unwrap_or(&self.default_model);

        let has_tools = !tools.is_empty();
        let request = OpenAIRequest {
            model: model.to_string(),
            messages: convert_messages(messages, options.system.as_deref()),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
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
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::Connection(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(parse_provider_error(status, &error_text).into());
        }

        let api_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        convert_response(api_response)
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// ============================================================================
// OpenAI API Request Types
// ============================================================================

/// Chat Completions request body.
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<serde_json::Value>,
}

/// A message in OpenAI's format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl OpenAIMessage {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }
}

/// A tool call in OpenAI's format (arguments are a JSON-encoded string).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    r#type: String,
    function: OpenAIFunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    arguments: String,
}

// ============================================================================
// OpenAI API Response Types
// ============================================================================

/// Chat Completions response body.
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert canonical messages to OpenAI wire format.
///
/// The system prompt becomes the leading system message. A role-flipped
/// outcome message expands into one `tool` message per outcome, preserving
/// request order.
fn convert_messages(messages: Vec<Message>, system: Option<&str>) -> Vec<OpenAIMessage> {
    let mut converted = Vec::with_capacity(messages.len() + 1);

    if let Some(system) = system {
        converted.push(OpenAIMessage::text("system", system));
    }

    for msg in messages {
        if msg.has_tool_results() {
            for outcome in msg.tool_results {
                converted.push(OpenAIMessage {
                    role: "tool".to_string(),
                    content: Some(outcome.content),
                    tool_calls: None,
                    tool_call_id: Some(outcome.id),
                });
            }
        } else if msg.has_tool_calls() {
            let tool_calls = msg
                .tool_calls
                .into_iter()
                .map(|tc| OpenAIToolCall {
                    id: tc.id,
                    r#type: "function".to_string(),
                    function: OpenAIFunctionCall {
                        name: tc.name,
                        arguments: tc.arguments.to_string(),
                    },
                })
                .collect();
            converted.push(OpenAIMessage {
                role: "assistant".to_string(),
                content: if msg.content.is_empty() {
                    None
                } else {
                    Some(msg.content)
                },
                tool_calls: Some(tool_calls),
                tool_call_id: None,
            });
        } else {
            converted.push(OpenAIMessage::text(&msg.role.to_string(), &msg.content));
        }
    }

    converted
}

/// Convert canonical tool definitions to OpenAI function format.
fn convert_tools(tools: Vec<ToolDefinition>) -> Vec<serde_json::Value> {
    tools
        .into_iter()
        .map(|t| {
            serde_json::json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.parameters,
                }
            })
        })
        .collect()
}

/// Convert the tool-choice directive to OpenAI format.
fn convert_tool_choice(choice: &ToolChoice) -> serde_json::Value {
    match choice {
        ToolChoice::Auto => serde_json::Value::String("auto".to_string()),
        ToolChoice::Tool(name) => {
            serde_json::json!({"type": "function", "function": {"name": name}})
        }
    }
}

/// Convert an OpenAI response to the canonical LLMResponse.
fn convert_response(response: OpenAIResponse) -> Result<LLMResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::MalformedResponse("response carried no choices".into()))?;

    let content = choice.message.content.unwrap_or_default();
    let mut tool_calls: Vec<ToolCall> = Vec::new();

    if let Some(calls) = choice.message.tool_calls {
        for tc in calls {
            // Invalid argument JSON from the model degrades to an empty
            // object; the tool reports the missing fields in its outcome.
            let arguments: serde_json::Value = serde_json::from_str(&tc.function.arguments)
                .unwrap_or_else(|_| serde_json::json!({}));
            tool_calls.push(ToolCall::new(&tc.id, &tc.function.name, arguments));
        }
    }

    let usage = response
        .usage
        .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens));

    Ok(LLMResponse {
        content,
        tool_calls,
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::ToolOutcome;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new("test-key");
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.default_model(), DEFAULT_MODEL);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let provider = OpenAIProvider::new("k").with_base_url("https://llm.local/v1/");
        assert_eq!(provider.base_url, "https://llm.local/v1");
    }

    #[test]
    fn test_system_message_prepended() {
        let messages = vec![Message::user("Hello")];
        let converted = convert_messages(messages, Some("You are helpful."));

        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[0].content.as_deref(), Some("You are helpful."));
        assert_eq!(converted[1].role, "user");
    }

    #[test]
    fn test_tool_results_expand_to_tool_messages() {
        let messages = vec![Message::tool_results(vec![
            ToolOutcome::ok("call_1", "tool_a", "Result A"),
            ToolOutcome::ok("call_2", "tool_b", "Result B"),
        ])];

        let converted = convert_messages(messages, None);
        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].role, "tool");
        assert_eq!(converted[0].tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(converted[1].tool_call_id.as_deref(), Some("call_2"));
    }

    #[test]
    fn test_assistant_tool_calls_encode_arguments_as_string() {
        let call = ToolCall::new("call_1", "search", json!({"q": "rust"}));
        let messages = vec![Message::assistant_with_tools("", vec![call])];

        let converted = convert_messages(messages, None);
        assert_eq!(converted.len(), 1);
        assert!(converted[0].content.is_none());
        let calls = converted[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].function.arguments, r#"{"q":"rust"}"#);
    }

    #[test]
    fn test_convert_tool_choice() {
        assert_eq!(convert_tool_choice(&ToolChoice::Auto), json!("auto"));
        assert_eq!(
            convert_tool_choice(&ToolChoice::forced("Summary")),
            json!({"type": "function", "function": {"name": "Summary"}})
        );
    }

    #[test]
    fn test_convert_response_parses_arguments() {
        let response = OpenAIResponse {
            choices: vec![OpenAIChoice {
                message: OpenAIMessage {
                    role: "assistant".to_string(),
                    content: None,
                    tool_calls: Some(vec![OpenAIToolCall {
                        id: "call_1".to_string(),
                        r#type: "function".to_string(),
                        function: OpenAIFunctionCall {
                            name: "search".to_string(),
                            arguments: r#"{"q": "rust"}"#.to_string(),
                        },
                    }]),
                    tool_call_id: None,
                },
            }],
            usage: Some(OpenAIUsage {
                prompt_tokens: 10,
                completion_tokens: 5,
            }),
        };

        let llm_response = convert_response(response).unwrap();
        assert_eq!(llm_response.tool_calls[0].arguments, json!({"q": "rust"}));
        assert_eq!(llm_response.usage, Some(Usage::new(10, 5)));
    }

    #[test]
    fn test_convert_response_invalid_arguments_degrade_to_empty_object() {
        let response = OpenAIResponse {
            choices: vec![OpenAIChoice {
                message: OpenAIMessage {
                    role: "assistant".to_string(),
                    content: None,
                    tool_calls: Some(vec![OpenAIToolCall {
                        id: "call_1".to_string(),
                        r#type: "function".to_string(),
                        function: OpenAIFunctionCall {
                            name: "search".to_string(),
                            arguments: "{not json".to_string(),
                        },
                    }]),
                    tool_call_id: None,
                },
            }],
            usage: None,
        };

        let llm_response = convert_response(response).unwrap();
        assert_eq!(llm_response.tool_calls[0].arguments, json!({}));
    }

    #[test]
    fn test_convert_response_no_choices_is_malformed() {
        let response = OpenAIResponse {
            choices: vec![],
            usage: None,
        };
        let err = convert_response(response).unwrap_err();
        assert!(err.to_string().contains("Malformed response"));
    }
}
