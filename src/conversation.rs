//! Canonical conversation types for FemtoAgent
//!
//! This module defines the message, tool-call, and usage types shared by the
//! run loop and every provider adapter. The conversation is strictly
//! canonical: adapters translate to and from their wire formats at the
//! provider boundary and never leak native response types past it.
//!
//! A conversation is an ordered, append-only `Vec<Message>` owned by a single
//! `run` invocation. It starts with the user message and is discarded when
//! the run returns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The role of a message author in a conversation.
///
/// The system prompt is not a conversation message; it travels separately in
/// [`ChatOptions`](crate::providers::ChatOptions) and each adapter places it
/// wherever its wire format expects it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Messages from the caller, including role-flipped tool-result messages
    User,
    /// Messages from the model
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A model-issued request to invoke a named tool.
///
/// The `id` is unique within a round and is echoed back in the matching
/// [`ToolOutcome`] so multi-call rounds can be correlated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Opaque identifier assigned by the provider
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// JSON arguments for the tool
    pub arguments: Value,
}

impl ToolCall {
    /// Create a new tool call.
    ///
    /// # Example
    /// ```
    /// use femtoagent::conversation::ToolCall;
    /// use serde_json::json;
    ///
    /// let call = ToolCall::new("call_1", "web_search", json!({"query": "rust"}));
    /// assert_eq!(call.name, "web_search");
    /// ```
    pub fn new(id: &str, name: &str, arguments: Value) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            arguments,
        }
    }

    /// Deserialize the arguments into a concrete type.
    pub fn parse_arguments<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.arguments.clone())
    }
}

/// The result of executing one tool call.
///
/// Exactly one outcome exists per request. Failures (unknown tool, execution
/// error, timeout) are folded into the same textual shape with `is_error`
/// set, so the model sees them as ordinary tool results in the next round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolOutcome {
    /// The id of the tool call this outcome answers
    pub id: String,
    /// Name of the tool that was requested
    pub name: String,
    /// Result text, or the rendered error text when `is_error` is set
    pub content: String,
    /// Whether this outcome represents a failure
    pub is_error: bool,
}

impl ToolOutcome {
    /// Successful outcome carrying the tool's result text.
    pub fn ok(id: &str, name: &str, content: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            content: content.into(),
            is_error: false,
        }
    }

    /// Failed outcome carrying rendered error text.
    pub fn error(id: &str, name: &str, content: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            content: content.into(),
            is_error: true,
        }
    }
}

/// A single message in a conversation.
///
/// Three shapes occur, enforced by the constructors:
/// plain text (either role), an assistant message carrying tool calls, and a
/// role-flipped user message carrying every outcome of one round in the
/// original request order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// The role of the message author
    pub role: Role,
    /// Text content (may be empty on tool-bearing messages)
    pub content: String,
    /// Tool calls issued by the assistant, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Tool outcomes answering the previous assistant message, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_results: Vec<ToolOutcome>,
}

impl Message {
    /// Create a new user message.
    ///
    /// # Example
    /// ```
    /// use femtoagent::conversation::{Message, Role};
    ///
    /// let msg = Message::user("Hello!");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            tool_calls: Vec::new(),
            tool_results: Vec::new(),
        }
    }

    /// Create an assistant message carrying tool calls.
    ///
    /// # Example
    /// ```
    /// use femtoagent::conversation::{Message, ToolCall};
    /// use serde_json::json;
    ///
    /// let call = ToolCall::new("call_1", "search", json!({"q": "rust"}));
    /// let msg = Message::assistant_with_tools("Searching.", vec![call]);
    /// assert!(msg.has_tool_calls());
    /// ```
    pub fn assistant_with_tools(content: &str, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            tool_calls,
            tool_results: Vec::new(),
        }
    }

    /// Create the role-flipped message carrying all outcomes of one round,
    /// in the order the tool calls were requested.
    pub fn tool_results(outcomes: Vec<ToolOutcome>) -> Self {
        Self {
            role: Role::User,
            content: String::new(),
            tool_calls: Vec::new(),
            tool_results: outcomes,
        }
    }

    /// Check if this message carries tool calls.
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Check if this message carries tool outcomes.
    pub fn has_tool_results(&self) -> bool {
        !self.tool_results.is_empty()
    }

    /// Check if this is a plain text message with no tool structure.
    pub fn is_text(&self) -> bool {
        self.tool_calls.is_empty() && self.tool_results.is_empty()
    }
}

/// Token usage from provider calls.
///
/// Accumulates additively across every provider call made during one run,
/// including the optional memory-update call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    /// Tokens consumed by the request
    pub input_tokens: u32,
    /// Tokens generated in the response
    pub output_tokens: u32,
}

impl Usage {
    /// Create new usage information.
    ///
    /// # Example
    /// ```
    /// use femtoagent::conversation::Usage;
    ///
    /// let usage = Usage::new(100, 50);
    /// assert_eq!(usage.total(), 150);
    /// ```
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Add another usage sample into this total.
    pub fn add(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
    }

    /// Total tokens (input + output).
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_user() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
        assert!(msg.is_text());
    }

    #[test]
    fn test_message_assistant_with_tools() {
        let call = ToolCall::new("call_1", "search", json!({"q": "test"}));
        let msg = Message::assistant_with_tools("Searching.", vec![call]);

        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.has_tool_calls());
        assert!(!msg.has_tool_results());
        assert_eq!(msg.tool_calls[0].name, "search");
    }

    #[test]
    fn test_message_tool_results_role_flip() {
        let outcomes = vec![
            ToolOutcome::ok("call_1", "search", "Found it"),
            ToolOutcome::error("call_2", "broken", "Error executing tool 'broken': boom"),
        ];
        let msg = Message::tool_results(outcomes);

        assert_eq!(msg.role, Role::User);
        assert!(msg.has_tool_results());
        assert_eq!(msg.tool_results.len(), 2);
        assert!(!msg.tool_results[0].is_error);
        assert!(msg.tool_results[1].is_error);
    }

    #[test]
    fn test_tool_call_parse_arguments() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct SearchArgs {
            query: String,
        }

        let call = ToolCall::new("call_1", "search", json!({"query": "rust"}));
        let args: SearchArgs = call.parse_arguments().unwrap();
        assert_eq!(args.query, "rust");
    }

    #[test]
    fn test_usage_accumulation() {
        let mut total = Usage::default();
        total.add(&Usage::new(10, 5));
        total.add(&Usage::new(20, 15));
        assert_eq!(total, Usage::new(30, 20));
        assert_eq!(total.total(), 50);
    }

    #[test]
    fn test_role_serialize() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, r#""assistant""#);
        let parsed: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Role::Assistant);
    }

    #[test]
    fn test_message_serialization_skips_empty() {
        let msg = Message::user("Hello");
        let json = serde_json::to_string(&msg).unwrap();

        assert!(!json.contains("tool_calls"));
        assert!(!json.contains("tool_results"));
    }

    #[test]
    fn test_message_roundtrip() {
        let call = ToolCall::new("call_9", "echo", json!({"message": "hi"}));
        let msg = Message::assistant_with_tools("", vec![call]);
        let json = serde_json::to_string(&msg).unwrap();
        let parsed: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, msg);
    }
}
