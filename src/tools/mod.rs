//! Tools module for FemtoAgent
//!
//! This module defines the `Tool` trait that all tools must implement, and
//! the immutable `ToolRegistry` that holds them. Tools are executable
//! functions the LLM can call; the run loop dispatches the calls of one
//! round concurrently and feeds the outcomes back to the model.

mod registry;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub use registry::ToolRegistry;

/// Trait that all tools must implement.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use serde_json::Value;
/// use femtoagent::tools::Tool;
/// use femtoagent::error::Result;
///
/// struct MyTool;
///
/// #[async_trait]
/// impl Tool for MyTool {
///     fn name(&self) -> &str { "my_tool" }
///     fn description(&self) -> &str { "Does something useful" }
///     fn parameters(&self) -> Value {
///         serde_json::json!({
///             "type": "object",
///             "properties": {},
///             "required": []
///         })
///     }
///     async fn execute(&self, _args: Value) -> Result<String> {
///         Ok("Done!".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name.
    ///
    /// This name is used to identify the tool when the LLM requests it.
    /// It must be unique within a registry.
    fn name(&self) -> &str;

    /// Get the tool description.
    ///
    /// Sent to the LLM to help it understand when and how to use the tool.
    fn description(&self) -> &str;

    /// Get the JSON Schema for the tool's parameters.
    fn parameters(&self) -> Value;

    /// Execute the tool with the given arguments.
    ///
    /// Errors returned here never abort a run: the dispatcher folds them
    /// into a textual outcome the model sees in the next round.
    async fn execute(&self, args: Value) -> Result<String>;
}

/// A trivial tool that echoes its input back. Useful for tests and wiring
/// checks.
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echoes back the provided message"
    }

    fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "message": {
                    "type": "string",
                    "description": "The message to echo back"
                }
            },
            "required": ["message"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let message = args
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("(no message)");
        Ok(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_echo_tool() {
        let tool = EchoTool;
        assert_eq!(tool.name(), "echo");

        let result = tool.execute(json!({"message": "hello"})).await.unwrap();
        assert_eq!(result, "hello");
    }

    #[tokio::test]
    async fn test_echo_tool_missing_message() {
        let tool = EchoTool;
        let result = tool.execute(json!({})).await.unwrap();
        assert_eq!(result, "(no message)");
    }

    #[test]
    fn test_echo_tool_schema_shape() {
        let tool = EchoTool;
        let params = tool.parameters();
        assert_eq!(params["type"], "object");
        assert!(params["properties"]["message"].is_object());
    }
}
