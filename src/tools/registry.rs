//! Tool registry for FemtoAgent
//!
//! The registry maps tool names to implementations and produces the
//! definitions handed to LLM providers. It is built once from pre-built
//! tools and is immutable after construction, so a registry shared across
//! concurrent runs never changes underneath them.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::providers::ToolDefinition;

use super::Tool;

/// An immutable registry of tools.
///
/// If two tools share a name, the later one in the input wins.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use femtoagent::tools::{EchoTool, ToolRegistry};
///
/// let registry = ToolRegistry::new(vec![Arc::new(EchoTool)]);
/// assert!(registry.has("echo"));
/// assert_eq!(registry.len(), 1);
/// ```
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Build a registry from pre-built tools.
    pub fn new(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut map: HashMap<String, Arc<dyn Tool>> = HashMap::with_capacity(tools.len());
        for tool in tools {
            let name = tool.name().to_string();
            debug!(tool = %name, "registering tool");
            map.insert(name, tool);
        }
        Self { tools: map }
    }

    /// An empty registry.
    pub fn empty() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Get all tool definitions for use with LLM providers.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters(),
            })
            .collect()
    }

    /// Get the names of all registered tools.
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }

    /// Check if a tool exists in the registry.
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::empty()
    }
}
