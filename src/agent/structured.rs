//! Structured-output contracts.
//!
//! An [`OutputContract`] turns a caller type into two things at once: a
//! synthetic tool definition the model is forced to call, and the validator
//! for that tool's arguments. The same mechanism backs both structured run
//! output and memory-record updates.

use std::sync::Arc;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AgentError, Result};
use crate::providers::ToolDefinition;

type Validator = Arc<dyn Fn(&Value) -> std::result::Result<(), String> + Send + Sync>;

/// A schema contract derived from a caller-supplied type.
///
/// The contract's name is the schema title (the type name, for derived
/// schemas) and its parameters are the type's JSON Schema. Validation
/// deserializes the candidate value into the original type, so anything the
/// contract accepts is guaranteed to parse back out of
/// [`RunResult::parse`](crate::agent::RunResult::parse).
#[derive(Clone)]
pub struct OutputContract {
    name: String,
    description: String,
    parameters: Value,
    validator: Validator,
}

impl std::fmt::Debug for OutputContract {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputContract")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

impl OutputContract {
    /// Derive a contract from a type.
    ///
    /// # Example
    /// ```
    /// use femtoagent::agent::OutputContract;
    /// use schemars::JsonSchema;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize, JsonSchema)]
    /// struct Summary {
    ///     title: String,
    /// }
    ///
    /// let contract = OutputContract::of::<Summary>();
    /// assert_eq!(contract.name(), "Summary");
    /// ```
    pub fn of<T: JsonSchema + DeserializeOwned + 'static>() -> Self {
        let root = schemars::schema_for!(T);

        let name = root
            .schema
            .metadata
            .as_ref()
            .and_then(|m| m.title.clone())
            .unwrap_or_else(short_type_name::<T>);
        let description = root
            .schema
            .metadata
            .as_ref()
            .and_then(|m| m.description.clone())
            .unwrap_or_else(|| format!("Structured output: {}", name));
        let parameters = serde_json::to_value(&root.schema)
            .unwrap_or_else(|_| serde_json::json!({"type": "object"}));

        let validator: Validator = Arc::new(|value: &Value| {
            serde_json::from_value::<T>(value.clone())
                .map(drop)
                .map_err(|e| e.to_string())
        });

        Self {
            name,
            description,
            parameters,
            validator,
        }
    }

    /// The contract's name, used as the synthetic tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The contract's JSON Schema.
    pub fn parameters(&self) -> &Value {
        &self.parameters
    }

    /// The synthetic tool definition offered to the model.
    pub fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(&self.name, &self.description, self.parameters.clone())
    }

    /// Whether a tool-call name commits to this contract.
    pub fn matches(&self, tool_name: &str) -> bool {
        self.name == tool_name
    }

    /// Validate candidate arguments against the contract.
    pub fn validate(&self, arguments: &Value) -> Result<()> {
        (self.validator)(arguments).map_err(|e| {
            AgentError::Validation(format!("arguments for '{}' rejected: {}", self.name, e))
        })
    }
}

fn short_type_name<T>() -> String {
    std::any::type_name::<T>()
        .rsplit("::")
        .next()
        .unwrap_or("StructuredOutput")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    /// A person extracted from the conversation.
    #[derive(Debug, Deserialize, JsonSchema, PartialEq)]
    struct Person {
        name: String,
        age: u32,
    }

    #[test]
    fn test_contract_name_is_type_name() {
        let contract = OutputContract::of::<Person>();
        assert_eq!(contract.name(), "Person");
        assert!(contract.matches("Person"));
        assert!(!contract.matches("person"));
    }

    #[test]
    fn test_contract_description_from_doc_comment() {
        let contract = OutputContract::of::<Person>();
        assert_eq!(
            contract.definition().description,
            "A person extracted from the conversation."
        );
    }

    #[test]
    fn test_contract_schema_lists_fields() {
        let contract = OutputContract::of::<Person>();
        let params = contract.parameters();
        assert!(params["properties"]["name"].is_object());
        assert!(params["properties"]["age"].is_object());
    }

    #[test]
    fn test_validate_accepts_conforming_arguments() {
        let contract = OutputContract::of::<Person>();
        assert!(contract
            .validate(&json!({"name": "Alice", "age": 30}))
            .is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_field() {
        let contract = OutputContract::of::<Person>();
        let err = contract.validate(&json!({"name": "Alice"})).unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
        assert!(err.to_string().contains("Person"));
    }

    #[test]
    fn test_validate_rejects_wrong_type() {
        let contract = OutputContract::of::<Person>();
        let err = contract
            .validate(&json!({"name": "Alice", "age": "thirty"}))
            .unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }
}
