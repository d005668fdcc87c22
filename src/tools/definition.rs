//! Tool definitions handed to the consuming orchestration framework

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ToolError;

/// Name, description and input schema of a resolved tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Create a new tool definition with an empty object schema
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: Self::empty_schema(),
        }
    }

    /// Set input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = schema;
        self
    }

    /// Schema accepting any object
    pub fn empty_schema() -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    /// Function-calling schema for the orchestration framework
    pub fn to_function_schema(&self) -> Value {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.input_schema,
        })
    }

    /// Check arguments against the schema's object type and `required` list
    pub fn validate_input(&self, input: &Value) -> Result<(), ToolError> {
        let schema = &self.input_schema;

        if schema.get("type").and_then(Value::as_str) == Some("object") && !input.is_object() {
            return Err(ToolError::InvalidInput {
                tool: self.name.clone(),
                message: "expected a JSON object".to_string(),
            });
        }

        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for req in required {
                if let Some(field_name) = req.as_str()
                    && input.get(field_name).is_none()
                {
                    return Err(ToolError::InvalidInput {
                        tool: self.name.clone(),
                        message: format!("missing required field: {}", field_name),
                    });
                }
            }
        }

        Ok(())
    }
}
