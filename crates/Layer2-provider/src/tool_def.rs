//! Tool definitions sent to the model

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Definition of a tool that can be called by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool name (should be unique)
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for parameters
    pub parameters: ToolParameters,
}

/// Parameters schema for a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolParameters {
    /// Type (usually "object")
    #[serde(rename = "type")]
    pub schema_type: String,

    /// Properties (parameter definitions)
    pub properties: Value,

    /// Required parameters
    #[serde(default)]
    pub required: Vec<String>,
}

impl ToolDef {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: ToolParameters {
                schema_type: "object".to_string(),
                properties: json!({}),
                required: vec![],
            },
        }
    }

    /// Build from a full JSON schema (`{"type":"object","properties":..,"required":..}`)
    pub fn from_schema(
        name: impl Into<String>,
        description: impl Into<String>,
        schema: &Value,
    ) -> Self {
        let mut def = Self::new(name, description);
        if let Some(props) = schema.get("properties").filter(|p| p.is_object()) {
            def.parameters.properties = props.clone();
        }
        if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
            def.parameters.required = required
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect();
        }
        def
    }

    /// JSON schema form of the parameters
    pub fn schema(&self) -> Value {
        json!({
            "type": self.parameters.schema_type,
            "properties": self.parameters.properties,
            "required": self.parameters.required,
        })
    }
}
