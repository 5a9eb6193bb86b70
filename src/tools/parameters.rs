//! JSON Schema parameter definitions for tools.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Parameter schema advertised with a tool definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolParameters {
    pub schema: Value,
}

impl ToolParameters {
    /// Use a hand-written JSON schema.
    pub fn from_schema(schema: Value) -> Self {
        Self { schema }
    }

    /// Object schema with no properties.
    pub fn empty() -> Self {
        Self::object().build()
    }

    /// Start an object schema.
    pub fn object() -> ParameterBuilder {
        ParameterBuilder::default()
    }
}

/// Builder for object-shaped parameter schemas.
#[derive(Debug, Default)]
pub struct ParameterBuilder {
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl ParameterBuilder {
    /// Add a string property.
    pub fn string(self, name: &str, description: &str, required: bool) -> Self {
        self.property(name, json!({"type": "string", "description": description}), required)
    }

    /// Add a number property.
    pub fn number(self, name: &str, description: &str, required: bool) -> Self {
        self.property(name, json!({"type": "number", "description": description}), required)
    }

    /// Add a boolean property.
    pub fn boolean(self, name: &str, description: &str, required: bool) -> Self {
        self.property(name, json!({"type": "boolean", "description": description}), required)
    }

    /// Add a string property restricted to `values`.
    pub fn string_enum(self, name: &str, description: &str, values: &[&str], required: bool) -> Self {
        self.property(
            name,
            json!({"type": "string", "description": description, "enum": values}),
            required,
        )
    }

    /// Add a property with an arbitrary sub-schema.
    pub fn property(mut self, name: &str, schema: Value, required: bool) -> Self {
        self.properties.insert(name.to_string(), schema);
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    pub fn build(self) -> ToolParameters {
        ToolParameters {
            schema: json!({
                "type": "object",
                "properties": self.properties,
                "required": self.required,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_marks_required_properties() {
        let params = ToolParameters::object()
            .string("query", "Search query", true)
            .number("limit", "Max results", false)
            .string_enum("scope", "Where to search", &["cases", "documents"], false)
            .build();

        assert_eq!(params.schema["properties"]["query"]["type"], "string");
        assert_eq!(params.schema["properties"]["scope"]["enum"][1], "documents");
        assert_eq!(params.schema["required"], json!(["query"]));
    }

    #[test]
    fn empty_schema_is_an_object() {
        let params = ToolParameters::empty();
        assert_eq!(params.schema["type"], "object");
        assert_eq!(params.schema["properties"], json!({}));
    }
}
