//! Arguments handed to a tool handler.
//!
//! The backend streams tool arguments as JSON text. By the time a handler runs
//! the text has been parsed once into a [`Value`]; an empty argument string
//! arrives here as `{}`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ClientError;

/// Parsed arguments of one finalized tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolArguments {
    value: Value,
}

impl ToolArguments {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    /// The arguments exactly as the backend sent them.
    pub fn raw(&self) -> &Value {
        &self.value
    }

    /// Take the underlying JSON value.
    pub fn into_raw(self) -> Value {
        self.value
    }

    /// True when the call carried no fields.
    pub fn is_empty(&self) -> bool {
        match &self.value {
            Value::Object(fields) => fields.is_empty(),
            Value::Null => true,
            _ => false,
        }
    }

    /// Borrow a required string field.
    pub fn get_str(&self, key: &str) -> Result<&str, ClientError> {
        match self.field(key) {
            Some(Value::String(s)) => Ok(s),
            Some(other) => Err(wrong_type(key, "a string", other)),
            None => Err(missing(key)),
        }
    }

    /// Convert a required field into `T`.
    pub fn require<T: DeserializeOwned>(&self, key: &str) -> Result<T, ClientError> {
        self.optional(key)?.ok_or_else(|| missing(key))
    }

    /// Convert a field into `T` if present. `null` counts as absent; a value of
    /// the wrong shape is still an error.
    pub fn optional<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ClientError> {
        match self.field(key) {
            None => Ok(None),
            Some(value) => T::deserialize(value)
                .map(Some)
                .map_err(|e| ClientError::InvalidArgument(format!("argument '{key}': {e}"))),
        }
    }

    /// Deserialize the whole argument object.
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        T::deserialize(&self.value)
            .map_err(|e| ClientError::InvalidArgument(format!("tool arguments: {e}")))
    }

    fn field(&self, key: &str) -> Option<&Value> {
        self.value.get(key).filter(|v| !v.is_null())
    }
}

fn missing(key: &str) -> ClientError {
    ClientError::InvalidArgument(format!("missing argument '{key}'"))
}

fn wrong_type(key: &str, expected: &str, found: &Value) -> ClientError {
    let found = match found {
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
        Value::String(_) => "a string",
        Value::Null => "null",
    };
    ClientError::InvalidArgument(format!("argument '{key}' must be {expected}, got {found}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_field_reports_missing_and_mistyped() {
        let args = ToolArguments::new(json!({"case": "A-17", "page": 2}));
        assert_eq!(args.get_str("case").unwrap(), "A-17");

        let err = args.get_str("page").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument: argument 'page' must be a string, got a number"
        );
        assert!(matches!(args.get_str("query"), Err(ClientError::InvalidArgument(_))));
    }

    #[test]
    fn null_fields_count_as_absent() {
        let args = ToolArguments::new(json!({"limit": null, "exact": true}));
        assert_eq!(args.optional::<u32>("limit").unwrap(), None);
        assert!(args.require::<u32>("limit").is_err());
        assert!(args.require::<bool>("exact").unwrap());
        assert!(args.optional::<u32>("exact").is_err());
    }

    #[test]
    fn empty_arguments() {
        assert!(ToolArguments::new(json!({})).is_empty());
        assert!(!ToolArguments::new(json!({"q": "x"})).is_empty());
        assert!(!ToolArguments::new(json!([1])).is_empty());
    }

    #[test]
    fn parse_whole_object() {
        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct Lookup {
            case: String,
            pages: Option<Vec<u32>>,
        }

        let args = ToolArguments::new(json!({"case": "B-2", "pages": [1, 3]}));
        assert_eq!(
            args.parse::<Lookup>().unwrap(),
            Lookup {
                case: "B-2".into(),
                pages: Some(vec![1, 3]),
            }
        );
    }
}
