//! Outbound run request types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::message::Message;

/// Body sent to the backend to start (or continue) a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunAgentInput {
    pub run_id: String,
    pub thread_id: String,
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDefinition>,
    pub context: ContextPayload,
}

/// Tool advertised to the backend agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Caller-supplied bundle forwarded untouched with every run request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ContextPayload(Value);

impl ContextPayload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Default for ContextPayload {
    fn default() -> Self {
        Self(Value::Object(Default::default()))
    }
}

impl From<Value> for ContextPayload {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
