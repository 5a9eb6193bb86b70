//! Transcript message types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// A message in a conversation transcript.
///
/// `content` stays `None` only for messages that carried no text; finalized
/// assistant messages always hold the accumulated text, even when empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Message {
    /// Create a user message with a fresh id.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role: Role::User,
            content: Some(text.into()),
            tool_call_id: None,
        }
    }

    /// Create a system message with a fresh id.
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            role: Role::System,
            content: Some(text.into()),
            tool_call_id: None,
        }
    }

    /// Create an assistant message under the id the backend streamed it with.
    pub fn assistant(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Assistant,
            content: Some(text.into()),
            tool_call_id: None,
        }
    }

    /// Create a tool-result message whose content is the JSON text of `result`.
    pub fn tool_result(tool_call_id: impl Into<String>, result: &serde_json::Value) -> Self {
        Self {
            id: new_message_id(),
            role: Role::Tool,
            content: Some(result.to_string()),
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Text content, or an empty string.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Parse the content of a tool message back into JSON.
    pub fn tool_payload(&self) -> Option<serde_json::Value> {
        if self.role != Role::Tool {
            return None;
        }
        serde_json::from_str(self.content.as_deref()?).ok()
    }
}

/// Conversation role.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    System,
    Developer,
    User,
    Assistant,
    Tool,
}

pub(crate) fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}
