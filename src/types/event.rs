//! Inbound protocol events.
//!
//! Events arrive as JSON objects discriminated by a `type` field, with
//! camelCase payload fields. Types the client does not understand decode to
//! [`Event::Unrecognized`] so one odd event never takes a stream down.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use super::message::Role;

/// A single event from the backend's run stream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    /// Ids are informational; backends may omit either one.
    #[serde(rename = "RUN_STARTED", rename_all = "camelCase")]
    RunStarted {
        #[serde(default)]
        thread_id: String,
        #[serde(default)]
        run_id: String,
    },

    #[serde(rename = "RUN_FINISHED", rename_all = "camelCase")]
    RunFinished {
        #[serde(default)]
        thread_id: String,
        #[serde(default)]
        run_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
    },

    #[serde(rename = "RUN_ERROR", rename_all = "camelCase")]
    RunError {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },

    #[serde(rename = "STEP_STARTED", rename_all = "camelCase")]
    StepStarted { step_name: String },

    #[serde(rename = "STEP_FINISHED", rename_all = "camelCase")]
    StepFinished { step_name: String },

    #[serde(rename = "TEXT_MESSAGE_START", rename_all = "camelCase")]
    TextMessageStart {
        message_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        role: Option<Role>,
    },

    #[serde(rename = "TEXT_MESSAGE_CONTENT", rename_all = "camelCase")]
    TextMessageContent { message_id: String, delta: String },

    #[serde(rename = "TEXT_MESSAGE_END", rename_all = "camelCase")]
    TextMessageEnd { message_id: String },

    #[serde(rename = "TOOL_CALL_START", rename_all = "camelCase")]
    ToolCallStart {
        tool_call_id: String,
        tool_call_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_message_id: Option<String>,
    },

    #[serde(rename = "TOOL_CALL_ARGS", rename_all = "camelCase")]
    ToolCallArgs { tool_call_id: String, delta: String },

    #[serde(rename = "TOOL_CALL_END", rename_all = "camelCase")]
    ToolCallEnd { tool_call_id: String },

    #[serde(rename = "CUSTOM")]
    Custom {
        name: String,
        #[serde(default)]
        value: Value,
    },

    /// Produced locally when a payload cannot be decoded; never sent.
    #[serde(skip)]
    Unrecognized { event_type: String, reason: String },
}

/// Wire names of the events the client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    RunStarted,
    RunFinished,
    RunError,
    StepStarted,
    StepFinished,
    TextMessageStart,
    TextMessageContent,
    TextMessageEnd,
    ToolCallStart,
    ToolCallArgs,
    ToolCallEnd,
    Custom,
    Unrecognized,
}

impl Event {
    /// Wire type of this event.
    pub fn event_type(&self) -> EventType {
        match self {
            Self::RunStarted { .. } => EventType::RunStarted,
            Self::RunFinished { .. } => EventType::RunFinished,
            Self::RunError { .. } => EventType::RunError,
            Self::StepStarted { .. } => EventType::StepStarted,
            Self::StepFinished { .. } => EventType::StepFinished,
            Self::TextMessageStart { .. } => EventType::TextMessageStart,
            Self::TextMessageContent { .. } => EventType::TextMessageContent,
            Self::TextMessageEnd { .. } => EventType::TextMessageEnd,
            Self::ToolCallStart { .. } => EventType::ToolCallStart,
            Self::ToolCallArgs { .. } => EventType::ToolCallArgs,
            Self::ToolCallEnd { .. } => EventType::ToolCallEnd,
            Self::Custom { .. } => EventType::Custom,
            Self::Unrecognized { .. } => EventType::Unrecognized,
        }
    }

    /// Whether this event ends the run it belongs to.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::RunFinished { .. } | Self::RunError { .. })
    }

    /// Decode one JSON payload.
    ///
    /// Unknown `type` values and payloads with missing fields become
    /// [`Event::Unrecognized`]; only text that is not JSON at all is an error.
    pub fn decode(data: &str) -> Result<Self, serde_json::Error> {
        let value: Value = serde_json::from_str(data)?;
        let event_type = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let known = event_type
            .parse::<EventType>()
            .is_ok_and(|t| t != EventType::Unrecognized);
        if !known {
            return Ok(Self::Unrecognized {
                reason: "unknown event type".to_string(),
                event_type,
            });
        }

        Ok(serde_json::from_value(value).unwrap_or_else(|err| Self::Unrecognized {
            event_type,
            reason: err.to_string(),
        }))
    }
}
