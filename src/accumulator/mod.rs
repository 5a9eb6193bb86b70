//! Incremental assembly of streamed text messages and tool calls.

pub mod text;
pub mod tool_call;

pub use text::{StreamingTextState, TextAccumulator};
pub use tool_call::{FinalizedToolCall, PendingToolCall, ResolvedToolCall, ToolCallAccumulator};

use thiserror::Error;

use crate::types::EventType;

/// A protocol inconsistency local to one message or tool call.
///
/// These never abort a run; the offending event is dropped and the issue is
/// reported to the caller as a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolIssue {
    #[error("text message {message_id} started while {open_id} was still streaming")]
    TextMessageOverwritten { message_id: String, open_id: String },

    #[error("{event} for text message {message_id} with no open text message")]
    TextMessageNotOpen { message_id: String, event: EventType },

    #[error("{event} for text message {message_id} while {open_id} is streaming")]
    TextMessageMismatch {
        message_id: String,
        open_id: String,
        event: EventType,
    },

    #[error("{event} references unknown tool call {tool_call_id}")]
    UnknownToolCall {
        tool_call_id: String,
        event: EventType,
    },

    #[error("tool call {tool_call_id} started again before it ended")]
    DuplicateToolCall { tool_call_id: String },

    #[error("unrecognized {event_type} event: {reason}")]
    UnrecognizedEvent { event_type: String, reason: String },
}
