//! Streamed tool-call arguments.

use std::collections::HashMap;

use serde_json::Value;

use super::ProtocolIssue;
use crate::types::EventType;

/// A tool call whose arguments are still streaming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToolCall {
    pub tool_call_id: String,
    pub tool_name: String,
    /// Raw concatenation of argument deltas; not valid JSON until the end.
    pub partial_args_json: String,
}

/// A tool call with parsed arguments, ready to execute.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedToolCall {
    pub tool_call_id: String,
    pub tool_name: String,
    pub arguments: Value,
}

/// Result of ending a pending tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum FinalizedToolCall {
    Ready(ResolvedToolCall),
    Malformed {
        tool_call_id: String,
        tool_name: String,
        raw_arguments: String,
        detail: String,
    },
}

/// Tracks every in-flight tool call of a run, keyed by tool-call id.
#[derive(Debug, Default)]
pub struct ToolCallAccumulator {
    pending: HashMap<String, PendingToolCall>,
}

impl ToolCallAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a tool call with empty arguments.
    ///
    /// Restarting an id that is still pending discards its arguments and is
    /// reported.
    pub fn start(&mut self, tool_call_id: &str, tool_name: &str) -> Result<(), ProtocolIssue> {
        let previous = self.pending.insert(
            tool_call_id.to_string(),
            PendingToolCall {
                tool_call_id: tool_call_id.to_string(),
                tool_name: tool_name.to_string(),
                partial_args_json: String::new(),
            },
        );
        match previous {
            Some(_) => Err(ProtocolIssue::DuplicateToolCall {
                tool_call_id: tool_call_id.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Concatenate an argument fragment onto the matching call.
    pub fn append(&mut self, tool_call_id: &str, delta: &str) -> Result<(), ProtocolIssue> {
        let pending = self
            .pending
            .get_mut(tool_call_id)
            .ok_or_else(|| ProtocolIssue::UnknownToolCall {
                tool_call_id: tool_call_id.to_string(),
                event: EventType::ToolCallArgs,
            })?;
        pending.partial_args_json.push_str(delta);
        Ok(())
    }

    /// Remove the call and parse its arguments exactly once.
    ///
    /// Calls that streamed no argument fragments resolve to `{}`.
    pub fn finish(&mut self, tool_call_id: &str) -> Result<FinalizedToolCall, ProtocolIssue> {
        let pending = self
            .pending
            .remove(tool_call_id)
            .ok_or_else(|| ProtocolIssue::UnknownToolCall {
                tool_call_id: tool_call_id.to_string(),
                event: EventType::ToolCallEnd,
            })?;

        let raw = pending.partial_args_json.trim();
        let parsed = if raw.is_empty() {
            Ok(Value::Object(Default::default()))
        } else {
            serde_json::from_str::<Value>(raw)
        };

        Ok(match parsed {
            Ok(arguments) => FinalizedToolCall::Ready(ResolvedToolCall {
                tool_call_id: pending.tool_call_id,
                tool_name: pending.tool_name,
                arguments,
            }),
            Err(err) => FinalizedToolCall::Malformed {
                tool_call_id: pending.tool_call_id,
                tool_name: pending.tool_name,
                detail: err.to_string(),
                raw_arguments: pending.partial_args_json,
            },
        })
    }

    /// Look up a call that has started but not ended.
    pub fn get(&self, tool_call_id: &str) -> Option<&PendingToolCall> {
        self.pending.get(tool_call_id)
    }

    /// Number of calls still receiving arguments.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Drop all pending calls, returning their ids.
    pub fn reset(&mut self) -> Vec<String> {
        self.pending.drain().map(|(id, _)| id).collect()
    }
}
