//! Notifications delivered to the caller while runs progress.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Message;

/// Callback receiving run notifications.
pub type RunEventSink = Arc<dyn Fn(RunEvent) + Send + Sync>;

/// Notification payloads.
///
/// Lifecycle and custom payloads are passed through from the event stream;
/// the client adds message, tool and diagnostic payloads of its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEventPayload {
    RunStarted,
    RunFinished {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
    },
    RunErrored {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
    RunCanceled,
    /// A continuation run was issued after tool results were appended.
    Continuation {
        previous_run_id: String,
    },
    StepStarted {
        step_name: String,
    },
    StepFinished {
        step_name: String,
    },
    TextDelta {
        message_id: String,
        delta: String,
    },
    /// A message was appended to the transcript.
    MessageAppended {
        message: Message,
    },
    ToolCallStarted {
        tool_call_id: String,
        tool_name: String,
    },
    ToolCallCompleted {
        tool_call_id: String,
        tool_name: String,
        is_error: bool,
    },
    Custom {
        name: String,
        value: Value,
    },
    /// Non-fatal protocol inconsistency; the offending event was dropped.
    Diagnostic {
        message: String,
    },
}

/// Envelope for one notification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunEvent {
    pub thread_id: String,
    pub run_id: String,
    /// Monotonic per controller chain, starting at 1.
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub payload: RunEventPayload,
}

#[derive(Clone)]
pub(crate) struct RunEventEmitter {
    seq: Arc<AtomicU64>,
    sink: Option<RunEventSink>,
}

impl RunEventEmitter {
    pub(crate) fn new(sink: Option<RunEventSink>) -> Self {
        Self {
            seq: Arc::new(AtomicU64::new(1)),
            sink,
        }
    }

    pub(crate) fn emit(&self, thread_id: &str, run_id: &str, payload: RunEventPayload) {
        let Some(sink) = &self.sink else {
            return;
        };
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        (sink)(RunEvent {
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
            seq,
            timestamp: Utc::now(),
            payload,
        });
    }
}
