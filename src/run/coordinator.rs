//! Executes resolved tool calls and turns their results into tool messages.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use serde_json::{json, Value};

use crate::accumulator::ResolvedToolCall;
use crate::error::ClientError;
use crate::tools::{ToolArguments, ToolExecutionContext, ToolRegistry};
use crate::types::Message;

/// Result of one tool execution, already in transcript form.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub result: Value,
    pub is_error: bool,
}

impl ToolOutcome {
    fn ok(result: Value) -> Self {
        Self {
            result,
            is_error: false,
        }
    }

    fn error(result: Value) -> Self {
        Self {
            result,
            is_error: true,
        }
    }
}

/// A tool message ready to append, plus the outcome it encodes.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResolution {
    pub call: ResolvedToolCall,
    pub outcome: ToolOutcome,
    pub message: Message,
}

/// Runs tool calls against a registry. Never fails: every problem becomes an
/// error payload the agent can read in the transcript.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionCoordinator {
    registry: ToolRegistry,
}

impl ToolExecutionCoordinator {
    /// Create a coordinator over `registry`.
    pub fn new(registry: ToolRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Look up and run `tool_name`, catching handler errors and panics.
    pub async fn execute(
        &self,
        tool_name: &str,
        arguments: Value,
        ctx: &ToolExecutionContext,
    ) -> ToolOutcome {
        let Some(tool) = self.registry.get(tool_name) else {
            tracing::warn!(tool = tool_name, "agent requested an unknown tool");
            return ToolOutcome::error(json!({ "error": "unknown tool", "tool": tool_name }));
        };

        let args = ToolArguments::new(arguments);
        match AssertUnwindSafe(tool.execute(&args, ctx)).catch_unwind().await {
            Ok(Ok(value)) => ToolOutcome::ok(value),
            Ok(Err(err)) => {
                tracing::debug!(tool = tool_name, error = %err, "tool handler failed");
                ToolOutcome::error(json!({ "error": handler_error_message(err) }))
            }
            Err(panic) => {
                tracing::warn!(tool = tool_name, "tool handler panicked");
                ToolOutcome::error(json!({ "error": panic_message(panic.as_ref()) }))
            }
        }
    }

    /// Execute a resolved call and build its tool message.
    pub async fn resolve(&self, call: ResolvedToolCall, ctx: &ToolExecutionContext) -> ToolResolution {
        let outcome = self
            .execute(&call.tool_name, call.arguments.clone(), ctx)
            .await;
        let message = Message::tool_result(call.tool_call_id.clone(), &outcome.result);
        ToolResolution {
            call,
            outcome,
            message,
        }
    }

    /// Tool message reporting arguments that could not be parsed.
    pub fn malformed_arguments(tool_call_id: &str, detail: &str) -> Message {
        Message::tool_result(
            tool_call_id,
            &json!({ "error": "invalid arguments", "detail": detail }),
        )
    }
}

fn handler_error_message(err: ClientError) -> String {
    match err {
        ClientError::ToolExecution { message, .. } => message,
        other => other.to_string(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "tool handler panicked".to_string()
    }
}
