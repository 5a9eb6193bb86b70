//! Convenience re-exports for common use.

pub use crate::config::ClientConfig;
pub use crate::error::{ClientError, Result};
pub use crate::run::{
    RunController, RunEvent, RunEventPayload, RunEventSink, RunOutcome, RunStatus, StreamHandle,
};
pub use crate::tools::{
    FnTool, ParameterBuilder, Tool, ToolArguments, ToolExecutionContext, ToolParameters,
    ToolRegistry,
};
#[cfg(feature = "http")]
pub use crate::transport::HttpEventSource;
pub use crate::transport::{EventSource, EventStream, ScriptedEventSource};
pub use crate::types::{ContextPayload, Event, Message, Role, RunAgentInput, ToolDefinition};
