//! Client-side tools the backend agent may call.

pub mod arguments;
pub mod parameters;
pub mod registry;
pub mod tool;

pub use arguments::ToolArguments;
pub use parameters::{ParameterBuilder, ToolParameters};
pub use registry::ToolRegistry;
pub use tool::{FnTool, Tool, ToolExecutionContext};
