//! Run lifecycle: session state, event dispatch, tool execution and the
//! controller that chains continuations.

pub mod controller;
pub mod coordinator;
pub mod dispatcher;
mod driver;
pub mod events;
pub mod session;
pub mod types;

pub use controller::{RunController, StreamHandle};
pub use coordinator::{ToolExecutionCoordinator, ToolOutcome, ToolResolution};
pub use dispatcher::{Dispatch, EventDispatcher};
pub use events::{RunEvent, RunEventPayload, RunEventSink};
pub use session::RunSession;
pub use types::{RunOutcome, RunStatus};
