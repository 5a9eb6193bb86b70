//! Event sources: where run streams come from.

#[cfg(feature = "http")]
pub mod http;
pub mod scripted;
pub mod sse;

#[cfg(feature = "http")]
pub use http::HttpEventSource;
pub use scripted::ScriptedEventSource;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::ClientError;
use crate::types::{Event, RunAgentInput};

/// Ordered events of one run. Dropping the stream unsubscribes.
pub type EventStream = BoxStream<'static, Result<Event, ClientError>>;

/// Opens one event stream per run request.
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn open(&self, input: RunAgentInput) -> Result<EventStream, ClientError>;
}
