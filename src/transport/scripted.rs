//! In-memory event source that replays prepared streams.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::{EventSource, EventStream};
use crate::error::{ClientError, Result};
use crate::types::{Event, RunAgentInput};

enum Script {
    Events(Vec<Result<Event>>),
    Channel(mpsc::UnboundedReceiver<Result<Event>>),
    OpenError(String),
}

/// Serves one prepared stream per `open()`, in the order they were pushed.
///
/// Every request is recorded so the exact message lists sent to each run can
/// be inspected afterwards.
#[derive(Default)]
pub struct ScriptedEventSource {
    scripts: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<RunAgentInput>>,
}

impl ScriptedEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a stream that yields `events` and then closes.
    pub fn push_events(&self, events: impl IntoIterator<Item = Event>) -> &Self {
        self.push_results(events.into_iter().map(Ok))
    }

    /// Queue a stream that may carry transport errors.
    pub fn push_results(&self, items: impl IntoIterator<Item = Result<Event>>) -> &Self {
        lock(&self.scripts).push_back(Script::Events(items.into_iter().collect()));
        self
    }

    /// Queue a live stream fed through the returned sender; it closes when
    /// the sender is dropped.
    pub fn push_channel(&self) -> mpsc::UnboundedSender<Result<Event>> {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.scripts).push_back(Script::Channel(rx));
        tx
    }

    /// Make the next `open()` fail with a transport error.
    pub fn push_open_error(&self, message: impl Into<String>) -> &Self {
        lock(&self.scripts).push_back(Script::OpenError(message.into()));
        self
    }

    /// Requests received so far, oldest first.
    pub fn requests(&self) -> Vec<RunAgentInput> {
        lock(&self.requests).clone()
    }

    /// Scripts not yet consumed by `open()`.
    pub fn remaining(&self) -> usize {
        lock(&self.scripts).len()
    }
}

impl std::fmt::Debug for ScriptedEventSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedEventSource")
            .field("remaining", &self.remaining())
            .field("requests", &lock(&self.requests).len())
            .finish()
    }
}

#[async_trait]
impl EventSource for ScriptedEventSource {
    async fn open(&self, input: RunAgentInput) -> Result<EventStream> {
        lock(&self.requests).push(input);
        let script = lock(&self.scripts).pop_front();
        match script {
            Some(Script::Events(items)) => Ok(futures::stream::iter(items).boxed()),
            Some(Script::Channel(rx)) => Ok(UnboundedReceiverStream::new(rx).boxed()),
            Some(Script::OpenError(message)) => Err(ClientError::transport(message)),
            None => Err(ClientError::transport("no scripted stream left")),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
