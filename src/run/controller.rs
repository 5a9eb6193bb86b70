//! Public entry point: starts runs, cancels them, owns the session.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::coordinator::ToolExecutionCoordinator;
use super::driver::{lock, new_run_id, RunDriver};
use super::events::{RunEventEmitter, RunEventSink};
use super::session::RunSession;
use super::types::{RunOutcome, RunStatus};
use crate::config::{ClientConfig, DEFAULT_MAX_CONTINUATIONS, DEFAULT_STREAM_IDLE_TIMEOUT_MS};
use crate::tools::ToolRegistry;
use crate::transport::EventSource;
use crate::types::{ContextPayload, Message, ToolDefinition};

/// Handle for one `start()` call and the continuations it chains.
#[derive(Debug)]
pub struct StreamHandle {
    run_id: String,
    thread_id: String,
    cancel: CancellationToken,
    result_rx: oneshot::Receiver<RunOutcome>,
}

impl StreamHandle {
    /// Id of the first run of the chain.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Thread the chain runs on.
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Cancel the chain. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the chain was cancelled, by this handle or by a newer `start()`.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Token cancelled when this chain is cancelled or superseded.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the chain to reach a terminal state.
    pub async fn wait(self) -> RunOutcome {
        let Self {
            run_id,
            thread_id,
            result_rx,
            ..
        } = self;
        result_rx.await.unwrap_or_else(|_| {
            RunOutcome::new(RunStatus::Canceled, &thread_id, &run_id, None, Vec::new(), 0)
        })
    }
}

/// Drives agent runs for one conversation thread.
///
/// At most one stream is live at a time: `start()` cancels whatever the
/// previous call left running before the new request is issued.
pub struct RunController {
    source: Arc<dyn EventSource>,
    coordinator: Arc<ToolExecutionCoordinator>,
    sink: Option<RunEventSink>,
    idle_timeout: Option<Duration>,
    max_continuations: usize,
    session: Arc<Mutex<RunSession>>,
}

impl RunController {
    /// Create a controller on a fresh thread with default stream limits.
    pub fn new(source: Arc<dyn EventSource>, registry: ToolRegistry) -> Self {
        Self {
            source,
            coordinator: Arc::new(ToolExecutionCoordinator::new(registry)),
            sink: None,
            idle_timeout: Some(Duration::from_millis(DEFAULT_STREAM_IDLE_TIMEOUT_MS)),
            max_continuations: DEFAULT_MAX_CONTINUATIONS,
            session: Arc::new(Mutex::new(RunSession::new())),
        }
    }

    /// Apply the stream limits of `config`.
    pub fn with_config(mut self, config: &ClientConfig) -> Self {
        self.idle_timeout = config.stream_idle_timeout();
        self.max_continuations = config.max_continuations;
        self
    }

    /// Receive every notification the controller emits.
    pub fn with_event_sink(mut self, sink: RunEventSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Continue an existing conversation thread instead of a fresh one.
    pub fn with_thread_id(self, thread_id: impl Into<String>) -> Self {
        *lock(&self.session) = RunSession::with_thread_id(thread_id);
        self
    }

    /// Start a run. Must be called within a Tokio runtime.
    ///
    /// The request carries `prior_messages` followed by `new_user_message`
    /// when present. Any previously active chain is cancelled first.
    pub fn start(
        &self,
        prior_messages: Vec<Message>,
        new_user_message: Option<Message>,
        tools: Vec<ToolDefinition>,
        context: ContextPayload,
    ) -> StreamHandle {
        let mut messages = prior_messages;
        messages.extend(new_user_message);

        let run_id = new_run_id();
        let (generation, chain, stream_token, thread_id) = {
            let mut session = lock(&self.session);
            let (generation, chain, stream_token) = session.begin_chain(&run_id, messages.clone());
            (generation, chain, stream_token, session.thread_id().to_string())
        };

        let driver = RunDriver {
            source: Arc::clone(&self.source),
            coordinator: Arc::clone(&self.coordinator),
            session: Arc::clone(&self.session),
            emitter: RunEventEmitter::new(self.sink.clone()),
            idle_timeout: self.idle_timeout,
            max_continuations: self.max_continuations,
            generation,
            thread_id: thread_id.clone(),
            tools,
            context,
        };

        let (result_tx, result_rx) = oneshot::channel();
        let first_run_id = run_id.clone();
        tokio::spawn(async move {
            let outcome = driver.run(first_run_id, stream_token, messages).await;
            let _ = result_tx.send(outcome);
        });

        StreamHandle {
            run_id,
            thread_id,
            cancel: chain,
            result_rx,
        }
    }

    /// Cancel the active chain, if any. Idempotent.
    pub fn cancel(&self) -> bool {
        lock(&self.session).cancel_active()
    }

    /// Cancel the active chain and switch to a new thread with an empty
    /// transcript.
    pub fn reset(&self) {
        lock(&self.session).reset();
    }

    /// Current thread id. Changes after `reset()`.
    pub fn thread_id(&self) -> String {
        lock(&self.session).thread_id().to_string()
    }

    /// Whether a chain is currently streaming or running tools.
    pub fn is_active(&self) -> bool {
        lock(&self.session).is_active()
    }

    /// Id of the run whose stream is live, if any.
    pub fn active_run_id(&self) -> Option<String> {
        lock(&self.session).active_run_id().map(str::to_string)
    }

    /// Snapshot of the current thread's transcript.
    pub fn transcript(&self) -> Vec<Message> {
        lock(&self.session).messages().to_vec()
    }

    /// Tools available to the agent.
    pub fn registry(&self) -> &ToolRegistry {
        self.coordinator.registry()
    }
}

impl std::fmt::Debug for RunController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunController")
            .field("registry", self.coordinator.registry())
            .field("idle_timeout", &self.idle_timeout)
            .field("max_continuations", &self.max_continuations)
            .field("session", &*lock(&self.session))
            .finish()
    }
}
