//! Conversation thread state owned by a controller.

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::types::Message;

/// Stream currently consumed on behalf of a session.
#[derive(Debug)]
struct ActiveStream {
    run_id: String,
    /// Covers the whole `start()` call including continuations.
    chain: CancellationToken,
    /// Covers only the stream of `run_id`.
    stream: CancellationToken,
}

/// One conversation thread: its id, transcript and the live stream, if any.
///
/// Every mutation from a run driver carries the generation it was started
/// under; a driver superseded by `start()`, `cancel()` or `reset()` can no
/// longer touch the session.
#[derive(Debug)]
pub struct RunSession {
    thread_id: String,
    run_id: Option<String>,
    messages: Vec<Message>,
    active: Option<ActiveStream>,
    generation: u64,
}

impl Default for RunSession {
    fn default() -> Self {
        Self::new()
    }
}

impl RunSession {
    /// Start a fresh thread with a generated id.
    pub fn new() -> Self {
        Self::with_thread_id(new_thread_id())
    }

    /// Resume an existing conversation thread.
    pub fn with_thread_id(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            run_id: None,
            messages: Vec::new(),
            active: None,
            generation: 0,
        }
    }

    /// Id sent as `threadId` with every run of this session.
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Most recent run id issued in this thread.
    pub fn run_id(&self) -> Option<&str> {
        self.run_id.as_deref()
    }

    /// The transcript, in append order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Run whose stream is live, if any.
    pub fn active_run_id(&self) -> Option<&str> {
        self.active.as_ref().map(|active| active.run_id.as_str())
    }

    /// Whether a stream is live.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Cancel the active stream, if any. Idempotent.
    pub fn cancel_active(&mut self) -> bool {
        self.generation += 1;
        match self.active.take() {
            Some(active) => {
                tracing::debug!(thread_id = %self.thread_id, run_id = %active.run_id, "cancel active stream");
                active.chain.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel any active run and switch to a fresh thread with an empty transcript.
    pub fn reset(&mut self) {
        self.cancel_active();
        self.thread_id = new_thread_id();
        self.run_id = None;
        self.messages.clear();
    }

    /// Cancel whatever is active and install a new chain for `run_id`.
    ///
    /// Returns the chain generation, the chain token, and the token of the
    /// first stream.
    pub(crate) fn begin_chain(
        &mut self,
        run_id: &str,
        messages: Vec<Message>,
    ) -> (u64, CancellationToken, CancellationToken) {
        self.cancel_active();
        let chain = CancellationToken::new();
        let stream = chain.child_token();
        self.active = Some(ActiveStream {
            run_id: run_id.to_string(),
            chain: chain.clone(),
            stream: stream.clone(),
        });
        self.run_id = Some(run_id.to_string());
        self.messages = messages;
        (self.generation, chain, stream)
    }

    /// Swap the finished stream of a chain for its continuation's stream.
    ///
    /// `None` when the chain was superseded in the meantime.
    pub(crate) fn begin_continuation(
        &mut self,
        generation: u64,
        run_id: &str,
    ) -> Option<CancellationToken> {
        if generation != self.generation {
            return None;
        }
        let active = self.active.as_mut()?;
        active.stream.cancel();
        active.stream = active.chain.child_token();
        active.run_id = run_id.to_string();
        self.run_id = Some(run_id.to_string());
        Some(active.stream.clone())
    }

    pub(crate) fn append(&mut self, generation: u64, message: Message) -> bool {
        if generation != self.generation {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Clear the active stream once its chain reached a terminal state.
    pub(crate) fn finish_chain(&mut self, generation: u64) {
        if generation == self.generation {
            self.active = None;
        }
    }
}

fn new_thread_id() -> String {
    Uuid::new_v4().to_string()
}
