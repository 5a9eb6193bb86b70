//! The task that consumes run streams and chains continuations.

use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::StreamExt;
use tokio::time::{self, Instant, Sleep};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::coordinator::ToolExecutionCoordinator;
use super::dispatcher::{Dispatch, EventDispatcher};
use super::events::{RunEventEmitter, RunEventPayload};
use super::session::RunSession;
use super::types::{RunOutcome, RunStatus};
use crate::tools::ToolExecutionContext;
use crate::transport::EventSource;
use crate::types::{ContextPayload, Message, RunAgentInput, ToolDefinition};

/// How one stream of a chain ended.
#[derive(Debug)]
enum StreamEnd {
    Finished { tool_results: usize },
    Errored(String),
    Canceled,
}

/// Everything a chain needs once it left `RunController::start`.
pub(crate) struct RunDriver {
    pub(crate) source: Arc<dyn EventSource>,
    pub(crate) coordinator: Arc<ToolExecutionCoordinator>,
    pub(crate) session: Arc<Mutex<RunSession>>,
    pub(crate) emitter: RunEventEmitter,
    pub(crate) idle_timeout: Option<Duration>,
    pub(crate) max_continuations: usize,
    pub(crate) generation: u64,
    pub(crate) thread_id: String,
    pub(crate) tools: Vec<ToolDefinition>,
    pub(crate) context: ContextPayload,
}

impl RunDriver {
    /// Drive `run_id` and every continuation it triggers to a terminal state.
    pub(crate) async fn run(
        self,
        run_id: String,
        stream_token: CancellationToken,
        messages: Vec<Message>,
    ) -> RunOutcome {
        let mut dispatcher =
            EventDispatcher::with_emitter(self.thread_id.clone(), run_id, self.emitter.clone());
        let mut transcript = messages;
        let mut stream_token = stream_token;
        let mut continuations = 0usize;

        tracing::debug!(thread_id = %self.thread_id, run_id = %dispatcher.run_id(), "run start");

        loop {
            let end = self
                .run_stream(&mut dispatcher, &stream_token, &mut transcript)
                .await;

            let (status, error) = match end {
                StreamEnd::Finished { tool_results: 0 } => (RunStatus::Finished, None),
                StreamEnd::Finished { tool_results } => {
                    if continuations >= self.max_continuations {
                        let message = "continuation limit reached".to_string();
                        tracing::warn!(
                            run_id = %dispatcher.run_id(),
                            limit = self.max_continuations,
                            "{message}"
                        );
                        dispatcher.emit(RunEventPayload::RunErrored {
                            message: message.clone(),
                            code: None,
                        });
                        (RunStatus::Errored, Some(message))
                    } else {
                        let previous_run_id = dispatcher.run_id().to_string();
                        let next_run_id = new_run_id();
                        let next_token =
                            lock(&self.session).begin_continuation(self.generation, &next_run_id);
                        match next_token {
                            Some(token) => {
                                continuations += 1;
                                stream_token = token;
                                dispatcher.begin_run(&next_run_id);
                                tracing::debug!(
                                    thread_id = %self.thread_id,
                                    %previous_run_id,
                                    run_id = %next_run_id,
                                    tool_results,
                                    "continuation"
                                );
                                dispatcher.emit(RunEventPayload::Continuation { previous_run_id });
                                continue;
                            }
                            None => {
                                dispatcher.emit(RunEventPayload::RunCanceled);
                                (RunStatus::Canceled, None)
                            }
                        }
                    }
                }
                StreamEnd::Errored(message) => (RunStatus::Errored, Some(message)),
                StreamEnd::Canceled => {
                    tracing::debug!(run_id = %dispatcher.run_id(), "run canceled");
                    dispatcher.emit(RunEventPayload::RunCanceled);
                    (RunStatus::Canceled, None)
                }
            };

            lock(&self.session).finish_chain(self.generation);
            tracing::debug!(
                thread_id = %self.thread_id,
                run_id = %dispatcher.run_id(),
                ?status,
                continuations,
                "run chain ended"
            );
            return RunOutcome::new(
                status,
                &self.thread_id,
                dispatcher.run_id(),
                error,
                transcript,
                continuations,
            );
        }
    }

    /// Open one stream and consume it until a terminal event.
    async fn run_stream(
        &self,
        dispatcher: &mut EventDispatcher,
        token: &CancellationToken,
        transcript: &mut Vec<Message>,
    ) -> StreamEnd {
        let input = RunAgentInput {
            run_id: dispatcher.run_id().to_string(),
            thread_id: self.thread_id.clone(),
            messages: transcript.clone(),
            tools: self.tools.clone(),
            context: self.context.clone(),
        };

        let opened = tokio::select! {
            biased;
            _ = token.cancelled() => return StreamEnd::Canceled,
            opened = self.source.open(input) => opened,
        };
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(err) => return transport_failure(dispatcher, err.to_string()),
        };

        let mut idle = self.idle_timeout.map(|timeout| Box::pin(time::sleep(timeout)));
        let mut tool_results = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = token.cancelled() => return StreamEnd::Canceled,
                _ = idle_elapsed(&mut idle) => {
                    return transport_failure(dispatcher, "stream idle timeout".to_string());
                }
                next = stream.next() => next,
            };

            let event = match next {
                Some(Ok(event)) => event,
                Some(Err(err)) => return transport_failure(dispatcher, err.to_string()),
                None => {
                    return transport_failure(
                        dispatcher,
                        "stream closed before the run finished".to_string(),
                    )
                }
            };

            match dispatcher.dispatch(event) {
                Dispatch::Continue => {}
                Dispatch::MessageCompleted(message) => {
                    if !self.append(dispatcher, transcript, message) {
                        return StreamEnd::Canceled;
                    }
                }
                Dispatch::ToolCallReady(call) => {
                    let ctx = ToolExecutionContext {
                        tool_call_id: call.tool_call_id.clone(),
                        thread_id: self.thread_id.clone(),
                        run_id: dispatcher.run_id().to_string(),
                        cancel: token.clone(),
                    };
                    tracing::debug!(
                        tool = %call.tool_name,
                        tool_call_id = %call.tool_call_id,
                        "executing tool call"
                    );
                    let resolution = tokio::select! {
                        biased;
                        _ = token.cancelled() => return StreamEnd::Canceled,
                        resolution = self.coordinator.resolve(call, &ctx) => resolution,
                    };
                    dispatcher.emit(RunEventPayload::ToolCallCompleted {
                        tool_call_id: resolution.call.tool_call_id,
                        tool_name: resolution.call.tool_name,
                        is_error: resolution.outcome.is_error,
                    });
                    if !self.append(dispatcher, transcript, resolution.message) {
                        return StreamEnd::Canceled;
                    }
                    tool_results += 1;
                }
                Dispatch::ToolCallMalformed {
                    tool_call_id,
                    tool_name,
                    detail,
                } => {
                    tracing::debug!(%tool_call_id, tool = %tool_name, %detail, "malformed tool arguments");
                    let message = ToolExecutionCoordinator::malformed_arguments(&tool_call_id, &detail);
                    dispatcher.emit(RunEventPayload::ToolCallCompleted {
                        tool_call_id,
                        tool_name,
                        is_error: true,
                    });
                    if !self.append(dispatcher, transcript, message) {
                        return StreamEnd::Canceled;
                    }
                    tool_results += 1;
                }
                Dispatch::Finished { .. } => return StreamEnd::Finished { tool_results },
                Dispatch::Errored { message, .. } => {
                    tracing::debug!(run_id = %dispatcher.run_id(), %message, "run errored");
                    return StreamEnd::Errored(message);
                }
            }

            // Time spent in a tool handler does not count as stream silence.
            if let (Some(sleep), Some(timeout)) = (idle.as_mut(), self.idle_timeout) {
                sleep.as_mut().reset(Instant::now() + timeout);
            }
        }
    }

    /// Append to the local transcript and the session. `false` once the
    /// chain has been superseded.
    fn append(
        &self,
        dispatcher: &EventDispatcher,
        transcript: &mut Vec<Message>,
        message: Message,
    ) -> bool {
        if !lock(&self.session).append(self.generation, message.clone()) {
            return false;
        }
        transcript.push(message.clone());
        dispatcher.emit(RunEventPayload::MessageAppended { message });
        true
    }
}

fn transport_failure(dispatcher: &EventDispatcher, message: String) -> StreamEnd {
    tracing::warn!(run_id = %dispatcher.run_id(), error = %message, "run stream failed");
    dispatcher.emit(RunEventPayload::RunErrored {
        message: message.clone(),
        code: None,
    });
    StreamEnd::Errored(message)
}

/// Resolves when the idle timer fires; never when it is disabled.
async fn idle_elapsed(sleep: &mut Option<Pin<Box<Sleep>>>) {
    match sleep {
        Some(sleep) => sleep.as_mut().await,
        None => std::future::pending().await,
    }
}

pub(crate) fn new_run_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
