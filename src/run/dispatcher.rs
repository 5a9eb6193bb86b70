//! Routes stream events to the accumulators and the caller.

use serde_json::Value;

use super::events::{RunEventEmitter, RunEventPayload, RunEventSink};
use crate::accumulator::{
    FinalizedToolCall, ProtocolIssue, ResolvedToolCall, TextAccumulator, ToolCallAccumulator,
};
use crate::types::{Event, Message};

/// What the run driver has to do after an event was routed.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Nothing beyond what the dispatcher already did.
    Continue,
    /// An assistant message was finalized and belongs in the transcript.
    MessageCompleted(Message),
    /// A tool call is ready to execute.
    ToolCallReady(ResolvedToolCall),
    /// A tool call ended with arguments that are not valid JSON.
    ToolCallMalformed {
        tool_call_id: String,
        tool_name: String,
        detail: String,
    },
    Finished { result: Option<Value> },
    Errored { message: String, code: Option<String> },
}

/// Consumes one run's events in arrival order.
pub struct EventDispatcher {
    thread_id: String,
    run_id: String,
    text: TextAccumulator,
    tool_calls: ToolCallAccumulator,
    emitter: RunEventEmitter,
}

impl EventDispatcher {
    pub fn new(
        thread_id: impl Into<String>,
        run_id: impl Into<String>,
        sink: Option<RunEventSink>,
    ) -> Self {
        Self::with_emitter(thread_id.into(), run_id.into(), RunEventEmitter::new(sink))
    }

    pub(crate) fn with_emitter(thread_id: String, run_id: String, emitter: RunEventEmitter) -> Self {
        Self {
            thread_id,
            run_id,
            text: TextAccumulator::new(),
            tool_calls: ToolCallAccumulator::new(),
            emitter,
        }
    }

    /// Run the dispatched events belong to.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Switch to a new run, discarding partial state of the previous one.
    pub fn begin_run(&mut self, run_id: &str) {
        if let Some(open) = self.text.reset() {
            tracing::debug!(message_id = %open.message_id, "discarding unfinished text message");
        }
        let abandoned = self.tool_calls.reset();
        if !abandoned.is_empty() {
            tracing::debug!(?abandoned, "discarding unfinished tool calls");
        }
        self.run_id = run_id.to_string();
    }

    pub fn text(&self) -> &TextAccumulator {
        &self.text
    }

    pub fn tool_calls(&self) -> &ToolCallAccumulator {
        &self.tool_calls
    }

    /// Route one event, returning the work the driver must do for it.
    pub fn dispatch(&mut self, event: Event) -> Dispatch {
        match event {
            Event::RunStarted { thread_id, run_id } => {
                if run_id != self.run_id || thread_id != self.thread_id {
                    tracing::debug!(
                        expected_run = %self.run_id,
                        received_run = %run_id,
                        received_thread = %thread_id,
                        "RUN_STARTED ids differ from request"
                    );
                }
                self.emit(RunEventPayload::RunStarted);
                Dispatch::Continue
            }
            Event::RunFinished { result, .. } => {
                if self.text.is_streaming() || self.tool_calls.pending_count() > 0 {
                    tracing::warn!(
                        run_id = %self.run_id,
                        pending_tool_calls = self.tool_calls.pending_count(),
                        "run finished with unfinished messages"
                    );
                }
                self.emit(RunEventPayload::RunFinished {
                    result: result.clone(),
                });
                Dispatch::Finished { result }
            }
            Event::RunError { message, code } => {
                self.emit(RunEventPayload::RunErrored {
                    message: message.clone(),
                    code: code.clone(),
                });
                Dispatch::Errored { message, code }
            }
            Event::StepStarted { step_name } => {
                self.emit(RunEventPayload::StepStarted { step_name });
                Dispatch::Continue
            }
            Event::StepFinished { step_name } => {
                self.emit(RunEventPayload::StepFinished { step_name });
                Dispatch::Continue
            }
            Event::TextMessageStart { message_id, .. } => {
                if let Err(issue) = self.text.start(&message_id) {
                    self.diagnostic(issue);
                }
                Dispatch::Continue
            }
            Event::TextMessageContent { message_id, delta } => {
                match self.text.push(&message_id, &delta) {
                    Ok(()) => self.emit(RunEventPayload::TextDelta { message_id, delta }),
                    Err(issue) => self.diagnostic(issue),
                }
                Dispatch::Continue
            }
            Event::TextMessageEnd { message_id } => match self.text.finish(&message_id) {
                Ok(Some(message)) => Dispatch::MessageCompleted(message),
                Ok(None) => {
                    tracing::debug!(%message_id, "TEXT_MESSAGE_END with no open message");
                    Dispatch::Continue
                }
                Err(issue) => {
                    self.diagnostic(issue);
                    Dispatch::Continue
                }
            },
            Event::ToolCallStart {
                tool_call_id,
                tool_call_name,
                ..
            } => {
                if let Err(issue) = self.tool_calls.start(&tool_call_id, &tool_call_name) {
                    self.diagnostic(issue);
                }
                self.emit(RunEventPayload::ToolCallStarted {
                    tool_call_id,
                    tool_name: tool_call_name,
                });
                Dispatch::Continue
            }
            Event::ToolCallArgs {
                tool_call_id,
                delta,
            } => {
                if let Err(issue) = self.tool_calls.append(&tool_call_id, &delta) {
                    self.diagnostic(issue);
                }
                Dispatch::Continue
            }
            Event::ToolCallEnd { tool_call_id } => match self.tool_calls.finish(&tool_call_id) {
                Ok(FinalizedToolCall::Ready(call)) => Dispatch::ToolCallReady(call),
                Ok(FinalizedToolCall::Malformed {
                    tool_call_id,
                    tool_name,
                    detail,
                    ..
                }) => Dispatch::ToolCallMalformed {
                    tool_call_id,
                    tool_name,
                    detail,
                },
                Err(issue) => {
                    self.diagnostic(issue);
                    Dispatch::Continue
                }
            },
            Event::Custom { name, value } => {
                self.emit(RunEventPayload::Custom { name, value });
                Dispatch::Continue
            }
            Event::Unrecognized { event_type, reason } => {
                self.diagnostic(ProtocolIssue::UnrecognizedEvent { event_type, reason });
                Dispatch::Continue
            }
        }
    }

    pub(crate) fn emit(&self, payload: RunEventPayload) {
        self.emitter.emit(&self.thread_id, &self.run_id, payload);
    }

    fn diagnostic(&self, issue: ProtocolIssue) {
        tracing::warn!(run_id = %self.run_id, %issue, "protocol inconsistency; event dropped");
        self.emit(RunEventPayload::Diagnostic {
            message: issue.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::events::RunEvent;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    fn capture() -> (RunEventSink, Arc<Mutex<Vec<RunEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let store = events.clone();
        let sink: RunEventSink = Arc::new(move |event| store.lock().unwrap().push(event));
        (sink, events)
    }

    fn payloads(events: &Arc<Mutex<Vec<RunEvent>>>) -> Vec<RunEventPayload> {
        events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.payload.clone())
            .collect()
    }

    #[test]
    fn text_events_produce_completed_message() {
        let (sink, events) = capture();
        let mut dispatcher = EventDispatcher::new("t", "r", Some(sink));

        dispatcher.dispatch(Event::TextMessageStart {
            message_id: "m1".into(),
            role: None,
        });
        dispatcher.dispatch(Event::TextMessageContent {
            message_id: "m1".into(),
            delta: "Hello ".into(),
        });
        dispatcher.dispatch(Event::TextMessageContent {
            message_id: "m1".into(),
            delta: "world".into(),
        });
        let outcome = dispatcher.dispatch(Event::TextMessageEnd {
            message_id: "m1".into(),
        });

        assert_eq!(
            outcome,
            Dispatch::MessageCompleted(Message::assistant("m1", "Hello world"))
        );
        let deltas = payloads(&events)
            .into_iter()
            .filter(|p| matches!(p, RunEventPayload::TextDelta { .. }))
            .count();
        assert_eq!(deltas, 2);
    }

    #[test]
    fn tool_call_end_yields_ready_call() {
        let mut dispatcher = EventDispatcher::new("t", "r", None);
        dispatcher.dispatch(Event::ToolCallStart {
            tool_call_id: "1".into(),
            tool_call_name: "search".into(),
            parent_message_id: None,
        });
        dispatcher.dispatch(Event::ToolCallArgs {
            tool_call_id: "1".into(),
            delta: "{\"q\":".into(),
        });
        dispatcher.dispatch(Event::ToolCallArgs {
            tool_call_id: "1".into(),
            delta: "\"x\"}".into(),
        });

        let outcome = dispatcher.dispatch(Event::ToolCallEnd {
            tool_call_id: "1".into(),
        });
        assert_eq!(
            outcome,
            Dispatch::ToolCallReady(ResolvedToolCall {
                tool_call_id: "1".into(),
                tool_name: "search".into(),
                arguments: json!({"q": "x"}),
            })
        );
    }

    #[test]
    fn unknown_tool_call_id_is_dropped_with_diagnostic() {
        let (sink, events) = capture();
        let mut dispatcher = EventDispatcher::new("t", "r", Some(sink));

        let args = dispatcher.dispatch(Event::ToolCallArgs {
            tool_call_id: "ghost".into(),
            delta: "{}".into(),
        });
        let end = dispatcher.dispatch(Event::ToolCallEnd {
            tool_call_id: "ghost".into(),
        });

        assert_eq!(args, Dispatch::Continue);
        assert_eq!(end, Dispatch::Continue);
        let diagnostics = payloads(&events)
            .into_iter()
            .filter(|p| matches!(p, RunEventPayload::Diagnostic { .. }))
            .count();
        assert_eq!(diagnostics, 2);
    }

    #[test]
    fn lifecycle_and_custom_events_pass_through() {
        let (sink, events) = capture();
        let mut dispatcher = EventDispatcher::new("t", "r", Some(sink));

        dispatcher.dispatch(Event::RunStarted {
            thread_id: "t".into(),
            run_id: "r".into(),
        });
        dispatcher.dispatch(Event::Custom {
            name: "sources".into(),
            value: json!([1]),
        });
        let finished = dispatcher.dispatch(Event::RunFinished {
            thread_id: "t".into(),
            run_id: "r".into(),
            result: None,
        });

        assert_eq!(finished, Dispatch::Finished { result: None });
        assert_eq!(
            payloads(&events),
            vec![
                RunEventPayload::RunStarted,
                RunEventPayload::Custom {
                    name: "sources".into(),
                    value: json!([1]),
                },
                RunEventPayload::RunFinished { result: None },
            ]
        );
        let seqs: Vec<u64> = events.lock().unwrap().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
    }

    #[test]
    fn run_error_is_terminal_and_reported() {
        let (sink, events) = capture();
        let mut dispatcher = EventDispatcher::new("t", "r", Some(sink));

        let outcome = dispatcher.dispatch(Event::RunError {
            message: "agent crashed".into(),
            code: Some("E1".into()),
        });

        assert_eq!(
            outcome,
            Dispatch::Errored {
                message: "agent crashed".into(),
                code: Some("E1".into()),
            }
        );
        assert_eq!(payloads(&events).len(), 1);
    }

    #[test]
    fn begin_run_discards_partial_state() {
        let mut dispatcher = EventDispatcher::new("t", "r1", None);
        dispatcher.dispatch(Event::TextMessageStart {
            message_id: "m1".into(),
            role: None,
        });
        dispatcher.dispatch(Event::ToolCallStart {
            tool_call_id: "1".into(),
            tool_call_name: "search".into(),
            parent_message_id: None,
        });

        dispatcher.begin_run("r2");

        assert_eq!(dispatcher.run_id(), "r2");
        assert!(!dispatcher.text().is_streaming());
        assert_eq!(dispatcher.tool_calls().pending_count(), 0);
    }
}
