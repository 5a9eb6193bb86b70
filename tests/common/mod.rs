//! Shared test helpers: event constructors, a capturing sink and tools.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use agui_client::error::ClientError;
use agui_client::run::{RunEvent, RunEventPayload, RunEventSink};
use agui_client::tools::{ToolParameters, ToolRegistry};
use agui_client::types::Event;

pub fn run_started(run_id: &str) -> Event {
    Event::RunStarted {
        thread_id: "thread".to_string(),
        run_id: run_id.to_string(),
    }
}

pub fn run_finished(run_id: &str) -> Event {
    Event::RunFinished {
        thread_id: "thread".to_string(),
        run_id: run_id.to_string(),
        result: None,
    }
}

pub fn run_error(message: &str) -> Event {
    Event::RunError {
        message: message.to_string(),
        code: None,
    }
}

pub fn text_start(id: &str) -> Event {
    Event::TextMessageStart {
        message_id: id.to_string(),
        role: None,
    }
}

pub fn text_content(id: &str, delta: &str) -> Event {
    Event::TextMessageContent {
        message_id: id.to_string(),
        delta: delta.to_string(),
    }
}

pub fn text_end(id: &str) -> Event {
    Event::TextMessageEnd {
        message_id: id.to_string(),
    }
}

pub fn tool_start(id: &str, name: &str) -> Event {
    Event::ToolCallStart {
        tool_call_id: id.to_string(),
        tool_call_name: name.to_string(),
        parent_message_id: None,
    }
}

pub fn tool_args(id: &str, delta: &str) -> Event {
    Event::ToolCallArgs {
        tool_call_id: id.to_string(),
        delta: delta.to_string(),
    }
}

pub fn tool_end(id: &str) -> Event {
    Event::ToolCallEnd {
        tool_call_id: id.to_string(),
    }
}

/// A complete run that only streams one assistant message.
pub fn text_run(message_id: &str, text: &str) -> Vec<Event> {
    vec![
        run_started("r"),
        text_start(message_id),
        text_content(message_id, text),
        text_end(message_id),
        run_finished("r"),
    ]
}

/// Records every notification the controller emits.
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<RunEvent>>>,
}

impl EventLog {
    pub fn sink(&self) -> RunEventSink {
        let events = self.events.clone();
        Arc::new(move |event| events.lock().unwrap().push(event))
    }

    pub fn events(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn payloads(&self) -> Vec<RunEventPayload> {
        self.events().into_iter().map(|e| e.payload).collect()
    }

    pub fn count(&self, pred: impl Fn(&RunEventPayload) -> bool) -> usize {
        self.payloads().iter().filter(|p| pred(p)).count()
    }
}

/// Registry with a recording `search` tool and a failing `broken` tool.
pub fn search_registry(calls: Arc<Mutex<Vec<Value>>>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register_fn(
        "search",
        "Search the index",
        ToolParameters::object().string("q", "Query", true).build(),
        move |args, _| {
            let calls = calls.clone();
            async move {
                calls.lock().unwrap().push(args.raw().clone());
                let q = args.get_str("q")?.to_string();
                Ok::<_, ClientError>(json!({ "hits": [q] }))
            }
        },
    );
    registry.register_fn(
        "broken",
        "Always fails",
        ToolParameters::empty(),
        |_, _| async { Err::<Value, _>(ClientError::tool("broken", "backend unavailable")) },
    );
    registry
}
