//! Streamed assistant text.

use super::ProtocolIssue;
use crate::types::{EventType, Message};

/// The assistant message currently being streamed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingTextState {
    pub message_id: String,
    pub partial_content: String,
}

/// Builds one assistant message at a time from start/content/end events.
#[derive(Debug, Default)]
pub struct TextAccumulator {
    open: Option<StreamingTextState>,
}

impl TextAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new message. A message left open is discarded and reported.
    pub fn start(&mut self, message_id: &str) -> Result<(), ProtocolIssue> {
        let previous = self.open.replace(StreamingTextState {
            message_id: message_id.to_string(),
            partial_content: String::new(),
        });
        match previous {
            Some(leftover) => Err(ProtocolIssue::TextMessageOverwritten {
                message_id: message_id.to_string(),
                open_id: leftover.message_id,
            }),
            None => Ok(()),
        }
    }

    /// Append a delta verbatim to the open message.
    pub fn push(&mut self, message_id: &str, delta: &str) -> Result<(), ProtocolIssue> {
        let open = self.open_for(message_id, EventType::TextMessageContent)?;
        open.partial_content.push_str(delta);
        Ok(())
    }

    /// Finalize the open message. `Ok(None)` when nothing is open.
    pub fn finish(&mut self, message_id: &str) -> Result<Option<Message>, ProtocolIssue> {
        let Some(open) = self.open.as_ref() else {
            return Ok(None);
        };
        if open.message_id != message_id {
            return Err(ProtocolIssue::TextMessageMismatch {
                message_id: message_id.to_string(),
                open_id: open.message_id.clone(),
                event: EventType::TextMessageEnd,
            });
        }
        Ok(self
            .open
            .take()
            .map(|state| Message::assistant(state.message_id, state.partial_content)))
    }

    /// The message currently streaming.
    pub fn current(&self) -> Option<&StreamingTextState> {
        self.open.as_ref()
    }

    /// Whether a message is open.
    pub fn is_streaming(&self) -> bool {
        self.open.is_some()
    }

    /// Drop any open message, returning it.
    pub fn reset(&mut self) -> Option<StreamingTextState> {
        self.open.take()
    }

    fn open_for(
        &mut self,
        message_id: &str,
        event: EventType,
    ) -> Result<&mut StreamingTextState, ProtocolIssue> {
        match self.open.as_mut() {
            None => Err(ProtocolIssue::TextMessageNotOpen {
                message_id: message_id.to_string(),
                event,
            }),
            Some(open) if open.message_id != message_id => Err(ProtocolIssue::TextMessageMismatch {
                message_id: message_id.to_string(),
                open_id: open.message_id.clone(),
                event,
            }),
            Some(open) => Ok(open),
        }
    }
}
