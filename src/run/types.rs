//! Run outcome types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::Message;

/// How a run chain ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Finished,
    Errored,
    Canceled,
}

/// Final state of a `start()` call and every continuation it chained.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub thread_id: String,
    /// Id of the last run attempted in the chain.
    pub run_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Transcript as it stood when the chain ended.
    pub messages: Vec<Message>,
    pub continuations: usize,
    pub finished_at: DateTime<Utc>,
}

impl RunOutcome {
    pub(crate) fn new(
        status: RunStatus,
        thread_id: &str,
        run_id: &str,
        error: Option<String>,
        messages: Vec<Message>,
        continuations: usize,
    ) -> Self {
        Self {
            status,
            thread_id: thread_id.to_string(),
            run_id: run_id.to_string(),
            error,
            messages,
            continuations,
            finished_at: Utc::now(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == RunStatus::Finished
    }
}
