//! Client for agent runs streamed over the AG-UI event protocol.
//!
//! A [`run::RunController`] opens one event stream per run, assembles
//! streamed assistant text and tool-call arguments, executes the requested
//! tools against a [`tools::ToolRegistry`], and continues the run with the
//! tool results until the agent finishes.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use agui_client::prelude::*;
//! use serde_json::json;
//!
//! # async fn example() -> agui_client::error::Result<()> {
//! let config = ClientConfig::from_env()?;
//! let source = Arc::new(HttpEventSource::new(&config)?);
//!
//! let mut tools = ToolRegistry::new();
//! tools.register_fn(
//!     "search",
//!     "Search the index",
//!     ToolParameters::object().string("q", "Query", true).build(),
//!     |args, _ctx| async move { Ok::<_, ClientError>(json!({ "hits": [args.get_str("q")?] })) },
//! );
//! let definitions = tools.definitions();
//!
//! let controller = RunController::new(source, tools).with_config(&config);
//! let handle = controller.start(
//!     Vec::new(),
//!     Some(Message::user("find x")),
//!     definitions,
//!     ContextPayload::default(),
//! );
//! let outcome = handle.wait().await;
//! println!("{:?}: {} messages", outcome.status, outcome.messages.len());
//! # Ok(())
//! # }
//! ```

pub mod accumulator;
pub mod config;
pub mod error;
pub mod prelude;
pub mod run;
pub mod tools;
pub mod transport;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
