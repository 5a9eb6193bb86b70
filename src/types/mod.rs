//! Wire and transcript types.

pub mod event;
pub mod message;
pub mod request;

pub use event::*;
pub use message::*;
pub use request::*;
