//! Kernel-messaging wire protocol.
//!
//! Message envelopes plus the display-payload translation that turns engine
//! lifecycle events into MIME-keyed wire content.

pub mod message;
pub mod translation;

pub use message::{Channel, ExecutionState, Header, WireMessage};
pub use translation::translate_display;
