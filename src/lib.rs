//! In-process kernel loopback.
//!
//! A protocol-emulation adapter that lets a notebook front-end keep speaking
//! its kernel-messaging socket protocol while execution happens in the same
//! process. The adapter presents the socket surface the client expects
//! (open/send/close/message callbacks, JSON envelopes) and bridges it to an
//! execution engine over channels:
//!
//! - [`socket::KernelSocket`] is the fake endpoint and message router.
//! - [`queue::EvalQueue`] serializes execute requests into single-flight FIFO
//!   dispatch.
//! - [`exchange`] parks rich, non-serializable display objects so a reference
//!   can cross the string-only wire.
//! - [`protocol`] holds the wire envelopes and the display-payload
//!   translation.
//! - [`engine`] defines the request/event vocabulary an engine speaks.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokio::sync::mpsc;
//!
//! use kernel_loopback::engine::LifecycleEvent;
//! use kernel_loopback::exchange::SessionContext;
//! use kernel_loopback::socket::{launch, KernelSocket};
//! use kernel_loopback::Config;
//!
//! # async fn demo() {
//! let (dispatch_tx, mut dispatch_rx) = mpsc::unbounded_channel();
//! let (event_tx, event_rx) = mpsc::unbounded_channel::<LifecycleEvent>();
//!
//! let session = Arc::new(SessionContext::new());
//! let socket = KernelSocket::new("kernel", session, dispatch_tx, &Config::default());
//! let handle = launch(socket, event_rx);
//!
//! // An engine task consumes dispatch_rx and reports back on event_tx;
//! // the client drives handle.send(..) with protocol JSON.
//! # let _ = (&mut dispatch_rx, event_tx, handle);
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod engine;
pub mod exchange;
pub mod observability;
pub mod protocol;
pub mod queue;
pub mod socket;
pub mod types;

pub use types::{Config, Error, Result};
