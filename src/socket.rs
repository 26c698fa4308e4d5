//! Protocol adapter — the fake connection endpoint.
//!
//! `KernelSocket` exposes the contract a kernel-messaging client expects from
//! a bidirectional socket (open/send/close/message callbacks) while routing
//! everything to an in-process execution engine. Inbound messages become
//! queued execution requests or synchronous introspection replies; engine
//! lifecycle events come back out as protocol messages through the message
//! callback.
//!
//! The connection is always logically up: there is no handshake beyond a
//! fixed open-signal delay, and no transport failure mode.

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::engine::{ExecRequest, LifecycleEvent};
use crate::exchange::SessionContext;
use crate::protocol::message::{msg_type, Channel, ExecuteRequestContent};
use crate::protocol::{translate_display, ExecutionState, Header, WireMessage};
use crate::queue::EvalQueue;
use crate::types::{Config, DisplayConfig, Error, Result, SocketConfig};

/// Connection state. `Open` from construction; `Closed` only via an explicit
/// `close()` call. No error state exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Open,
    Closed,
}

type OpenCallback = Box<dyn FnMut() + Send>;
type CloseCallback = Box<dyn FnMut() + Send>;
type ErrorCallback = Box<dyn FnMut(Error) + Send>;
type MessageCallback = Box<dyn FnMut(String) + Send>;

/// Fake socket endpoint speaking the kernel-messaging protocol.
///
/// Each callback slot holds exactly one observer; assigning again replaces
/// the previous one.
pub struct KernelSocket {
    target: String,
    ready_state: ReadyState,
    on_open: Option<OpenCallback>,
    on_close: Option<CloseCallback>,
    // Contract parity only: the loopback transport never fails, so this
    // slot is assignable but never invoked.
    #[allow(dead_code)]
    on_error: Option<ErrorCallback>,
    on_message: Option<MessageCallback>,
    queue: EvalQueue,
    session: Arc<SessionContext>,
    socket_config: SocketConfig,
    display_config: DisplayConfig,
    shutdown: CancellationToken,
}

impl KernelSocket {
    /// Create a socket for `target`, dispatching execution requests to the
    /// engine through `dispatch`.
    pub fn new(
        target: impl Into<String>,
        session: Arc<SessionContext>,
        dispatch: mpsc::UnboundedSender<ExecRequest>,
        config: &Config,
    ) -> Self {
        Self {
            target: target.into(),
            ready_state: ReadyState::Open,
            on_open: None,
            on_close: None,
            on_error: None,
            on_message: None,
            queue: EvalQueue::new(dispatch),
            session,
            socket_config: config.socket.clone(),
            display_config: config.display.clone(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    pub fn set_on_open(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_open = Some(Box::new(callback));
    }

    pub fn set_on_close(&mut self, callback: impl FnMut() + Send + 'static) {
        self.on_close = Some(Box::new(callback));
    }

    pub fn set_on_error(&mut self, callback: impl FnMut(Error) + Send + 'static) {
        self.on_error = Some(Box::new(callback));
    }

    pub fn set_on_message(&mut self, callback: impl FnMut(String) + Send + 'static) {
        self.on_message = Some(Box::new(callback));
    }

    /// Consume one inbound protocol message from the client.
    ///
    /// Parse failures propagate; they are not recovered here. Messages this
    /// endpoint has no business with (iopub traffic, unknown shell types) are
    /// silently ignored.
    pub fn send(&mut self, raw: &str) -> Result<()> {
        let message = WireMessage::from_json(raw)?;
        match message.channel {
            Channel::Shell => match message.header.msg_type.as_str() {
                msg_type::KERNEL_INFO_REQUEST => self.reply_kernel_info(message.header),
                msg_type::EXECUTE_REQUEST => {
                    let content: ExecuteRequestContent = serde_json::from_value(message.content)?;
                    self.queue.push(ExecRequest {
                        code: content.code,
                        parent_id: message.header.msg_id,
                    })
                }
                other => {
                    tracing::debug!(msg_type = %other, "ignoring unhandled shell message");
                    Ok(())
                }
            },
            // This endpoint never receives meaningful commands on iopub.
            Channel::Iopub => Ok(()),
        }
    }

    /// Translate one engine lifecycle event into outbound protocol traffic.
    ///
    /// Terminal events (completed/failed) also advance the evaluation queue.
    pub fn handle_lifecycle(&mut self, event: LifecycleEvent) -> Result<()> {
        match event {
            LifecycleEvent::Completed {
                execution_count,
                result,
                parent_id,
            } => {
                if let Some(data) = result {
                    self.emit(&WireMessage::execute_result(
                        execution_count,
                        data,
                        &parent_id,
                    ))?;
                }
                self.emit(&WireMessage::execute_reply(
                    Some(execution_count),
                    &parent_id,
                ))?;
                self.queue.advance()
            }

            LifecycleEvent::Failed {
                execution_count,
                parent_id,
            } => {
                self.emit(&WireMessage::execute_reply(execution_count, &parent_id))?;
                self.queue.advance()
            }

            LifecycleEvent::Output {
                stream,
                text,
                parent_id,
            } => self.emit(&WireMessage::stream(stream, &text, &parent_id)),

            LifecycleEvent::Display { payload, parent_id } => {
                let data = translate_display(payload, &self.session, &self.display_config)?;
                self.emit(&WireMessage::display_data(data, &parent_id))
            }
        }
    }

    /// Close the connection: fire the close callback (if assigned), enter
    /// `Closed`, and stop the driver tasks. Subsequent calls are no-ops.
    pub fn close(&mut self) {
        if self.ready_state == ReadyState::Closed {
            return;
        }
        if let Some(callback) = self.on_close.as_mut() {
            callback();
        }
        self.ready_state = ReadyState::Closed;
        self.shutdown.cancel();
    }

    /// Synchronous introspection exchange: busy, idle, then the reply, each
    /// parented to the inbound request header.
    fn reply_kernel_info(&mut self, inbound: Header) -> Result<()> {
        self.emit(&WireMessage::status(ExecutionState::Busy, inbound.clone()))?;
        self.emit(&WireMessage::status(ExecutionState::Idle, inbound.clone()))?;
        self.emit(&WireMessage::kernel_info_reply(inbound))
    }

    fn emit(&mut self, message: &WireMessage) -> Result<()> {
        let raw = message.to_json()?;
        match self.on_message.as_mut() {
            Some(callback) => callback(raw),
            None => {
                tracing::debug!(
                    msg_type = %message.header.msg_type,
                    "no message callback assigned; dropping outbound message"
                );
            }
        }
        Ok(())
    }

    fn fire_open(&mut self) {
        if self.ready_state != ReadyState::Open {
            return;
        }
        if let Some(callback) = self.on_open.as_mut() {
            callback();
        }
    }

    fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

impl fmt::Debug for KernelSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KernelSocket")
            .field("target", &self.target)
            .field("ready_state", &self.ready_state)
            .field("queue", &self.queue)
            .finish()
    }
}

/// Handle to a launched socket.
///
/// Lock the inner socket to assign callbacks; `send`/`close` are provided
/// directly for convenience.
#[derive(Clone)]
pub struct SocketHandle {
    socket: Arc<Mutex<KernelSocket>>,
}

impl SocketHandle {
    pub fn socket(&self) -> Arc<Mutex<KernelSocket>> {
        Arc::clone(&self.socket)
    }

    pub async fn send(&self, raw: &str) -> Result<()> {
        self.socket.lock().await.send(raw)
    }

    pub async fn close(&self) {
        self.socket.lock().await.close();
    }
}

impl fmt::Debug for SocketHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketHandle").finish_non_exhaustive()
    }
}

/// Spawn the driver tasks for a socket and hand back its handle.
///
/// Two tasks run until the socket closes or the engine side hangs up:
/// the open timer (fires the open callback once, after the configured
/// delay) and the lifecycle pump (feeds engine events into the adapter).
pub fn launch(
    socket: KernelSocket,
    mut events: mpsc::UnboundedReceiver<LifecycleEvent>,
) -> SocketHandle {
    let shutdown = socket.shutdown_token();
    let open_delay = socket.socket_config.open_delay;
    let socket = Arc::new(Mutex::new(socket));

    let timer_socket = Arc::clone(&socket);
    let timer_shutdown = shutdown.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = timer_shutdown.cancelled() => {}
            _ = tokio::time::sleep(open_delay) => {
                timer_socket.lock().await.fire_open();
            }
        }
    });

    let pump_socket = Arc::clone(&socket);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                // Checked first so an already-closed socket never processes
                // a late event.
                biased;
                _ = shutdown.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => {
                        if let Err(e) = pump_socket.lock().await.handle_lifecycle(event) {
                            tracing::warn!("lifecycle handling failed: {e}");
                        }
                    }
                    // Engine hung up; nothing more will arrive.
                    None => break,
                }
            }
        }
    });

    SocketHandle { socket }
}
