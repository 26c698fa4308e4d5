//! Wire protocol messages.
//!
//! JSON-encoded kernel-messaging envelopes. Only the subset of the protocol a
//! front-end built against it actually consumes is implemented; identity and
//! metadata fields other than `msg_id`/`msg_type` are emitted as empty
//! placeholders.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::engine::{MimeBundle, StreamName};
use crate::types::Result;

/// Message type strings used on the wire.
pub mod msg_type {
    pub const STATUS: &str = "status";
    pub const KERNEL_INFO_REQUEST: &str = "kernel_info_request";
    pub const KERNEL_INFO_REPLY: &str = "kernel_info_reply";
    pub const EXECUTE_REQUEST: &str = "execute_request";
    pub const EXECUTE_REPLY: &str = "execute_reply";
    pub const EXECUTE_RESULT: &str = "execute_result";
    pub const STREAM: &str = "stream";
    pub const DISPLAY_DATA: &str = "display_data";
}

/// Logical channel a message travels on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Request/reply channel.
    Shell,
    /// Broadcast output channel.
    Iopub,
}

/// Kernel execution state reported on the iopub channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionState {
    Busy,
    Idle,
}

/// Message header. Everything but `msg_id` and `msg_type` stays empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    #[serde(default)]
    pub msg_id: String,
    #[serde(default)]
    pub msg_type: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub session: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub version: String,
}

impl Header {
    /// Header for an outbound message: type set, identity fields empty.
    pub fn of_type(msg_type: &str) -> Self {
        Self {
            msg_type: msg_type.to_string(),
            ..Self::default()
        }
    }

    /// Parent reference carrying only the originating message id.
    pub fn parent(msg_id: &str) -> Self {
        Self {
            msg_id: msg_id.to_string(),
            ..Self::default()
        }
    }
}

/// One protocol message. Constructed per emission, never mutated after send.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub header: Header,
    #[serde(default)]
    pub parent_header: Header,
    #[serde(default = "empty_object")]
    pub metadata: Value,
    #[serde(default = "empty_object")]
    pub content: Value,
    #[serde(default)]
    pub buffers: Vec<Value>,
    pub channel: Channel,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl WireMessage {
    fn emit(channel: Channel, msg_type: &str, parent: Header, content: Value) -> Self {
        Self {
            header: Header::of_type(msg_type),
            parent_header: parent,
            metadata: empty_object(),
            content,
            buffers: Vec::new(),
            channel,
        }
    }

    /// Busy/idle status notification (iopub).
    pub fn status(state: ExecutionState, parent: Header) -> Self {
        Self::emit(
            Channel::Iopub,
            msg_type::STATUS,
            parent,
            serde_json::json!({ "execution_state": state }),
        )
    }

    /// Introspection reply with ok status (shell).
    pub fn kernel_info_reply(parent: Header) -> Self {
        Self::emit(
            Channel::Shell,
            msg_type::KERNEL_INFO_REPLY,
            parent,
            serde_json::json!({ "status": "ok" }),
        )
    }

    /// Final result representations of an execution (iopub).
    pub fn execute_result(execution_count: u32, data: MimeBundle, parent_id: &str) -> Self {
        Self::emit(
            Channel::Iopub,
            msg_type::EXECUTE_RESULT,
            Header::parent(parent_id),
            serde_json::json!({
                "execution_count": execution_count,
                "data": data,
                "metadata": {},
            }),
        )
    }

    /// Terminal reply to an execute request (shell).
    ///
    /// The counter is omitted when the engine did not supply one (failure
    /// without an assigned count).
    pub fn execute_reply(execution_count: Option<u32>, parent_id: &str) -> Self {
        let mut content = Map::new();
        if let Some(count) = execution_count {
            content.insert("execution_count".to_string(), count.into());
        }
        content.insert("metadata".to_string(), empty_object());
        Self::emit(
            Channel::Shell,
            msg_type::EXECUTE_REPLY,
            Header::parent(parent_id),
            Value::Object(content),
        )
    }

    /// Incremental stream write (iopub).
    pub fn stream(stream: StreamName, text: &str, parent_id: &str) -> Self {
        Self::emit(
            Channel::Iopub,
            msg_type::STREAM,
            Header::parent(parent_id),
            serde_json::json!({ "name": stream, "text": text }),
        )
    }

    /// Rich display emission (iopub). `data` is absent for payloads the
    /// translation layer could not map.
    pub fn display_data(data: Option<Value>, parent_id: &str) -> Self {
        let mut content = Map::new();
        if let Some(data) = data {
            content.insert("data".to_string(), data);
        }
        content.insert("metadata".to_string(), empty_object());
        content.insert("transient".to_string(), empty_object());
        Self::emit(
            Channel::Iopub,
            msg_type::DISPLAY_DATA,
            Header::parent(parent_id),
            Value::Object(content),
        )
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Content body of an inbound `execute_request`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteRequestContent {
    pub code: String,
}
