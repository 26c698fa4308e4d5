//! Execution engine contract.
//!
//! The engine itself lives outside this crate: it is whatever interpreter the
//! host embeds to actually run submitted code. This module pins down the two
//! channel payloads the adapter exchanges with it — the dispatch signal going
//! in, and the lifecycle events coming back out.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A MIME-type-keyed bundle of representations, e.g.
/// `{"text/plain": "2", "text/html": "<b>2</b>"}`.
pub type MimeBundle = Map<String, Value>;

/// A single execution request: the code to run plus the protocol message id
/// it answers.
///
/// Created when an `execute_request` arrives, held by the evaluation queue,
/// and moved to the engine channel on dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    pub code: String,
    pub parent_id: String,
}

/// Output stream a piece of incremental text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamName {
    Stdout,
    Stderr,
}

/// Lifecycle event raised by the execution engine.
///
/// Each event carries the `parent_id` of the request it belongs to.
/// `Completed` and `Failed` are terminal (they advance the evaluation queue);
/// `Output` and `Display` may recur any number of times per request.
pub enum LifecycleEvent {
    /// The in-flight request finished successfully.
    Completed {
        execution_count: u32,
        /// Final result representations, if the code produced a value.
        result: Option<MimeBundle>,
        parent_id: String,
    },

    /// The in-flight request failed.
    ///
    /// No error detail is forwarded to the protocol client on purpose: the
    /// front-end only consumes the status transitions and the execution
    /// counter on the reply, and this crate reproduces that contract.
    Failed {
        execution_count: Option<u32>,
        parent_id: String,
    },

    /// A stream write (non-terminal).
    Output {
        stream: StreamName,
        text: String,
        parent_id: String,
    },

    /// A rich display emission (non-terminal).
    Display {
        payload: DisplayPayload,
        parent_id: String,
    },
}

impl fmt::Debug for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed {
                execution_count,
                result,
                parent_id,
            } => f
                .debug_struct("Completed")
                .field("execution_count", execution_count)
                .field("result", &result.is_some())
                .field("parent_id", parent_id)
                .finish(),
            Self::Failed {
                execution_count,
                parent_id,
            } => f
                .debug_struct("Failed")
                .field("execution_count", execution_count)
                .field("parent_id", parent_id)
                .finish(),
            Self::Output {
                stream,
                text,
                parent_id,
            } => f
                .debug_struct("Output")
                .field("stream", stream)
                .field("text", text)
                .field("parent_id", parent_id)
                .finish(),
            Self::Display { payload, parent_id } => f
                .debug_struct("Display")
                .field("payload", payload)
                .field("parent_id", parent_id)
                .finish(),
        }
    }
}

/// Display payload variants the engine can emit.
///
/// Closed set: the translation layer matches exhaustively, and anything the
/// engine tags outside the known kinds arrives as `Unsupported` rather than
/// falling through a string switch.
pub enum DisplayPayload {
    /// Plain markup, rendered as `text/html`.
    Markup(String),

    /// Symbolic/mathematical expression, rendered as `text/latex`.
    Math(String),

    /// Vector graphic (e.g. a turtle drawing), rendered as `image/svg+xml`
    /// with width/height forced to the configured fixed values.
    Graphic(VectorGraphic),

    /// Rich object unsuitable for string serialization (e.g. a plot canvas);
    /// handed off by reference through the exchange bus.
    Handle(Box<dyn Any + Send>),

    /// Pre-built multi-MIME bundle, passed through unchanged.
    Multiple(MimeBundle),

    /// Anything the engine tagged with a kind this crate does not know.
    Unsupported { kind: String },
}

impl fmt::Debug for DisplayPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Markup(s) => f.debug_tuple("Markup").field(s).finish(),
            Self::Math(s) => f.debug_tuple("Math").field(s).finish(),
            Self::Graphic(g) => f.debug_tuple("Graphic").field(g).finish(),
            Self::Handle(_) => f.write_str("Handle(..)"),
            Self::Multiple(bundle) => f.debug_tuple("Multiple").field(bundle).finish(),
            Self::Unsupported { kind } => {
                f.debug_struct("Unsupported").field("kind", kind).finish()
            }
        }
    }
}

/// Minimal model of a vector-graphic root element: a tag's attributes plus
/// its serialized inner content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorGraphic {
    attributes: BTreeMap<String, String>,
    body: String,
}

impl VectorGraphic {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            attributes: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(name, value);
        self
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Serialize to `<svg ...>body</svg>` markup.
    pub fn to_markup(&self) -> String {
        let mut out = String::from("<svg");
        for (name, value) in &self.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            out.push_str(&escape_attribute(value));
            out.push('"');
        }
        out.push('>');
        out.push_str(&self.body);
        out.push_str("</svg>");
        out
    }
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn graphic_markup_includes_attributes_and_body() {
        let graphic = VectorGraphic::new("<line x1=\"0\"/>")
            .with_attribute("width", "100px")
            .with_attribute("height", "50px");

        assert_eq!(
            graphic.to_markup(),
            "<svg height=\"50px\" width=\"100px\"><line x1=\"0\"/></svg>"
        );
    }

    #[test]
    fn set_attribute_overwrites() {
        let mut graphic = VectorGraphic::new("").with_attribute("width", "100px");
        graphic.set_attribute("width", "480px");
        assert_eq!(graphic.attribute("width"), Some("480px"));
    }

    #[test]
    fn attribute_values_are_escaped() {
        let graphic = VectorGraphic::new("").with_attribute("title", "a<b&\"c\"");
        assert_eq!(
            graphic.to_markup(),
            "<svg title=\"a&lt;b&amp;&quot;c&quot;\"></svg>"
        );
    }

    #[test]
    fn stream_names_serialize_lowercase() {
        assert_eq!(
            serde_json::to_string(&StreamName::Stdout).unwrap(),
            "\"stdout\""
        );
        assert_eq!(
            serde_json::to_string(&StreamName::Stderr).unwrap(),
            "\"stderr\""
        );
    }
}
