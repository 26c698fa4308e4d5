//! Display translation — engine display payloads → MIME-keyed wire content.
//!
//! Pure mapping apart from the reference handoff, which parks the rich object
//! on the session's exchange bus and emits a retrieval script instead.
//!
//! Translation rules:
//!   Markup      → {"text/html": ..}
//!   Math        → {"text/latex": ..}
//!   Graphic     → {"image/svg+xml": ..}  (width/height forced to config)
//!   Handle      → {"application/javascript": pop-from-bus script}
//!   Multiple    → passed through unchanged
//!   Unsupported → None (diagnostic logged; message still goes out empty)

use serde_json::Value;

use crate::engine::DisplayPayload;
use crate::exchange::SessionContext;
use crate::types::{DisplayConfig, Result};

/// Translate a display payload into the `data` mapping of a `display_data`
/// message.
///
/// Returns `Ok(None)` for unsupported payload kinds: the caller still emits
/// the message, just without a `data` key, and no error escapes.
pub fn translate_display(
    payload: DisplayPayload,
    session: &SessionContext,
    config: &DisplayConfig,
) -> Result<Option<Value>> {
    match payload {
        DisplayPayload::Markup(markup) => Ok(Some(serde_json::json!({ "text/html": markup }))),

        DisplayPayload::Math(latex) => Ok(Some(serde_json::json!({ "text/latex": latex }))),

        DisplayPayload::Graphic(mut graphic) => {
            // The output area renders at a fixed size; whatever dimensions
            // the drawing carried are overridden.
            graphic.set_attribute("width", format!("{}px", config.graphic_width));
            graphic.set_attribute("height", format!("{}px", config.graphic_height));
            Ok(Some(
                serde_json::json!({ "image/svg+xml": graphic.to_markup() }),
            ))
        }

        DisplayPayload::Handle(object) => {
            // The object cannot survive JSON encoding, so it goes onto the
            // exchange bus and the message carries a script that pops it back
            // out by id and appends it into the output area.
            let id = session.push_object(object)?;
            let script = format!("element.append(window.exchangeBus.pop({id}));");
            Ok(Some(serde_json::json!({ "application/javascript": script })))
        }

        DisplayPayload::Multiple(bundle) => Ok(Some(Value::Object(bundle))),

        DisplayPayload::Unsupported { kind } => {
            tracing::error!(kind = %kind, "unrecognized display payload kind");
            Ok(None)
        }
    }
}
