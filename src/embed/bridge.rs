// Accessbar cross-frame bridge
// Inbound `{ type, payload }` messages from an embedding frame and the outbound readiness notice.

use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::types::config::EmbedOptions;
use crate::types::errors::EmbedError;

/// A recognized inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbedMessage {
    Init(EmbedOptions),
    SetFontSize(f64),
    SetFontStyle(String),
    SetTextAlign(String),
    ToggleHighContrast(bool),
}

impl EmbedMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            EmbedMessage::Init(_) => "init",
            EmbedMessage::SetFontSize(_) => "setFontSize",
            EmbedMessage::SetFontStyle(_) => "setFontStyle",
            EmbedMessage::SetTextAlign(_) => "setTextAlign",
            EmbedMessage::ToggleHighContrast(_) => "toggleHighContrast",
        }
    }
}

/// Messages the widget posts to its parent frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum OutboundMessage {
    EmbedReady,
}

impl OutboundMessage {
    pub fn to_json(&self) -> Value {
        match self {
            OutboundMessage::EmbedReady => serde_json::json!({ "type": "embed-ready" }),
        }
    }
}

/// Receiver of messages posted to the embedding frame.
pub trait ParentFrame {
    fn post_message(&mut self, message: &Value);
}

impl ParentFrame for Sender<Value> {
    fn post_message(&mut self, message: &Value) {
        if self.send(message.clone()).is_err() {
            debug!("parent frame went away");
        }
    }
}

impl ParentFrame for Vec<Value> {
    fn post_message(&mut self, message: &Value) {
        self.push(message.clone());
    }
}

fn payload<T: serde::de::DeserializeOwned>(kind: &str, value: Value) -> Result<T, EmbedError> {
    serde_json::from_value(value).map_err(|e| EmbedError::InvalidPayload(format!("{}: {}", kind, e)))
}

/// Decodes a message. Unknown types yield `Ok(None)`; they may belong to someone else.
pub fn parse_message(message: &Value) -> Result<Option<EmbedMessage>, EmbedError> {
    let object = message
        .as_object()
        .ok_or_else(|| EmbedError::MalformedMessage("expected an object".to_string()))?;
    let Some(kind) = object.get("type").and_then(Value::as_str) else {
        return Err(EmbedError::MalformedMessage("missing string `type`".to_string()));
    };
    let body = object.get("payload").cloned().unwrap_or(Value::Null);
    let parsed = match kind {
        "init" => {
            let options = if body.is_null() { EmbedOptions::default() } else { payload(kind, body)? };
            EmbedMessage::Init(options)
        }
        "setFontSize" => EmbedMessage::SetFontSize(payload(kind, body)?),
        "setFontStyle" => EmbedMessage::SetFontStyle(payload(kind, body)?),
        "setTextAlign" => EmbedMessage::SetTextAlign(payload(kind, body)?),
        "toggleHighContrast" => EmbedMessage::ToggleHighContrast(payload(kind, body)?),
        other => {
            debug!(kind = other, "ignoring unrecognized message");
            return Ok(None);
        }
    };
    Ok(Some(parsed))
}
