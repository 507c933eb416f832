//! `application/x-www-form-urlencoded` bodies: interactions and slash commands.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::command::SlashCommand;
use crate::error::{ProtocolError, Result};
use crate::interaction::InteractionPayload;

/// A decoded form body.
#[derive(Debug, Clone)]
pub enum InboundForm {
    /// `payload=<json>` from an interactive component.
    Interaction {
        payload: InteractionPayload,
        raw: Value,
    },
    /// `command=/x&text=...` from a slash command.
    Command { command: SlashCommand, raw: Value },
    /// Neither shape matched. Keeps the field names for logging.
    Unrecognized { keys: Vec<String> },
}

impl InboundForm {
    pub fn kind(&self) -> &'static str {
        match self {
            InboundForm::Interaction { .. } => "interaction",
            InboundForm::Command { .. } => "command",
            InboundForm::Unrecognized { .. } => "unrecognized",
        }
    }
}

pub fn decode_form(body: &[u8]) -> Result<InboundForm> {
    let mut fields = Map::new();
    for (key, value) in url::form_urlencoded::parse(body) {
        fields.insert(key.into_owned(), Value::String(value.into_owned()));
    }

    if let Some(payload) = fields.get("payload") {
        let text = payload
            .as_str()
            .ok_or(ProtocolError::MissingField("payload"))?;
        let raw: Value = serde_json::from_str(text)?;
        let payload = InteractionPayload::deserialize(&raw)?;
        return Ok(InboundForm::Interaction { payload, raw });
    }

    if fields.contains_key("command") {
        let raw = Value::Object(fields);
        let command: SlashCommand = serde_json::from_value(raw.clone())?;
        if command.command.is_empty() {
            return Err(ProtocolError::InvalidForm("empty command".into()));
        }
        return Ok(InboundForm::Command { command, raw });
    }

    let mut keys: Vec<String> = fields.keys().cloned().collect();
    keys.sort();
    Ok(InboundForm::Unrecognized { keys })
}
