//! Interactive-component payloads (buttons, menus, modals, shortcuts).
//!
//! These arrive form-encoded with the JSON document in the `payload` key.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    BlockActions,
    /// Legacy attachment buttons.
    InteractiveMessage,
    ViewSubmission,
    ViewClosed,
    MessageAction,
    Shortcut,
    BlockSuggestion,
    #[serde(other)]
    Unknown,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BlockActions => "block_actions",
            Self::InteractiveMessage => "interactive_message",
            Self::ViewSubmission => "view_submission",
            Self::ViewClosed => "view_closed",
            Self::MessageAction => "message_action",
            Self::Shortcut => "shortcut",
            Self::BlockSuggestion => "block_suggestion",
            Self::Unknown => "unknown",
        }
    }

    /// Modal lifecycle interactions.
    pub fn is_view(&self) -> bool {
        matches!(self, Self::ViewSubmission | Self::ViewClosed)
    }

    /// Clicks and selections on a posted message.
    pub fn is_message_action(&self) -> bool {
        matches!(self, Self::BlockActions | Self::InteractiveMessage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: String,
    pub domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: String,
    pub username: Option<String>,
    pub name: Option<String>,
    pub team_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRefObject {
    pub id: String,
    pub name: Option<String>,
}

/// Where the interacted-with element lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    #[serde(rename = "type")]
    pub container_type: Option<String>,
    pub channel_id: Option<String>,
    pub message_ts: Option<String>,
    pub thread_ts: Option<String>,
    #[serde(default)]
    pub is_ephemeral: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionMessage {
    pub ts: Option<String>,
    pub thread_ts: Option<String>,
    pub text: Option<String>,
    pub user: Option<String>,
    pub bot_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionAction {
    pub action_id: Option<String>,
    /// Legacy attachment action name.
    pub name: Option<String>,
    pub block_id: Option<String>,
    #[serde(rename = "type")]
    pub action_type: Option<String>,
    pub value: Option<String>,
    pub selected_option: Option<SelectedOption>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    pub action_ts: Option<String>,
}

impl InteractionAction {
    /// The value the user picked, across button and menu shapes.
    pub fn selected_value(&self) -> Option<&str> {
        self.value
            .as_deref()
            .or_else(|| self.selected_option.as_ref().map(|o| o.value.as_str()))
            .or_else(|| self.selected_options.first().map(|o| o.value.as_str()))
            .filter(|v| !v.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InteractionPayload {
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    pub team: Option<TeamRef>,
    pub user: Option<UserRef>,
    pub api_app_id: Option<String>,
    pub trigger_id: Option<String>,
    pub response_url: Option<String>,
    pub callback_id: Option<String>,
    pub action_ts: Option<String>,
    pub channel: Option<ChannelRefObject>,
    pub container: Option<Container>,
    pub message: Option<InteractionMessage>,
    /// Legacy attachment actions carry the message here.
    pub original_message: Option<InteractionMessage>,
    pub message_ts: Option<String>,
    #[serde(default)]
    pub actions: Vec<InteractionAction>,
    pub view: Option<Value>,
}

impl InteractionPayload {
    pub fn team_id(&self) -> Option<&str> {
        self.team
            .as_ref()
            .map(|t| t.id.as_str())
            .or_else(|| self.user.as_ref().and_then(|u| u.team_id.as_deref()))
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.channel
            .as_ref()
            .map(|c| c.id.as_str())
            .or_else(|| self.container.as_ref().and_then(|c| c.channel_id.as_deref()))
    }

    /// The message the interaction happened on, from either payload generation.
    pub fn source_message(&self) -> Option<&InteractionMessage> {
        self.message.as_ref().or(self.original_message.as_ref())
    }

    /// Thread the interacted message lives in.
    pub fn thread_ts(&self) -> Option<&str> {
        self.source_message()
            .and_then(|m| m.thread_ts.as_deref())
            .or_else(|| self.container.as_ref().and_then(|c| c.thread_ts.as_deref()))
    }

    /// The interaction happened on an ephemeral message, which has no
    /// addressable id and can only be changed through the response handle.
    pub fn is_ephemeral(&self) -> bool {
        self.container.as_ref().is_some_and(|c| c.is_ephemeral)
    }

    /// Id of the message the interaction happened on.
    pub fn message_ts(&self) -> Option<&str> {
        self.source_message()
            .and_then(|m| m.ts.as_deref())
            .or_else(|| self.container.as_ref().and_then(|c| c.message_ts.as_deref()))
            .or(self.message_ts.as_deref())
    }
}
