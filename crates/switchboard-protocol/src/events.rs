//! Event bodies embedded in an `event_callback` envelope.
//!
//! The platform sends many event kinds through one field, discriminated by
//! `type`. Known kinds decode into typed variants; anything else is kept as
//! [`EventBody::Other`] with its raw property bag so a new event kind never
//! fails a delivery.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A message posted to a channel, DM or thread.
///
/// `extra` keeps every field without a dedicated slot (e.g. `files`,
/// `blocks`, `bot_profile`) so adapters can read them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MessageEvent {
    pub channel: Option<String>,
    pub channel_type: Option<String>,
    pub user: Option<String>,
    pub bot_id: Option<String>,
    pub subtype: Option<String>,
    pub text: Option<String>,
    pub ts: Option<String>,
    pub thread_ts: Option<String>,
    pub event_ts: Option<String>,
    pub team: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageEvent {
    /// File objects attached to the message, if any.
    pub fn files(&self) -> &[Value] {
        self.extra
            .get("files")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// The item a reaction was added to or removed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionItem {
    #[serde(rename = "type")]
    pub item_type: String,
    pub channel: Option<String>,
    pub ts: Option<String>,
    pub file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub user: Option<String>,
    pub reaction: String,
    pub item_user: Option<String>,
    pub item: ReactionItem,
    pub event_ts: Option<String>,
}

/// `channel` is a bare id for archive/delete events and an object for
/// create/rename events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChannelRef {
    Id(String),
    Info(ChannelInfo),
}

impl ChannelRef {
    pub fn id(&self) -> &str {
        match self {
            ChannelRef::Id(id) => id,
            ChannelRef::Info(info) => &info.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ChannelRef::Id(_) => None,
            ChannelRef::Info(info) => info.name.as_deref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: String,
    pub name: Option<String>,
    pub created: Option<i64>,
    pub creator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEvent {
    pub channel: ChannelRef,
    pub user: Option<String>,
    pub event_ts: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLifecycleKind {
    Created,
    Renamed,
    Deleted,
    Archived,
    Unarchived,
}

impl ChannelLifecycleKind {
    fn from_type(event_type: &str) -> Option<Self> {
        match event_type {
            "channel_created" => Some(Self::Created),
            "channel_rename" => Some(Self::Renamed),
            "channel_deleted" => Some(Self::Deleted),
            "channel_archive" => Some(Self::Archived),
            "channel_unarchive" => Some(Self::Unarchived),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "channel_created",
            Self::Renamed => "channel_rename",
            Self::Deleted => "channel_deleted",
            Self::Archived => "channel_archive",
            Self::Unarchived => "channel_unarchive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberEvent {
    pub user: String,
    pub channel: String,
    pub channel_type: Option<String>,
    pub team: Option<String>,
    pub inviter: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppLifecycleKind {
    Installed,
    Uninstalled,
    TokensRevoked,
}

impl AppLifecycleKind {
    fn from_type(event_type: &str) -> Option<Self> {
        match event_type {
            "app_installed" => Some(Self::Installed),
            "app_uninstalled" => Some(Self::Uninstalled),
            "tokens_revoked" => Some(Self::TokensRevoked),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Installed => "app_installed",
            Self::Uninstalled => "app_uninstalled",
            Self::TokensRevoked => "tokens_revoked",
        }
    }
}

/// Tagged union over every event sub-kind the adapter understands.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum EventBody {
    Message(MessageEvent),
    AppMention(MessageEvent),
    Reaction {
        added: bool,
        event: ReactionEvent,
    },
    ChannelLifecycle {
        kind: ChannelLifecycleKind,
        event: ChannelEvent,
    },
    Membership {
        joined: bool,
        event: MemberEvent,
    },
    AppLifecycle {
        kind: AppLifecycleKind,
        fields: Map<String, Value>,
    },
    /// Event kind without a dedicated variant.
    Other {
        event_type: String,
        fields: Map<String, Value>,
    },
}

impl EventBody {
    /// Wire name of the event kind (`"message"`, `"reaction_added"`, …).
    pub fn event_type(&self) -> &str {
        match self {
            EventBody::Message(_) => "message",
            EventBody::AppMention(_) => "app_mention",
            EventBody::Reaction { added: true, .. } => "reaction_added",
            EventBody::Reaction { added: false, .. } => "reaction_removed",
            EventBody::ChannelLifecycle { kind, .. } => kind.as_str(),
            EventBody::Membership { joined: true, .. } => "member_joined_channel",
            EventBody::Membership { joined: false, .. } => "member_left_channel",
            EventBody::AppLifecycle { kind, .. } => kind.as_str(),
            EventBody::Other { event_type, .. } => event_type,
        }
    }

    /// The message payload for message-shaped kinds.
    pub fn as_message(&self) -> Option<&MessageEvent> {
        match self {
            EventBody::Message(message) | EventBody::AppMention(message) => Some(message),
            _ => None,
        }
    }
}

impl TryFrom<Value> for EventBody {
    type Error = serde_json::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        use serde::de::Error as _;

        let event_type = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| serde_json::Error::missing_field("type"))?
            .to_string();

        let body = match event_type.as_str() {
            "message" => EventBody::Message(serde_json::from_value(value)?),
            "app_mention" => EventBody::AppMention(serde_json::from_value(value)?),
            "reaction_added" | "reaction_removed" => EventBody::Reaction {
                added: event_type == "reaction_added",
                event: serde_json::from_value(value)?,
            },
            "member_joined_channel" | "member_left_channel" => EventBody::Membership {
                joined: event_type == "member_joined_channel",
                event: serde_json::from_value(value)?,
            },
            other => {
                if let Some(kind) = ChannelLifecycleKind::from_type(other) {
                    EventBody::ChannelLifecycle {
                        kind,
                        event: serde_json::from_value(value)?,
                    }
                } else {
                    let fields = match value {
                        Value::Object(map) => map,
                        _ => return Err(serde_json::Error::custom("event body must be an object")),
                    };
                    match AppLifecycleKind::from_type(other) {
                        Some(kind) => EventBody::AppLifecycle { kind, fields },
                        None => EventBody::Other { event_type, fields },
                    }
                }
            }
        };

        Ok(body)
    }
}
