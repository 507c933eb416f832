use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use uuid::Uuid;

use crate::error::{Result, SwitchboardError};

/// Identifier for one inbound request/response cycle (UUIDv7, time-sortable
/// for log correlation).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(pub String);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque conversation address: `channel` or `channel:thread_ts`.
///
/// Platform timestamps look like `1700000000.000100` and channel ids are
/// alphanumeric, so `:` never appears inside either part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

const THREAD_SEPARATOR: char = ':';

impl ConversationId {
    pub fn new(channel: &str, thread_ts: Option<&str>) -> Self {
        match thread_ts.filter(|ts| !ts.is_empty()) {
            Some(ts) => Self(format!("{channel}{THREAD_SEPARATOR}{ts}")),
            None => Self(channel.to_string()),
        }
    }

    /// Parse and validate a stored id.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.splitn(2, THREAD_SEPARATOR);
        let channel = parts.next().unwrap_or_default();
        if channel.is_empty() {
            return Err(SwitchboardError::InvalidConversation(format!(
                "empty channel component: {s:?}"
            )));
        }
        match parts.next() {
            Some("") => Err(SwitchboardError::InvalidConversation(format!(
                "empty thread component: {s:?}"
            ))),
            Some(ts) if ts.contains(THREAD_SEPARATOR) => Err(
                SwitchboardError::InvalidConversation(format!("too many components: {s:?}")),
            ),
            _ => Ok(Self(s.to_string())),
        }
    }

    pub fn channel(&self) -> &str {
        self.0
            .split_once(THREAD_SEPARATOR)
            .map(|(channel, _)| channel)
            .unwrap_or(&self.0)
    }

    pub fn thread_ts(&self) -> Option<&str> {
        self.0.split_once(THREAD_SEPARATOR).map(|(_, ts)| ts)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Message,
    Event,
    InstallationUpdate,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Message => "message",
            ActivityType::Event => "event",
            ActivityType::InstallationUpdate => "installation_update",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user or bot participating in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

/// A file or rich attachment. Every field is optional: platform file objects
/// are open-ended and a partially populated attachment is still useful.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
}

/// Platform message options for an outbound activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutboundOptions {
    /// When set the message is posted ephemerally, visible to this user only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ephemeral_user: Option<String>,
    /// Response handle for interaction-originated updates and deletes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_url: Option<String>,
    /// Block Kit layout, passed through to the API untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<serde_json::Value>,
    #[serde(default)]
    pub unfurl_links: bool,
}

/// Adapter-specific escape hatch carried alongside an [`Activity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChannelData {
    /// Original wire payload captured at ingestion.
    Inbound {
        payload: serde_json::Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        response_url: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        trigger_id: Option<String>,
    },
    /// Options understood by the outbound delivery adapter.
    Outbound(OutboundOptions),
}

/// Canonical, transport-agnostic message consumed by all downstream code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Platform message id (`ts`) when the activity refers to a message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Event name for non-message activities (`"reaction_added"`, `"/deploy"`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub conversation: ConversationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<ChannelAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_data: Option<ChannelData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl Activity {
    /// Bare activity addressed to `conversation`.
    pub fn new(activity_type: ActivityType, conversation: ConversationId) -> Self {
        Self {
            activity_type,
            id: None,
            name: None,
            timestamp: None,
            conversation,
            from: None,
            recipient: None,
            team_id: None,
            text: None,
            attachments: Vec::new(),
            channel_data: None,
            value: None,
        }
    }

    /// Outbound text message.
    pub fn message(conversation: ConversationId, text: impl Into<String>) -> Self {
        let mut activity = Self::new(ActivityType::Message, conversation);
        activity.text = Some(text.into());
        activity
    }

    /// Outbound reply that lands in the same conversation (and thread).
    pub fn reply(&self, text: impl Into<String>) -> Self {
        let mut reply = Self::message(self.conversation.clone(), text);
        reply.team_id = self.team_id.clone();
        reply.recipient = self.from.clone();
        reply
    }

    pub fn text_or_empty(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Response handle from either inbound or outbound channel data.
    pub fn response_url(&self) -> Option<&str> {
        match &self.channel_data {
            Some(ChannelData::Inbound { response_url, .. }) => response_url.as_deref(),
            Some(ChannelData::Outbound(options)) => options.response_url.as_deref(),
            None => None,
        }
    }

    pub fn outbound_options(&self) -> Option<&OutboundOptions> {
        match &self.channel_data {
            Some(ChannelData::Outbound(options)) => Some(options),
            _ => None,
        }
    }

    /// Mutable outbound options, converting any other channel data.
    pub fn outbound_options_mut(&mut self) -> &mut OutboundOptions {
        if !matches!(self.channel_data, Some(ChannelData::Outbound(_))) {
            self.channel_data = Some(ChannelData::Outbound(OutboundOptions::default()));
        }
        match self.channel_data {
            Some(ChannelData::Outbound(ref mut options)) => options,
            _ => unreachable!("channel data was just set to outbound options"),
        }
    }

    /// Durable addressing for proactive sends, updates and deletes.
    pub fn conversation_reference(&self, service_url: &str) -> ConversationReference {
        ConversationReference {
            conversation: self.conversation.clone(),
            team_id: self.team_id.clone(),
            activity_id: self.id.clone(),
            user: self.from.clone(),
            service_url: service_url.to_string(),
            response_url: self.response_url().map(String::from),
        }
    }
}

/// Addressing information persisted by the business layer so a conversation
/// can be resumed outside the original request/response cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationReference {
    pub conversation: ConversationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    /// Message the reference points at, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activity_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ChannelAccount>,
    pub service_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_url: Option<String>,
}

impl ConversationReference {
    /// Rehydrate into an outbound activity addressed at the same destination.
    pub fn continuation_activity(&self) -> Activity {
        let mut activity = Activity::new(ActivityType::Message, self.conversation.clone());
        activity.id = self.activity_id.clone();
        activity.team_id = self.team_id.clone();
        activity.recipient = self.user.clone();
        if let Some(url) = &self.response_url {
            activity.outbound_options_mut().response_url = Some(url.clone());
        }
        activity
    }
}

/// What the platform returned for a delivered activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceResponse {
    /// Platform message id. Empty for response-handle deliveries, which do
    /// not report one.
    pub id: String,
    pub conversation: ConversationId,
}

/// Request-scoped flags threaded through one ingestion-to-response cycle.
///
/// Never shared across requests; dropped when the turn completes.
#[derive(Debug, Clone, Default)]
pub struct TurnState {
    /// Verbose diagnostics requested for this turn.
    pub debug: bool,
    /// Elapsed-time reporting requested for this turn.
    pub timing: bool,
    pub started_at: Option<Instant>,
    /// Custom bot instance selected by the inbound request.
    pub integration_id: Option<String>,
    pub retry_num: Option<u32>,
    pub retry_reason: Option<String>,
}
