//! Web API request and response bodies used for outbound delivery.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `chat.postMessage`
/// Wire: `{ "channel": "C1", "text": "hi", "thread_ts": "1700.1" }`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostMessage {
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Value>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub unfurl_links: bool,
}

/// `chat.postEphemeral`: visible to one user only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostEphemeral {
    pub channel: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Value>,
}

/// `chat.update`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateMessage {
    pub channel: String,
    pub ts: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Value>,
}

/// `chat.delete`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteMessage {
    pub channel: String,
    pub ts: String,
}

/// Body POSTed to an interaction's `response_url`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResponseUrlMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocks: Option<Value>,
    /// `"in_channel"` or `"ephemeral"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub replace_original: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub delete_original: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}

/// Common envelope of every Web API response.
/// Wire: `{ "ok": false, "error": "channel_not_found" }`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    /// Set by `chat.postEphemeral`.
    #[serde(default)]
    pub message_ts: Option<String>,
}

impl ApiResponse {
    /// Id of the message the call created or touched.
    pub fn message_id(&self) -> Option<&str> {
        self.ts.as_deref().or(self.message_ts.as_deref())
    }

    pub fn error_code(&self) -> &str {
        self.error.as_deref().unwrap_or("unknown_error")
    }
}
