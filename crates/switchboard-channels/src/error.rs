use thiserror::Error;

/// Platform error strings that signal a temporary condition.
const TRANSIENT_API_ERRORS: &[&str] = &[
    "ratelimited",
    "rate_limited",
    "internal_error",
    "fatal_error",
    "service_unavailable",
    "request_timeout",
];

/// Errors that can occur while delivering outbound activities.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    /// The request never produced an HTTP response.
    #[error("transport error calling {method}: {reason}")]
    Transport { method: String, reason: String },

    /// An operation exceeded its allowed time budget.
    #[error("{method} timed out after {ms}ms")]
    Timeout { method: String, ms: u64 },

    /// HTTP 429 from the platform.
    #[error("{method} rate limited, retry after {retry_after_secs:?}s")]
    RateLimited {
        method: String,
        retry_after_secs: Option<u64>,
    },

    /// Non-success HTTP status.
    #[error("{method} failed with HTTP {status}: {body}")]
    Http {
        method: String,
        status: u16,
        body: String,
    },

    /// HTTP 200 with `"ok": false`. Carries the platform's error string.
    #[error("{method} rejected by platform: {error}")]
    Api { method: String, error: String },

    /// The response body could not be decoded.
    #[error("could not decode {method} response: {reason}")]
    Decode { method: String, reason: String },

    /// The activity or reference cannot be addressed. Never retried.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ChannelError {
    /// Whether retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ChannelError::Transport { .. }
            | ChannelError::Timeout { .. }
            | ChannelError::RateLimited { .. } => true,
            ChannelError::Http { status, .. } => *status >= 500,
            ChannelError::Api { error, .. } => TRANSIENT_API_ERRORS.contains(&error.as_str()),
            ChannelError::Decode { .. } | ChannelError::ConfigError(_) => false,
        }
    }

    /// Server-requested wait before the next attempt.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            ChannelError::RateLimited {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ChannelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        let api = |error: &str| ChannelError::Api {
            method: "chat.postMessage".into(),
            error: error.into(),
        };
        assert!(api("ratelimited").is_transient());
        assert!(!api("channel_not_found").is_transient());
        assert!(ChannelError::Http {
            method: "chat.update".into(),
            status: 503,
            body: String::new()
        }
        .is_transient());
        assert!(!ChannelError::Http {
            method: "chat.update".into(),
            status: 400,
            body: String::new()
        }
        .is_transient());
        assert!(!ChannelError::ConfigError("x".into()).is_transient());
    }
}
