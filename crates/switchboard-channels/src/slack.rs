//! reqwest-backed Slack Web API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use switchboard_core::config::SlackConfig;
use switchboard_protocol::api::{
    ApiResponse, DeleteMessage, PostEphemeral, PostMessage, ResponseUrlMessage, UpdateMessage,
};
use tracing::debug;

use crate::api::ChatApi;
use crate::error::{ChannelError, Result};

/// Longest error body kept in an error message.
const MAX_ERROR_BODY: usize = 512;

pub struct SlackWebClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: String,
    timeout_ms: u64,
}

impl SlackWebClient {
    pub fn new(config: &SlackConfig) -> Result<Self> {
        let timeout_ms = config.request_timeout_ms.max(1);
        let http = reqwest::Client::builder()
            .user_agent(concat!("switchboard/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|e| ChannelError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.trim().to_string(),
            timeout_ms,
        })
    }

    async fn call<B: Serialize + ?Sized>(&self, method: &str, body: &B) -> Result<ApiResponse> {
        let url = format!("{}/{method}", self.api_base);
        debug!(method, "calling web api");
        let request = self
            .http
            .post(&url)
            .bearer_auth(&self.bot_token)
            .json(body);
        self.execute(method, request).await
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let resp = request.send().await.map_err(|e| self.transport_error(method, e))?;

        let status = resp.status().as_u16();
        if status == 429 {
            let retry_after_secs = resp
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(ChannelError::RateLimited {
                method: method.to_string(),
                retry_after_secs,
            });
        }

        if !resp.status().is_success() {
            let mut body = resp.text().await.unwrap_or_default();
            truncate_utf8(&mut body, MAX_ERROR_BODY);
            return Err(ChannelError::Http {
                method: method.to_string(),
                status,
                body,
            });
        }

        resp.json().await.map_err(|e| ChannelError::Decode {
            method: method.to_string(),
            reason: e.to_string(),
        })
    }

    fn transport_error(&self, method: &str, e: reqwest::Error) -> ChannelError {
        if e.is_timeout() {
            ChannelError::Timeout {
                method: method.to_string(),
                ms: self.timeout_ms,
            }
        } else {
            ChannelError::Transport {
                method: method.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl ChatApi for SlackWebClient {
    async fn post_message(&self, body: &PostMessage) -> Result<ApiResponse> {
        self.call("chat.postMessage", body).await
    }

    async fn post_ephemeral(&self, body: &PostEphemeral) -> Result<ApiResponse> {
        self.call("chat.postEphemeral", body).await
    }

    async fn update_message(&self, body: &UpdateMessage) -> Result<ApiResponse> {
        self.call("chat.update", body).await
    }

    async fn delete_message(&self, body: &DeleteMessage) -> Result<ApiResponse> {
        self.call("chat.delete", body).await
    }

    async fn post_response_url(&self, url: &str, body: &ResponseUrlMessage) -> Result<ApiResponse> {
        const METHOD: &str = "response_url";
        // Response handles are pre-authorised; no bearer token.
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(METHOD, e))?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            let mut body = text;
            truncate_utf8(&mut body, MAX_ERROR_BODY);
            return Err(ChannelError::Http {
                method: METHOD.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        // Some handles answer with a bare `ok` instead of JSON.
        Ok(serde_json::from_str(&text).unwrap_or(ApiResponse {
            ok: true,
            ..ApiResponse::default()
        }))
    }
}

fn truncate_utf8(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}
