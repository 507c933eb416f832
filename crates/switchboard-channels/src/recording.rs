//! In-process [`ChatApi`] that records calls instead of sending them.
//!
//! Used when no bot token is configured (dry run) and by tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use switchboard_protocol::api::{
    ApiResponse, DeleteMessage, PostEphemeral, PostMessage, ResponseUrlMessage, UpdateMessage,
};
use tracing::info;

use crate::api::ChatApi;
use crate::error::{ChannelError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Post(PostMessage),
    Ephemeral(PostEphemeral),
    Update(UpdateMessage),
    Delete(DeleteMessage),
    ResponseUrl {
        url: String,
        body: ResponseUrlMessage,
    },
}

/// A scripted outcome for the next call.
#[derive(Debug, Clone)]
pub enum Scripted {
    Fail(ChannelError),
    /// `"ok": false` with this platform error string.
    Reject(String),
}

#[derive(Default)]
pub struct RecordingChatApi {
    calls: Mutex<Vec<RecordedCall>>,
    script: Mutex<VecDeque<Scripted>>,
    next_ts: AtomicU64,
}

impl RecordingChatApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an outcome consumed by the next call, in order.
    pub fn push(&self, outcome: Scripted) {
        lock(&self.script).push_back(outcome);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Text of every posted message, in order.
    pub fn posted_texts(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|call| match call {
                RecordedCall::Post(p) => p.text.clone(),
                RecordedCall::Ephemeral(p) => p.text.clone(),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RecordedCall, channel: Option<&str>) -> Result<ApiResponse> {
        info!(call = ?call, "dry-run delivery");
        lock(&self.calls).push(call);

        match lock(&self.script).pop_front() {
            Some(Scripted::Fail(e)) => Err(e),
            Some(Scripted::Reject(error)) => Ok(ApiResponse {
                ok: false,
                error: Some(error),
                ..ApiResponse::default()
            }),
            None => {
                let n = self.next_ts.fetch_add(1, Ordering::SeqCst) + 1;
                Ok(ApiResponse {
                    ok: true,
                    ts: Some(format!("1700000000.{n:06}")),
                    channel: channel.map(String::from),
                    ..ApiResponse::default()
                })
            }
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl ChatApi for RecordingChatApi {
    async fn post_message(&self, body: &PostMessage) -> Result<ApiResponse> {
        self.record(RecordedCall::Post(body.clone()), Some(&body.channel))
    }

    async fn post_ephemeral(&self, body: &PostEphemeral) -> Result<ApiResponse> {
        // postEphemeral reports `message_ts`, not `ts`.
        let mut resp = self.record(RecordedCall::Ephemeral(body.clone()), Some(&body.channel))?;
        resp.message_ts = resp.ts.take();
        Ok(resp)
    }

    async fn update_message(&self, body: &UpdateMessage) -> Result<ApiResponse> {
        let mut resp = self.record(RecordedCall::Update(body.clone()), Some(&body.channel))?;
        if resp.ok {
            resp.ts = Some(body.ts.clone());
        }
        Ok(resp)
    }

    async fn delete_message(&self, body: &DeleteMessage) -> Result<ApiResponse> {
        self.record(RecordedCall::Delete(body.clone()), Some(&body.channel))
    }

    async fn post_response_url(&self, url: &str, body: &ResponseUrlMessage) -> Result<ApiResponse> {
        let mut resp = self.record(
            RecordedCall::ResponseUrl {
                url: url.to_string(),
                body: body.clone(),
            },
            None,
        )?;
        resp.ts = None;
        Ok(resp)
    }
}
