use switchboard_core::{Activity, ActivityType, ConversationReference, ResourceResponse};
use switchboard_protocol::api::{
    ApiResponse, DeleteMessage, PostEphemeral, PostMessage, ResponseUrlMessage, UpdateMessage,
};
use tracing::{debug, instrument};

use crate::api::ChatApi;
use crate::error::{ChannelError, Result};
use crate::retry::RetryPolicy;

/// Maps canonical activities onto platform API calls.
///
/// Posts and updates are retried under `retry`; deletes run exactly once.
pub struct DeliveryAdapter<A: ChatApi> {
    api: A,
    retry: RetryPolicy,
}

/// How an update or delete reaches its target message.
#[derive(Debug, PartialEq)]
enum Address<'a> {
    Message { channel: &'a str, ts: &'a str },
    ResponseUrl(&'a str),
}

/// Pick the address for `op`. The message id wins when both are known: it
/// does not expire, while a response handle is short-lived and limited in
/// uses. Interaction translation leaves the id unset for ephemeral messages,
/// which only the response handle can reach.
fn address<'a>(
    op: &str,
    channel: &'a str,
    ts: Option<&'a str>,
    response_url: Option<&'a str>,
) -> Result<Address<'a>> {
    let ts = ts.filter(|s| !s.is_empty());
    let response_url = response_url.filter(|s| !s.is_empty());
    match (ts, response_url) {
        (Some(ts), _) => Ok(Address::Message { channel, ts }),
        (None, Some(url)) => Ok(Address::ResponseUrl(url)),
        (None, None) => Err(ChannelError::ConfigError(format!(
            "{op} needs a message id or a response url, found neither"
        ))),
    }
}

/// Turn an `"ok": false` body into a typed error.
fn ensure_ok(method: &str, resp: ApiResponse) -> Result<ApiResponse> {
    if resp.ok {
        Ok(resp)
    } else {
        Err(ChannelError::Api {
            method: method.to_string(),
            error: resp.error_code().to_string(),
        })
    }
}

impl<A: ChatApi> DeliveryAdapter<A> {
    pub fn new(api: A, retry: RetryPolicy) -> Self {
        Self { api, retry }
    }

    /// Post each activity in order. Stops at the first failure.
    #[instrument(skip_all, fields(count = activities.len()))]
    pub async fn send(&self, activities: &[Activity]) -> Result<Vec<ResourceResponse>> {
        let mut responses = Vec::with_capacity(activities.len());
        for activity in activities {
            responses.push(self.send_one(activity).await?);
        }
        Ok(responses)
    }

    async fn send_one(&self, activity: &Activity) -> Result<ResourceResponse> {
        if activity.activity_type != ActivityType::Message {
            return Err(ChannelError::ConfigError(format!(
                "only message activities can be sent, got {}",
                activity.activity_type
            )));
        }

        let conversation = &activity.conversation;
        let options = activity.outbound_options().cloned().unwrap_or_default();

        let resp = match options.ephemeral_user {
            Some(user) => {
                let body = &PostEphemeral {
                    channel: conversation.channel().to_string(),
                    user,
                    text: activity.text.clone(),
                    thread_ts: conversation.thread_ts().map(String::from),
                    blocks: options.blocks,
                };
                let api = &self.api;
                self.retry
                    .run("chat.postEphemeral", || async move {
                        ensure_ok("chat.postEphemeral", api.post_ephemeral(body).await?)
                    })
                    .await?
            }
            None => {
                let body = &PostMessage {
                    channel: conversation.channel().to_string(),
                    text: activity.text.clone(),
                    thread_ts: conversation.thread_ts().map(String::from),
                    blocks: options.blocks,
                    unfurl_links: options.unfurl_links,
                };
                let api = &self.api;
                self.retry
                    .run("chat.postMessage", || async move {
                        ensure_ok("chat.postMessage", api.post_message(body).await?)
                    })
                    .await?
            }
        };

        let id = resp.message_id().unwrap_or_default().to_string();
        debug!(conversation = %conversation, id = %id, "activity sent");
        Ok(ResourceResponse {
            id,
            conversation: conversation.clone(),
        })
    }

    /// Replace the content of a previously sent message.
    #[instrument(skip_all, fields(conversation = %activity.conversation))]
    pub async fn update(&self, activity: &Activity) -> Result<ResourceResponse> {
        let conversation = &activity.conversation;
        let blocks = activity.outbound_options().and_then(|o| o.blocks.clone());
        let api = &self.api;

        match address(
            "update",
            conversation.channel(),
            activity.id.as_deref(),
            activity.response_url(),
        )? {
            Address::Message { channel, ts } => {
                let body = &UpdateMessage {
                    channel: channel.to_string(),
                    ts: ts.to_string(),
                    text: activity.text.clone(),
                    blocks,
                };
                let resp = self
                    .retry
                    .run("chat.update", || async move {
                        ensure_ok("chat.update", api.update_message(body).await?)
                    })
                    .await?;
                Ok(ResourceResponse {
                    id: resp.ts.unwrap_or_else(|| ts.to_string()),
                    conversation: conversation.clone(),
                })
            }
            Address::ResponseUrl(url) => {
                let body = &ResponseUrlMessage {
                    text: activity.text.clone(),
                    blocks,
                    replace_original: true,
                    ..ResponseUrlMessage::default()
                };
                self.retry
                    .run("response_url", || async move {
                        ensure_ok("response_url", api.post_response_url(url, body).await?)
                    })
                    .await?;
                // Response handles do not report a message id.
                Ok(ResourceResponse {
                    id: String::new(),
                    conversation: conversation.clone(),
                })
            }
        }
    }

    /// Delete the message a reference points at. Not retried.
    #[instrument(skip_all, fields(conversation = %reference.conversation))]
    pub async fn delete(&self, reference: &ConversationReference) -> Result<()> {
        match address(
            "delete",
            reference.conversation.channel(),
            reference.activity_id.as_deref(),
            reference.response_url.as_deref(),
        )? {
            Address::Message { channel, ts } => {
                let body = DeleteMessage {
                    channel: channel.to_string(),
                    ts: ts.to_string(),
                };
                ensure_ok("chat.delete", self.api.delete_message(&body).await?)?;
            }
            Address::ResponseUrl(url) => {
                let body = ResponseUrlMessage {
                    delete_original: true,
                    ..ResponseUrlMessage::default()
                };
                ensure_ok("response_url", self.api.post_response_url(url, &body).await?)?;
            }
        }
        Ok(())
    }
}
