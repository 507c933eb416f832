use std::sync::Arc;

use async_trait::async_trait;
use switchboard_protocol::api::{
    ApiResponse, DeleteMessage, PostEphemeral, PostMessage, ResponseUrlMessage, UpdateMessage,
};

use crate::error::Result;

/// The chat platform's message API.
///
/// Implementations return the platform's response as-is, including
/// `"ok": false` bodies; interpreting them is the delivery adapter's job.
/// Transport-level failures (no response, timeout, HTTP status) are errors.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn post_message(&self, body: &PostMessage) -> Result<ApiResponse>;

    async fn post_ephemeral(&self, body: &PostEphemeral) -> Result<ApiResponse>;

    async fn update_message(&self, body: &UpdateMessage) -> Result<ApiResponse>;

    async fn delete_message(&self, body: &DeleteMessage) -> Result<ApiResponse>;

    /// POST to an interaction's response handle.
    async fn post_response_url(&self, url: &str, body: &ResponseUrlMessage) -> Result<ApiResponse>;
}

#[async_trait]
impl<T: ChatApi + ?Sized> ChatApi for Arc<T> {
    async fn post_message(&self, body: &PostMessage) -> Result<ApiResponse> {
        (**self).post_message(body).await
    }

    async fn post_ephemeral(&self, body: &PostEphemeral) -> Result<ApiResponse> {
        (**self).post_ephemeral(body).await
    }

    async fn update_message(&self, body: &UpdateMessage) -> Result<ApiResponse> {
        (**self).update_message(body).await
    }

    async fn delete_message(&self, body: &DeleteMessage) -> Result<ApiResponse> {
        (**self).delete_message(body).await
    }

    async fn post_response_url(&self, url: &str, body: &ResponseUrlMessage) -> Result<ApiResponse> {
        (**self).post_response_url(url, body).await
    }
}
