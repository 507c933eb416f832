use async_trait::async_trait;
use switchboard_channels::{ChatApi, DeliveryAdapter};
use switchboard_core::{Activity, ConversationReference, ResourceResponse};
use tracing::error;

use crate::context::TurnContext;
use crate::error::{PipelineError, Result};
use crate::stage::ActivitySink;

/// Innermost link of every chain: performs the network calls.
///
/// Delivery failures are logged here, where the turn, conversation and
/// payload size are all known, then returned to the caller.
pub struct DeliverySink<A: ChatApi> {
    delivery: DeliveryAdapter<A>,
}

impl<A: ChatApi> DeliverySink<A> {
    pub fn new(delivery: DeliveryAdapter<A>) -> Self {
        Self { delivery }
    }
}

#[async_trait]
impl<A: ChatApi> ActivitySink for DeliverySink<A> {
    async fn send_activities(
        &self,
        turn: &TurnContext,
        activities: Vec<Activity>,
    ) -> Result<Vec<ResourceResponse>> {
        let count = activities.len();
        match self.delivery.send(&activities).await {
            Ok(responses) => {
                turn.record_sent(responses.len());
                Ok(responses)
            }
            Err(e) => {
                error!(
                    turn_id = %turn.turn_id,
                    conversation = %turn.activity.conversation,
                    activity_count = count,
                    transient = e.is_transient(),
                    error = %e,
                    "sending activities failed"
                );
                Err(PipelineError::Delivery(e))
            }
        }
    }

    async fn update_activity(
        &self,
        turn: &TurnContext,
        activity: Activity,
    ) -> Result<ResourceResponse> {
        self.delivery.update(&activity).await.map_err(|e| {
            error!(
                turn_id = %turn.turn_id,
                conversation = %activity.conversation,
                activity_id = activity.id.as_deref().unwrap_or("-"),
                error = %e,
                "updating activity failed"
            );
            PipelineError::Delivery(e)
        })
    }

    async fn delete_activity(
        &self,
        turn: &TurnContext,
        reference: &ConversationReference,
    ) -> Result<()> {
        self.delivery.delete(reference).await.map_err(|e| {
            error!(
                turn_id = %turn.turn_id,
                conversation = %reference.conversation,
                activity_id = reference.activity_id.as_deref().unwrap_or("-"),
                error = %e,
                "deleting activity failed"
            );
            PipelineError::Delivery(e)
        })
    }
}
