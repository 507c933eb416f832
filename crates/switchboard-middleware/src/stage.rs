//! Static middleware composition.
//!
//! A chain is a nest of [`Chain`] values ending in a sink:
//! `Chain<Debug, Chain<Timing, Chain<Format, DeliverySink>>>`. Each stage
//! sees outbound activities first and hands them to the rest of the chain,
//! so outbound transforms compose in declared order.

use async_trait::async_trait;
use switchboard_core::{Activity, ConversationReference, ResourceResponse};

use crate::context::{Flow, TurnContext};
use crate::error::Result;

/// The rest of a chain, as seen from the stage in front of it.
///
/// Object safe so handlers can hold `&dyn ActivitySink`.
#[async_trait]
pub trait ActivitySink: Send + Sync {
    /// Inbound pass. Sinks accept every turn.
    async fn on_turn(&self, _turn: &mut TurnContext) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    async fn send_activities(
        &self,
        turn: &TurnContext,
        activities: Vec<Activity>,
    ) -> Result<Vec<ResourceResponse>>;

    async fn update_activity(&self, turn: &TurnContext, activity: Activity)
        -> Result<ResourceResponse>;

    async fn delete_activity(
        &self,
        turn: &TurnContext,
        reference: &ConversationReference,
    ) -> Result<()>;
}

/// One middleware stage.
///
/// `on_send` and `on_update` receive the rest of the chain as `next` and
/// must call it at most once.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_turn(&self, _turn: &mut TurnContext) -> Result<Flow> {
        Ok(Flow::Continue)
    }

    async fn on_send<N: ActivitySink>(
        &self,
        turn: &TurnContext,
        activities: Vec<Activity>,
        next: &N,
    ) -> Result<Vec<ResourceResponse>> {
        next.send_activities(turn, activities).await
    }

    async fn on_update<N: ActivitySink>(
        &self,
        turn: &TurnContext,
        activity: Activity,
        next: &N,
    ) -> Result<ResourceResponse> {
        next.update_activity(turn, activity).await
    }
}

/// `stage` in front of `next`.
pub struct Chain<S, N> {
    stage: S,
    next: N,
}

impl<S: Stage, N: ActivitySink> Chain<S, N> {
    pub fn new(stage: S, next: N) -> Self {
        Self { stage, next }
    }
}

#[async_trait]
impl<S: Stage, N: ActivitySink> ActivitySink for Chain<S, N> {
    async fn on_turn(&self, turn: &mut TurnContext) -> Result<Flow> {
        match self.stage.on_turn(turn).await? {
            Flow::Continue => self.next.on_turn(turn).await,
            Flow::Halt => {
                tracing::debug!(stage = self.stage.name(), turn_id = %turn.turn_id, "turn halted");
                Ok(Flow::Halt)
            }
        }
    }

    async fn send_activities(
        &self,
        turn: &TurnContext,
        activities: Vec<Activity>,
    ) -> Result<Vec<ResourceResponse>> {
        self.stage.on_send(turn, activities, &self.next).await
    }

    async fn update_activity(
        &self,
        turn: &TurnContext,
        activity: Activity,
    ) -> Result<ResourceResponse> {
        self.stage.on_update(turn, activity, &self.next).await
    }

    async fn delete_activity(
        &self,
        turn: &TurnContext,
        reference: &ConversationReference,
    ) -> Result<()> {
        self.next.delete_activity(turn, reference).await
    }
}
