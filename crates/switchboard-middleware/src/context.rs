use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use switchboard_core::{Activity, ConversationReference, ResourceResponse, TurnId, TurnState};

use crate::error::{PipelineError, Result};
use crate::stage::ActivitySink;

/// Whether the inbound pass continues to the next stage and the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Stop here; later stages and the handler do not run.
    Halt,
}

/// Everything one turn carries through the chain.
///
/// Created per activity and dropped when the turn ends. Stages receive it
/// explicitly; nothing about the current turn lives in ambient state.
#[derive(Debug)]
pub struct TurnContext {
    pub turn_id: TurnId,
    /// The inbound activity. Stages may rewrite it during the inbound pass.
    pub activity: Activity,
    pub state: TurnState,
    /// Inbound text exactly as received, before any stage touched it.
    pub received_text: Option<String>,
    pub reference: ConversationReference,
    sent: AtomicUsize,
}

impl TurnContext {
    pub fn new(activity: Activity, state: TurnState, service_url: &str) -> Self {
        Self {
            turn_id: TurnId::new(),
            received_text: activity.text.clone(),
            reference: activity.conversation_reference(service_url),
            activity,
            state,
            sent: AtomicUsize::new(0),
        }
    }

    /// Activities delivered so far in this turn.
    pub fn sent_count(&self) -> usize {
        self.sent.load(Ordering::Relaxed)
    }

    pub(crate) fn record_sent(&self, n: usize) {
        self.sent.fetch_add(n, Ordering::Relaxed);
    }
}

/// Handle given to business logic for one turn.
pub struct Turn<'a> {
    ctx: &'a TurnContext,
    sink: &'a dyn ActivitySink,
}

impl<'a> Turn<'a> {
    pub(crate) fn new(ctx: &'a TurnContext, sink: &'a dyn ActivitySink) -> Self {
        Self { ctx, sink }
    }

    /// The inbound activity after the inbound pass.
    pub fn activity(&self) -> &Activity {
        &self.ctx.activity
    }

    pub fn state(&self) -> &TurnState {
        &self.ctx.state
    }

    pub fn context(&self) -> &TurnContext {
        self.ctx
    }

    pub async fn send(&self, activity: Activity) -> Result<ResourceResponse> {
        self.send_all(vec![activity])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Stage {
                stage: "send",
                reason: "sink returned no response for the sent activity".into(),
            })
    }

    pub async fn send_all(&self, activities: Vec<Activity>) -> Result<Vec<ResourceResponse>> {
        self.sink.send_activities(self.ctx, activities).await
    }

    /// Text reply in the inbound conversation (and thread).
    pub async fn reply(&self, text: impl Into<String>) -> Result<ResourceResponse> {
        self.send(self.ctx.activity.reply(text)).await
    }

    pub async fn update(&self, activity: Activity) -> Result<ResourceResponse> {
        self.sink.update_activity(self.ctx, activity).await
    }

    pub async fn delete(&self, reference: &ConversationReference) -> Result<()> {
        self.sink.delete_activity(self.ctx, reference).await
    }
}

/// Business logic invoked once per turn, between the inbound and outbound
/// passes.
#[async_trait]
pub trait TurnHandler: Send + Sync {
    async fn on_turn(&self, turn: &Turn<'_>) -> Result<()>;
}
