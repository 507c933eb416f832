use async_trait::async_trait;
use switchboard_core::{Activity, ActivityType, ResourceResponse};
use tracing::debug;

use super::strip_suffix;
use crate::context::{Flow, TurnContext};
use crate::error::Result;
use crate::stage::{ActivitySink, Stage};

/// Opt-in diagnostics. A message ending in the debug suffix (or a turn whose
/// state already has `debug` set) gets a diagnostic block prepended to every
/// outgoing text.
pub struct DebugStage {
    suffix: String,
}

impl DebugStage {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    fn diagnostic_block(turn: &TurnContext, outgoing: &str) -> String {
        let inbound = &turn.activity;
        let from = inbound.from.as_ref().map(|a| a.id.as_str()).unwrap_or("-");
        format!(
            "```\nturn: {}\nrequest: {} in {} from {}: {:?}\nresponse: {:?}\n```",
            turn.turn_id,
            inbound.activity_type,
            inbound.conversation,
            from,
            turn.received_text.as_deref().unwrap_or(""),
            outgoing,
        )
    }

    fn annotate(turn: &TurnContext, activity: &mut Activity) {
        if activity.activity_type != ActivityType::Message {
            return;
        }
        let text = activity.text_or_empty();
        let block = Self::diagnostic_block(turn, text);
        activity.text = Some(if text.is_empty() {
            block
        } else {
            format!("{block}\n{text}")
        });
    }
}

#[async_trait]
impl Stage for DebugStage {
    fn name(&self) -> &'static str {
        "debug"
    }

    async fn on_turn(&self, turn: &mut TurnContext) -> Result<Flow> {
        if let Some(stripped) = turn
            .activity
            .text
            .as_deref()
            .and_then(|text| strip_suffix(text, &self.suffix))
        {
            turn.activity.text = Some(stripped);
            turn.state.debug = true;
        }
        if turn.state.debug {
            debug!(turn_id = %turn.turn_id, "debug diagnostics enabled for turn");
        }
        Ok(Flow::Continue)
    }

    async fn on_send<N: ActivitySink>(
        &self,
        turn: &TurnContext,
        mut activities: Vec<Activity>,
        next: &N,
    ) -> Result<Vec<ResourceResponse>> {
        if turn.state.debug {
            for activity in &mut activities {
                Self::annotate(turn, activity);
            }
        }
        next.send_activities(turn, activities).await
    }

    async fn on_update<N: ActivitySink>(
        &self,
        turn: &TurnContext,
        mut activity: Activity,
        next: &N,
    ) -> Result<ResourceResponse> {
        if turn.state.debug {
            Self::annotate(turn, &mut activity);
        }
        next.update_activity(turn, activity).await
    }
}
