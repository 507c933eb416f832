use std::time::Instant;

use async_trait::async_trait;
use switchboard_core::{Activity, ActivityType, ResourceResponse};

use super::strip_suffix;
use crate::context::{Flow, TurnContext};
use crate::error::Result;
use crate::stage::{ActivitySink, Stage};

/// Elapsed-time reporting behind the timing suffix.
pub struct TimingStage {
    suffix: String,
}

impl TimingStage {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    fn stamp(turn: &TurnContext, activity: &mut Activity) {
        if activity.activity_type != ActivityType::Message {
            return;
        }
        let elapsed_ms = turn
            .state
            .started_at
            .map(|t| t.elapsed().as_millis())
            .unwrap_or(0);
        let line = format!("elapsed: {elapsed_ms} ms");
        activity.text = Some(match activity.text.as_deref() {
            Some(text) if !text.is_empty() => format!("{text}\n{line}"),
            _ => line,
        });
    }
}

#[async_trait]
impl Stage for TimingStage {
    fn name(&self) -> &'static str {
        "timing"
    }

    async fn on_turn(&self, turn: &mut TurnContext) -> Result<Flow> {
        if let Some(stripped) = turn
            .activity
            .text
            .as_deref()
            .and_then(|text| strip_suffix(text, &self.suffix))
        {
            turn.activity.text = Some(stripped);
            turn.state.timing = true;
        }
        // Keep a start time the caller preset in TurnState.
        turn.state.started_at.get_or_insert_with(Instant::now);
        Ok(Flow::Continue)
    }

    async fn on_send<N: ActivitySink>(
        &self,
        turn: &TurnContext,
        mut activities: Vec<Activity>,
        next: &N,
    ) -> Result<Vec<ResourceResponse>> {
        if turn.state.timing {
            for activity in &mut activities {
                Self::stamp(turn, activity);
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
        if turn.state.timing {
            Self::stamp(turn, &mut activity);
        }
        next.update_activity(turn, activity).await
    }
}
