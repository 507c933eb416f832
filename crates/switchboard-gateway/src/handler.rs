use async_trait::async_trait;
use switchboard_core::ActivityType;
use switchboard_middleware::{Result, Turn, TurnHandler};
use tracing::debug;

/// Minimal business logic so the pipeline runs end to end: messages are
/// echoed back into their thread, slash commands are acknowledged, and every
/// other activity is only logged.
pub struct EchoHandler;

#[async_trait]
impl TurnHandler for EchoHandler {
    async fn on_turn(&self, turn: &Turn<'_>) -> Result<()> {
        let activity = turn.activity();
        match activity.activity_type {
            ActivityType::Message if !activity.text_or_empty().is_empty() => {
                turn.reply(activity.text_or_empty().to_string()).await?;
            }
            ActivityType::Event if activity.name.as_deref().is_some_and(|n| n.starts_with('/')) => {
                let command = activity
                    .value
                    .as_ref()
                    .and_then(|v| v.as_str())
                    .unwrap_or_default();
                turn.reply(format!("received `{command}`")).await?;
            }
            _ => {
                debug!(
                    turn_id = %turn.context().turn_id,
                    activity_type = %activity.activity_type,
                    name = activity.name.as_deref().unwrap_or("-"),
                    "no reply for activity"
                );
            }
        }
        Ok(())
    }
}
